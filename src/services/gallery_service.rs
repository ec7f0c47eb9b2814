//! src/services/gallery_service.rs
//!
//! GalleryService — serves one page of check-in images per request. A page is
//! the most recent non-empty month strictly before the caller's cursor, with
//! every image enriched with its metadata and ordered by check-in time.

use crate::{
    models::image::ImagePage,
    services::{
        metadata_collector::MetadataCollector,
        month_scanner::{
            self, CursorError, HAS_MORE_LOOKBACK_MONTHS, INITIAL_LOOKBACK_MONTHS, YearMonth,
        },
        object_store::{ObjectStore, StoreError},
        page_assembler,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    InvalidCursor(#[from] CursorError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type PageResult<T> = Result<T, PageError>;

/// Shared handle to the gallery pipeline; cheap to clone into handlers.
#[derive(Clone)]
pub struct GalleryService {
    /// Object store holding the images.
    pub store: Arc<dyn ObjectStore>,

    /// Bucket name within the store.
    pub bucket: String,

    collector: MetadataCollector,
}

impl GalleryService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        collector: MetadataCollector,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            collector,
        }
    }

    /// Page of images before `cursor`, scanning back from the current month
    /// when no cursor is given.
    pub async fn list_images(&self, cursor: Option<&str>) -> PageResult<ImagePage> {
        self.list_images_from(cursor, YearMonth::current()).await
    }

    /// Same as [`list_images`](Self::list_images) with an explicit "now".
    pub async fn list_images_from(
        &self,
        cursor: Option<&str>,
        now: YearMonth,
    ) -> PageResult<ImagePage> {
        let start = month_scanner::scan_start(cursor, now)?;

        let Some(found) = month_scanner::find_first_non_empty_month(
            self.store.as_ref(),
            &self.bucket,
            start,
            INITIAL_LOOKBACK_MONTHS,
        )
        .await?
        else {
            debug!("No images within {} months of {}", INITIAL_LOOKBACK_MONTHS, start);
            return Ok(page_assembler::empty());
        };

        let keys = found.objects.into_iter().map(|obj| obj.key).collect();
        let images = self
            .collector
            .collect(Arc::clone(&self.store), &self.bucket, keys)
            .await;

        let has_more = self.has_earlier_month(found.month).await;
        Ok(page_assembler::assemble(images, has_more))
    }

    /// Whether the month right before `month` holds any image.
    ///
    /// The page itself has already been built at this point, so a failing
    /// probe only hides the "more" marker.
    async fn has_earlier_month(&self, month: YearMonth) -> bool {
        match month_scanner::find_first_non_empty_month(
            self.store.as_ref(),
            &self.bucket,
            month.previous(),
            HAS_MORE_LOOKBACK_MONTHS,
        )
        .await
        {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!("has_more probe before {} failed: {}", month, err);
                false
            }
        }
    }
}
