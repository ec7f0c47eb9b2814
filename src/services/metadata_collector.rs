//! Concurrent enrichment of listed keys with their check-in metadata.
//!
//! Keys are fanned out to a fixed pool of worker tasks sharing one job queue
//! and one result queue. A key whose metadata cannot be fetched is logged and
//! left out of the page; it never fails the request.

use crate::{
    models::image::{CheckinMetadata, Image},
    services::{
        header_decoder::HeaderDecoder,
        month_scanner::SENTINEL_KEY,
        object_store::ObjectStore,
    },
};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
};
use tracing::{debug, warn};

/// Concurrent metadata requests per page.
pub const WORKER_COUNT: usize = 8;

/// Builds `Image` records for a batch of keys.
///
/// Owns the public base URL and the header decoder; both are fixed at
/// construction and shared read-only by all workers.
#[derive(Clone, Debug)]
pub struct MetadataCollector {
    base_url: String,
    decoder: HeaderDecoder,
}

impl MetadataCollector {
    pub fn new(public_url: &str, decoder: HeaderDecoder) -> Self {
        Self {
            base_url: public_url.trim_end_matches('/').to_string(),
            decoder,
        }
    }

    /// Public URL of `key`, with exactly one `/` between base and key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    /// Fetch and decode metadata for every key, at most `WORKER_COUNT` at a
    /// time. Returns once every key has been processed, with the surviving
    /// images in the order their keys were given.
    pub async fn collect(
        &self,
        store: Arc<dyn ObjectStore>,
        bucket: &str,
        keys: Vec<String>,
    ) -> Vec<Image> {
        let keys: Vec<String> = keys.into_iter().filter(|k| k != SENTINEL_KEY).collect();
        if keys.is_empty() {
            return Vec::new();
        }
        let total = keys.len();

        // All jobs are queued up front and the queue closed, so workers exit
        // as soon as it drains.
        let (job_tx, job_rx) = mpsc::channel::<(usize, String)>(total);
        for job in keys.into_iter().enumerate() {
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = mpsc::channel::<(usize, Image)>(total);
        let this = Arc::new(self.clone());
        let bucket: Arc<str> = Arc::from(bucket);

        let mut workers = JoinSet::new();
        for worker_id in 0..WORKER_COUNT.min(total) {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let store = Arc::clone(&store);
            let bucket = Arc::clone(&bucket);
            let this = Arc::clone(&this);

            workers.spawn(async move {
                loop {
                    let next = jobs.lock().await.recv().await;
                    let Some((index, key)) = next else { break };
                    let Some(image) = this.fetch_image(store.as_ref(), &bucket, key).await else {
                        continue;
                    };
                    if results.send((index, image)).await.is_err() {
                        break;
                    }
                }
                debug!("metadata worker {} done", worker_id);
            });
        }
        drop(result_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!("metadata worker failed: {}", err);
            }
        }

        // Workers finish in any order; restore listing order so equal check-in
        // times sort the same way on every request.
        let mut collected = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            collected.push(result);
        }
        collected.sort_unstable_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, image)| image).collect()
    }

    async fn fetch_image(
        &self,
        store: &dyn ObjectStore,
        bucket: &str,
        key: String,
    ) -> Option<Image> {
        match store.get_object_metadata(bucket, &key).await {
            Ok(tags) => Some(Image {
                url: self.public_url(&key),
                metadata: self.decode_metadata(&tags),
                key,
            }),
            Err(err) => {
                warn!("dropping `{}`: {}", key, err);
                None
            }
        }
    }

    /// Map raw tags to `CheckinMetadata`, decoding the free-text fields.
    pub fn decode_metadata(&self, tags: &HashMap<String, String>) -> CheckinMetadata {
        let mut metadata = CheckinMetadata::from_tags(tags);
        for field in [
            &mut metadata.beer,
            &mut metadata.brewery,
            &mut metadata.brewery_country,
            &mut metadata.comment,
            &mut metadata.venue,
            &mut metadata.city,
            &mut metadata.state,
            &mut metadata.country,
            &mut metadata.style,
        ] {
            self.decode_field(field);
        }
        metadata
    }

    fn decode_field(&self, value: &mut String) {
        if !self.decoder.is_encoded(value) {
            return;
        }
        match self.decoder.decode(value) {
            Ok(decoded) => *value = decoded,
            Err(err) => warn!("keeping raw value {:?}: {}", value, err),
        }
    }
}
