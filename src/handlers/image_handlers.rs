//! HTTP handler for the paginated image listing.
//! Delegates the month scan, metadata collection and ordering to
//! `GalleryService`.

use crate::{errors::AppError, services::gallery_service::GalleryService};
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

/// Query params accepted by `GET /api/images`.
#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    /// Last key seen on the previous page; absent for the first page.
    #[serde(rename = "lastKey")]
    pub last_key: Option<String>,
}

/// GET `/api/images` — one month of images, most recent check-in first.
pub async fn list_images(
    State(gallery): State<GalleryService>,
    Query(q): Query<ListImagesQuery>,
) -> Result<impl IntoResponse, AppError> {
    // An empty `lastKey=` is the same as no cursor.
    let cursor = q.last_key.as_deref().filter(|key| !key.is_empty());

    let page = gallery.list_images(cursor).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        Json(page),
    ))
}
