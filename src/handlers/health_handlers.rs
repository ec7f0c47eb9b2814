//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the object store is reachable

use crate::services::{gallery_service::GalleryService, month_scanner::YearMonth};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that lists the current month's prefix once. HTTP 200 when
/// the listing succeeds, HTTP 503 otherwise.
pub async fn readyz(State(gallery): State<GalleryService>) -> impl IntoResponse {
    let prefix = YearMonth::current().prefix();
    let store_check = match gallery.store.list_objects(&gallery.bucket, &prefix, None).await {
        Ok(_) => CheckStatus {
            ok: true,
            error: None,
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(e.to_string()),
        },
    };

    let overall_ok = store_check.ok;
    let mut checks = HashMap::new();
    checks.insert("store", store_check);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        header_decoder::HeaderDecoder, metadata_collector::MetadataCollector,
        object_store::memory::MemoryObjectStore,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn readiness_lists_only_the_current_month() {
        let store = Arc::new(MemoryObjectStore::new().with_object("2019/01/old.jpg", &[]));
        let collector = MetadataCollector::new("https://test.com", HeaderDecoder::new());
        let gallery = GalleryService::new(store.clone(), "bucket", collector);

        let response = readyz(State(gallery)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.listed(), vec![YearMonth::current().prefix()]);
    }
}
