use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use services::{
    gallery_service::GalleryService,
    header_decoder::HeaderDecoder,
    metadata_collector::MetadataCollector,
    object_store::{S3ObjectStore, S3Settings},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting checkin-gallery with config: {:?}", cfg);

    if !cfg.static_dir.is_dir() {
        tracing::warn!(
            "Static directory {} does not exist; only the API will be served",
            cfg.static_dir.display()
        );
    }

    // --- Initialize object store client ---
    let settings = S3Settings::r2(
        &cfg.account_id,
        cfg.bucket_region.clone(),
        cfg.access_key_id.clone(),
        cfg.secret_access_key.clone(),
    );
    let store = Arc::new(S3ObjectStore::connect(settings).await);

    // --- Initialize core service ---
    let collector = MetadataCollector::new(&cfg.public_url, HeaderDecoder::new());
    let gallery = GalleryService::new(store, cfg.bucket_name.clone(), collector);

    // --- Build router ---
    let limiter = middleware::rate_limit::RateLimiter::new(
        cfg.rate_limit_per_second,
        cfg.rate_limit_burst,
    );
    let app: Router = routes::routes::routes(limiter, &cfg.static_dir).with_state(gallery);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exiting");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
}
