//! Process-wide token-bucket rate limiting for the API routes.

use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

/// Token bucket shared by every request passing through the layer.
#[derive(Clone)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    bucket: Arc<Mutex<Bucket>>,
}

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    /// Allow `per_second` requests on average with bursts up to `burst`.
    /// The bucket starts full.
    pub fn new(per_second: u32, burst: u32) -> Self {
        Self {
            per_second: f64::from(per_second),
            burst: f64::from(burst),
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: f64::from(burst),
                refilled_at: Instant::now(),
            })),
        }
    }

    /// Take one token if available.
    pub async fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.refilled_at);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.per_second).min(self.burst);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whole seconds after which an empty bucket holds a token again.
    pub fn retry_after_secs(&self) -> u64 {
        (1.0 / self.per_second).ceil() as u64
    }
}

/// Middleware rejecting requests with 429 once the bucket is empty.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.try_acquire().await {
        debug!("rate limited {}", request.uri());
        let mut response = AppError::too_many_requests().into_response();
        response.headers_mut().insert(
            header::RETRY_AFTER,
            HeaderValue::from(limiter.retry_after_secs()),
        );
        return response;
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn allows_burst_then_refills() {
        let limiter = RateLimiter::new(1, 3);

        for _ in 0..3 {
            assert!(limiter.try_acquire().await);
        }
        assert!(!limiter.try_acquire().await);

        tokio::time::advance(Duration::from_secs(limiter.retry_after_secs())).await;
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_burst() {
        let limiter = RateLimiter::new(10, 2);

        tokio::time::advance(Duration::from_secs(60)).await;

        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);
    }
}
