//! src/services/object_store.rs
//!
//! Gateway over the bucket holding the check-in images. The gallery only ever
//! needs two read operations: list keys under a prefix and fetch the user
//! metadata of a single key. `S3ObjectStore` implements them against any
//! S3-compatible endpoint (Cloudflare R2 in production).

use crate::models::listing::{ObjectListing, ObjectSummary};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, retry::RetryConfig, timeout::TimeoutConfig};
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
};
use std::{collections::HashMap, time::Duration};
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound of keys returned by a single listing call.
pub const MAX_KEYS_PER_LISTING: i32 = 1000;

const MAX_ATTEMPTS: u32 = 3;
const OPERATION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("list `{prefix}`: {message}")]
    List { prefix: String, message: String },
    #[error("metadata `{key}`: {message}")]
    Metadata { key: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only capabilities the gallery needs from the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List up to 1000 objects under `prefix`, resuming from
    /// `continuation_token` when given.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StoreResult<ObjectListing>;

    /// Fetch the user metadata of `key`. An object without metadata yields
    /// an empty map.
    async fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<HashMap<String, String>>;
}

/// Connection settings for an S3-compatible endpoint.
#[derive(Clone)]
pub struct S3Settings {
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl S3Settings {
    /// Settings for a Cloudflare R2 account, whose endpoint is derived from
    /// the account id.
    pub fn r2(
        account_id: &str,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: format!("https://{}.r2.cloudflarestorage.com", account_id),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

/// `ObjectStore` backed by the AWS SDK S3 client.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client with static credentials, the standard retry policy and
    /// an operation timeout.
    pub async fn connect(settings: S3Settings) -> Self {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_ATTEMPTS)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(OPERATION_TIMEOUT_SECS))
            .build();

        let credentials = Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "checkin-gallery-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint_url.clone())
            .credentials_provider(credentials)
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .load()
            .await;

        info!(
            "Initialized S3 client for endpoint {} (region {}, {} max attempts)",
            settings.endpoint_url, settings.region, MAX_ATTEMPTS
        );

        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> StoreResult<ObjectListing> {
        debug!("Listing objects under `{}`", prefix);

        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(MAX_KEYS_PER_LISTING)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|err| StoreError::List {
                prefix: prefix.to_string(),
                message: err.to_string(),
            })?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(ObjectSummary::new))
            .collect();

        Ok(ObjectListing {
            objects,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> StoreResult<HashMap<String, String>> {
        debug!("Fetching metadata for `{}`", key);

        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::Metadata {
                key: key.to_string(),
                message: err.to_string(),
            })?;

        Ok(output.metadata().cloned().unwrap_or_default())
    }
}
