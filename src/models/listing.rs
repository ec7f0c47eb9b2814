//! Represents the result of listing objects under a prefix.

/// A single entry in an object listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key (path-like identifier within the bucket).
    pub key: String,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// One page of a ListObjectsV2-style listing (at most 1000 entries).
#[derive(Clone, Debug, Default)]
pub struct ObjectListing {
    pub objects: Vec<ObjectSummary>,

    /// Whether the store holds more keys under the prefix than were returned.
    pub is_truncated: bool,

    /// Opaque token to resume the listing, if truncated.
    pub next_continuation_token: Option<String>,
}
