//! Core data models for the check-in gallery API.
//!
//! Listings describe what the object store returned for a prefix; images are
//! the enriched records served to the front-end as JSON via `serde`.

pub mod image;
pub mod listing;
