//! Represents a check-in image and the page envelope returned by `/api/images`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Check-in details attached to an image as object metadata tags.
///
/// Every field is exposed as a string exactly as stored; missing tags
/// serialize as empty strings.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckinMetadata {
    /// Check-in identifier.
    pub id: String,

    /// Beer name.
    pub beer: String,

    /// Brewery that produced the beer.
    pub brewery: String,

    /// Country of the brewery.
    pub brewery_country: String,

    /// Free-text comment left with the check-in.
    pub comment: String,

    /// Rating, kept as the raw string (e.g. "4.25").
    pub rating: String,

    /// Venue name.
    pub venue: String,

    pub city: String,

    /// Region or state of the venue.
    pub state: String,

    pub country: String,

    /// Coordinates as a "lat,lng" string.
    pub lat_lng: String,

    /// Event timestamp, `YYYY-MM-DD HH:MM:SS` without timezone.
    pub date: String,

    /// Beer style.
    pub style: String,

    /// Alcohol by volume, kept as the raw string.
    pub abv: String,
}

impl CheckinMetadata {
    /// Build from raw metadata tags without any decoding.
    pub fn from_tags(tags: &HashMap<String, String>) -> Self {
        let tag = |name: &str| tags.get(name).cloned().unwrap_or_default();
        Self {
            id: tag("id"),
            beer: tag("beer"),
            brewery: tag("brewery"),
            brewery_country: tag("brewery_country"),
            comment: tag("comment"),
            rating: tag("rating"),
            venue: tag("venue"),
            city: tag("city"),
            state: tag("state"),
            country: tag("country"),
            lat_lng: tag("lat_lng"),
            date: tag("date"),
            style: tag("style"),
            abv: tag("abv"),
        }
    }
}

/// A publicly reachable image together with its decoded check-in metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    pub key: String,
    pub metadata: CheckinMetadata,
}

/// One month worth of images, most recent check-in first.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImagePage {
    pub images: Vec<Image>,
    pub has_more: bool,
}
