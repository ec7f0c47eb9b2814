//! Month-partitioned scanning of the bucket.
//!
//! Images live under `YYYY/MM/<name>` keys. A page of the gallery is one
//! calendar month; walking backward from a starting month finds the next
//! month that actually holds images.

use crate::{
    models::listing::ObjectSummary,
    services::object_store::{ObjectStore, StoreResult},
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Key that always exists in the bucket but is never part of the gallery.
pub const SENTINEL_KEY: &str = "latest.jpg";

/// Months examined when looking for the next non-empty page.
pub const INITIAL_LOOKBACK_MONTHS: u32 = 12;

/// Months examined when probing whether an earlier page exists.
pub const HAS_MORE_LOOKBACK_MONTHS: u32 = 1;

/// A calendar month, stored as its first day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Returns `None` for an out-of-range month or year.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The month immediately before this one. Saturates at the earliest
    /// representable date.
    pub fn previous(&self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Listing prefix for this month, e.g. `2025/11/`.
    pub fn prefix(&self) -> String {
        format!("{:04}/{:02}/", self.year(), self.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cursor `{0}` is not of the form YYYY/MM/...")]
pub struct CursorError(pub String);

/// Parse the month partition of an object key.
///
/// The first two path segments must be exactly four and two ASCII digits and
/// form a valid month; anything after them is ignored.
pub fn parse_cursor_month(key: &str) -> Result<YearMonth, CursorError> {
    let invalid = || CursorError(key.to_string());

    let mut segments = key.split('/');
    let year = segments.next().ok_or_else(invalid)?;
    let month = segments.next().ok_or_else(invalid)?;

    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if month.len() != 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    YearMonth::new(year, month).ok_or_else(invalid)
}

/// Month to start scanning from for a page request.
///
/// Without a cursor the scan starts at `now`; with one it starts in the month
/// before the cursor's, so a month is never served twice.
pub fn scan_start(cursor: Option<&str>, now: YearMonth) -> Result<YearMonth, CursorError> {
    match cursor {
        None => Ok(now),
        Some(key) => parse_cursor_month(key).map(|month| month.previous()),
    }
}

/// Objects found under one month prefix, sentinel excluded.
#[derive(Debug, Clone)]
pub struct MonthListing {
    pub month: YearMonth,
    pub objects: Vec<ObjectSummary>,
}

/// Walk backward from `start`, one month per listing call, until a month
/// holding at least one object is found or `max_lookback` months have been
/// examined.
///
/// A listing failure aborts the scan.
pub async fn find_first_non_empty_month(
    store: &dyn ObjectStore,
    bucket: &str,
    start: YearMonth,
    max_lookback: u32,
) -> StoreResult<Option<MonthListing>> {
    let mut current = start;
    for _ in 0..max_lookback {
        let prefix = current.prefix();
        let listing = store.list_objects(bucket, &prefix, None).await?;
        if listing.is_truncated {
            warn!(
                "Listing for `{}` truncated at {} keys (next token {:?}); later keys are not served",
                prefix,
                listing.objects.len(),
                listing.next_continuation_token
            );
        }

        let objects: Vec<ObjectSummary> = listing
            .objects
            .into_iter()
            .filter(|obj| obj.key != SENTINEL_KEY)
            .collect();

        if !objects.is_empty() {
            debug!("Found {} objects in {}", objects.len(), current);
            return Ok(Some(MonthListing {
                month: current,
                objects,
            }));
        }

        debug!("No objects in {}", current);
        current = current.previous();
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::object_store::memory::MemoryObjectStore;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn prefix_is_zero_padded() {
        assert_eq!(ym(2025, 3).prefix(), "2025/03/");
        assert_eq!(ym(2025, 11).prefix(), "2025/11/");
    }

    #[test]
    fn previous_crosses_year_boundary() {
        assert_eq!(ym(2025, 1).previous(), ym(2024, 12));
        assert_eq!(ym(2024, 3).previous(), ym(2024, 2));
    }

    #[test]
    fn containing_ignores_day() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(YearMonth::containing(date), ym(2024, 2));
    }

    #[test]
    fn valid_cursors_start_one_month_earlier() {
        let now = ym(2026, 10);
        let cases = [
            ("2025/11/image.jpg", ym(2025, 10)),
            ("2025/01/a.jpg", ym(2024, 12)),
            ("2024/03/deep/nested/key.jpg", ym(2024, 2)),
            ("1999/12/x", ym(1999, 11)),
        ];
        for (cursor, expected) in cases {
            assert_eq!(scan_start(Some(cursor), now), Ok(expected), "{cursor}");
        }
    }

    #[test]
    fn missing_cursor_starts_now() {
        let now = ym(2026, 10);
        assert_eq!(scan_start(None, now), Ok(now));
    }

    #[test]
    fn malformed_cursors_are_rejected() {
        for cursor in [
            "",
            "2025-11-image.jpg",
            "2025",
            "abcd/11/x.jpg",
            "2025/ab/x.jpg",
            "2025/13/x.jpg",
            "2025/00/x.jpg",
            "2025/1/x.jpg",
            "25/11/x.jpg",
            "/2025/11/x.jpg",
            "+202/11/x.jpg",
        ] {
            assert_eq!(
                parse_cursor_month(cursor),
                Err(CursorError(cursor.to_string())),
                "{cursor:?}"
            );
        }
    }

    #[tokio::test]
    async fn scan_returns_first_non_empty_month() {
        let store = MemoryObjectStore::new()
            .with_object("2025/08/a.jpg", &[])
            .with_object("2025/06/b.jpg", &[]);

        let found = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 12)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.month, ym(2025, 8));
        assert_eq!(found.objects, vec![ObjectSummary::new("2025/08/a.jpg")]);
        assert_eq!(store.listed(), vec!["2025/10/", "2025/09/", "2025/08/"]);
    }

    #[tokio::test]
    async fn month_holding_only_latest_jpg_is_empty() {
        let store = MemoryObjectStore::new()
            .with_listing_entry("2025/10/", SENTINEL_KEY)
            .with_object("2025/09/a.jpg", &[]);

        let found = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 12)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.month, ym(2025, 9));
        assert_eq!(found.objects, vec![ObjectSummary::new("2025/09/a.jpg")]);
        assert_eq!(store.listed(), vec!["2025/10/", "2025/09/"]);
    }

    #[tokio::test]
    async fn latest_jpg_is_dropped_from_a_non_empty_month() {
        let store = MemoryObjectStore::new()
            .with_listing_entry("2025/10/", SENTINEL_KEY)
            .with_object("2025/10/b.jpg", &[]);

        let found = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 1)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.objects, vec![ObjectSummary::new("2025/10/b.jpg")]);
    }

    #[tokio::test]
    async fn truncated_month_serves_first_listing_page() {
        let store = MemoryObjectStore::new()
            .with_object("2025/10/a.jpg", &[])
            .with_object("2025/10/b.jpg", &[])
            .truncated_listing("2025/10/");

        let found = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 12)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.month, ym(2025, 10));
        assert_eq!(found.objects.len(), 2);
        assert_eq!(store.listed(), vec!["2025/10/"]);
    }

    #[tokio::test]
    async fn scan_stops_after_lookback_window() {
        let store = MemoryObjectStore::new().with_object("2024/01/old.jpg", &[]);

        let found = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 3)
            .await
            .unwrap();

        assert!(found.is_none());
        assert_eq!(store.listed().len(), 3);
    }

    #[tokio::test]
    async fn scan_aborts_on_listing_failure() {
        let store = MemoryObjectStore::new()
            .with_object("2025/08/a.jpg", &[])
            .failing_listing("2025/09/");

        let result = find_first_non_empty_month(&store, "bucket", ym(2025, 10), 12).await;

        assert!(result.is_err());
        assert_eq!(store.listed(), vec!["2025/10/", "2025/09/"]);
    }
}
