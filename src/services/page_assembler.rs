//! Final ordering of a page.

use crate::models::image::{Image, ImagePage};
use chrono::NaiveDateTime;
use std::cmp::Reverse;

/// Layout of the `date` metadata tag.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parsed check-in time; unparseable or missing dates map to the earliest
/// possible time.
fn event_time(image: &Image) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&image.metadata.date, DATE_FORMAT)
        .unwrap_or(NaiveDateTime::MIN)
}

/// Order `images` by check-in time, most recent first, and wrap them in a
/// page. Images with equal times keep their relative order.
pub fn assemble(mut images: Vec<Image>, has_more: bool) -> ImagePage {
    images.sort_by_cached_key(|image| Reverse(event_time(image)));
    ImagePage { images, has_more }
}

/// Page returned when no month in the window holds any image.
pub fn empty() -> ImagePage {
    ImagePage {
        images: Vec::new(),
        has_more: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::CheckinMetadata;

    fn image(key: &str, date: &str) -> Image {
        Image {
            url: format!("https://x/{key}"),
            key: key.to_string(),
            metadata: CheckinMetadata {
                date: date.to_string(),
                ..CheckinMetadata::default()
            },
        }
    }

    fn keys(page: &ImagePage) -> Vec<&str> {
        page.images.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn most_recent_first() {
        let page = assemble(
            vec![
                image("2025/11/b.jpg", "2025-11-01 09:00:00"),
                image("2025/11/a.jpg", "2025-11-08 12:00:00"),
                image("2025/11/c.jpg", "2025-11-08 11:59:59"),
            ],
            true,
        );

        assert_eq!(keys(&page), ["2025/11/a.jpg", "2025/11/c.jpg", "2025/11/b.jpg"]);
        assert!(page.has_more);
    }

    #[test]
    fn unparseable_dates_sink_to_the_end() {
        let page = assemble(
            vec![
                image("bad", "08/11/2025"),
                image("old", "2020-01-01 00:00:00"),
                image("missing", ""),
                image("new", "2025-11-08 12:00:00"),
                image("with-zone", "2025-11-09 12:00:00Z"),
            ],
            false,
        );

        assert_eq!(keys(&page), ["new", "old", "bad", "missing", "with-zone"]);
    }

    #[test]
    fn equal_times_keep_input_order() {
        let page = assemble(
            vec![
                image("first", "2025-11-08 12:00:00"),
                image("second", "2025-11-08 12:00:00"),
                image("third", "2025-11-08 12:00:00"),
            ],
            false,
        );

        assert_eq!(keys(&page), ["first", "second", "third"]);
    }

    #[test]
    fn empty_page_has_no_more() {
        assert_eq!(empty(), ImagePage::default());
    }
}
