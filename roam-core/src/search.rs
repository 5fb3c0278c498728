use chrono::NaiveDate;
use serde::Deserialize;

use crate::trip::Trip;

/// Listing filter. All fields are optional and combine with AND; the
/// date bounds select trips whose interval overlaps the requested
/// window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilter {
    pub search: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripFilter {
    /// Whether `trip` satisfies the filter. The Postgres repository
    /// expresses the same predicate in SQL; this form backs the
    /// in-memory repository and documents the semantics.
    pub fn matches(&self, trip: &Trip) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !trip.title.to_lowercase().contains(&needle)
                && !trip.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !trip
                .destination
                .to_lowercase()
                .contains(&destination.to_lowercase())
            {
                return false;
            }
        }
        // Overlap: the trip ends on or after the window start and
        // starts on or before the window end.
        if let Some(start) = self.start_date {
            if trip.end_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if trip.start_date > end {
                return false;
            }
        }
        true
    }
}

/// Lenient date parsing for query parameters: a malformed value drops
/// the filter rather than failing the request. Accepts `YYYY-MM-DD` or
/// a full RFC 3339 timestamp.
pub fn parse_date_param(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    tracing::debug!("Ignoring malformed date filter: {}", raw);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn trip_between(start: (i32, u32, u32), end: (i32, u32, u32)) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            title: "Beach Escape".to_string(),
            description: "A week on the Konkan coast".to_string(),
            destination: "Goa".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            price: 300.0,
            max_capacity: 10,
            current_bookings: 0,
            image: String::new(),
            creator: Uuid::new_v4(),
            booked_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_date_param_accepts_plain_dates() {
        assert_eq!(
            parse_date_param(Some("2026-06-15")),
            NaiveDate::from_ymd_opt(2026, 6, 15)
        );
        assert_eq!(
            parse_date_param(Some("2026-06-15T10:30:00Z")),
            NaiveDate::from_ymd_opt(2026, 6, 15)
        );
    }

    #[test]
    fn test_parse_date_param_drops_malformed_input() {
        assert_eq!(parse_date_param(Some("next tuesday")), None);
        assert_eq!(parse_date_param(Some("2026-13-40")), None);
        assert_eq!(parse_date_param(Some("")), None);
        assert_eq!(parse_date_param(None), None);
    }

    #[test]
    fn test_search_matches_title_or_description_case_insensitive() {
        let trip = trip_between((2026, 6, 1), (2026, 6, 8));

        let by_title = TripFilter {
            search: Some("beach".to_string()),
            ..TripFilter::default()
        };
        assert!(by_title.matches(&trip));

        let by_description = TripFilter {
            search: Some("KONKAN".to_string()),
            ..TripFilter::default()
        };
        assert!(by_description.matches(&trip));

        let miss = TripFilter {
            search: Some("mountain".to_string()),
            ..TripFilter::default()
        };
        assert!(!miss.matches(&trip));
    }

    #[test]
    fn test_date_window_selects_overlapping_trips() {
        let trip = trip_between((2026, 6, 10), (2026, 6, 20));

        let overlapping = TripFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 6, 15),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 25),
            ..TripFilter::default()
        };
        assert!(overlapping.matches(&trip));

        let before = TripFilter {
            end_date: NaiveDate::from_ymd_opt(2026, 6, 9),
            ..TripFilter::default()
        };
        assert!(!before.matches(&trip));

        let after = TripFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 6, 21),
            ..TripFilter::default()
        };
        assert!(!after.matches(&trip));

        // A single bound is enough.
        let open_ended = TripFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            ..TripFilter::default()
        };
        assert!(open_ended.matches(&trip));
    }
}
