use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::watch_record::WatchRecord;

/// One raw watch row as fetched from a source, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub tmdb_id: Option<String>,
    pub title: String,
    pub year: Option<u32>,
    pub directors: String, // Comma-joined
    pub genres: String,    // Comma-joined, feeds the tag composer
    pub watched_at: DateTime<Utc>,
    pub user_rating: Option<f64>, // Source scale (Plex: 1-10)
}

impl HistoryEntry {
    /// Normalize into the export record shape. Time of day is dropped here;
    /// the rating stays raw until the rating normalizer runs.
    pub fn into_record(self) -> WatchRecord {
        WatchRecord {
            tmdb_id: self.tmdb_id,
            title: self.title,
            year: self.year.map(|y| y.to_string()).unwrap_or_default(),
            directors: self.directors,
            watched_on: self.watched_at.date_naive(),
            rating: self.user_rating.map(|r| r.to_string()),
            tags: self.genres,
            rewatch: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_into_record_drops_time_of_day() {
        let entry = HistoryEntry {
            tmdb_id: Some("603".to_string()),
            title: "The Matrix".to_string(),
            year: Some(1999),
            directors: "Lana Wachowski, Lilly Wachowski".to_string(),
            genres: "Action, Sci-Fi".to_string(),
            watched_at: Utc.with_ymd_and_hms(2024, 3, 1, 22, 15, 0).unwrap(),
            user_rating: Some(9.0),
        };
        let record = entry.into_record();
        assert_eq!(record.watched_on.to_string(), "2024-03-01");
        assert_eq!(record.year, "1999");
        assert_eq!(record.rating.as_deref(), Some("9"));
        assert_eq!(record.tags, "Action, Sci-Fi");
        assert!(!record.rewatch);
    }

    #[test]
    fn test_into_record_missing_year_is_empty_token() {
        let entry = HistoryEntry {
            tmdb_id: None,
            title: "Unknown".to_string(),
            year: None,
            directors: String::new(),
            genres: String::new(),
            watched_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            user_rating: None,
        };
        let record = entry.into_record();
        assert_eq!(record.year, "");
        assert_eq!(record.rating, None);
    }
}
