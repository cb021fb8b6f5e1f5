use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One viewing event in the export dataset.
///
/// Records are value objects: every pipeline stage consumes an owned
/// `Vec<WatchRecord>` and returns a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<String>, // Cross-reference ID for import matching
    pub title: String,
    pub year: String, // Opaque token, compared verbatim ("" when unknown)
    pub directors: String, // Comma-joined
    pub watched_on: NaiveDate, // No time-of-day precision after normalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>, // Source scale varies until normalized
    pub tags: String, // Comma-joined, built by the tag composer
    pub rewatch: bool, // Derived by the rewatch engine, never an input truth
}

impl WatchRecord {
    /// Identity key for dedup/rewatch detection: (lowercased title, year).
    /// Two records sharing this key are viewings of the same work.
    pub fn identity_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.year.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, year: &str) -> WatchRecord {
        WatchRecord {
            tmdb_id: None,
            title: title.to_string(),
            year: year.to_string(),
            directors: String::new(),
            watched_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            rating: None,
            tags: String::new(),
            rewatch: false,
        }
    }

    #[test]
    fn test_identity_key_ignores_case() {
        assert_eq!(
            record("The Matrix", "1999").identity_key(),
            record("the matrix", "1999").identity_key()
        );
    }

    #[test]
    fn test_identity_key_distinguishes_year() {
        assert_ne!(
            record("Dune", "1984").identity_key(),
            record("Dune", "2021").identity_key()
        );
    }
}
