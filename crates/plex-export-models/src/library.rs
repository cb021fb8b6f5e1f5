use serde::{Deserialize, Serialize};

/// A library title used by the watched/unwatched comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryMovie {
    pub tmdb_id: Option<String>,
    pub title: String,
    pub year: Option<u32>,
    pub directors: String,
    pub genres: String,
}

impl LibraryMovie {
    /// Display label also used as the comparison set key.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}
