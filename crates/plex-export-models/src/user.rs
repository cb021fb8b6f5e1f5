use serde::{Deserialize, Serialize};

/// A source-side account that watch history can be scoped to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceUser {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub owner: bool,
}

impl SourceUser {
    /// Account id used in history queries. Plex records most owner history
    /// under the legacy account id 1, not the cloud account id.
    pub fn history_account_id(&self) -> i64 {
        if self.owner {
            1
        } else {
            self.id
        }
    }

    /// Match a user filter against username or title, case-insensitively.
    pub fn matches(&self, filter: &str) -> bool {
        self.username == filter || self.title.to_lowercase() == filter.to_lowercase()
    }
}
