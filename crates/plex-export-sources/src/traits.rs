use async_trait::async_trait;
use plex_export_models::{DateBound, HistoryEntry, LibraryMovie, SourceUser};

/// One fetch of watch history: which library, whose watches, and the
/// inclusive date window to honor while fetching.
#[derive(Debug, Clone, Default)]
pub struct HistoryRequest {
    pub library: String,
    pub user: Option<String>,
    pub from: Option<DateBound>,
    pub to: Option<DateBound>,
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn source_name(&self) -> &str;

    // Authentication
    async fn authenticate(&mut self) -> Result<(), Self::Error>;
    fn is_authenticated(&self) -> bool;

    // Data retrieval
    async fn list_users(&self) -> Result<Vec<SourceUser>, Self::Error>;
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<HistoryEntry>, Self::Error>;
    async fn fetch_unwatched(
        &self,
        library: &str,
        user: Option<&str>,
    ) -> Result<Vec<LibraryMovie>, Self::Error>;
}
