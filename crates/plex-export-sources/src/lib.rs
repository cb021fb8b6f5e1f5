pub mod error;
pub mod plex;
pub mod traits;

pub use error::SourceError;
pub use plex::PlexClient;
pub use traits::{HistoryRequest, HistorySource};
