use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("user '{0}' not found on the server")]
    UnknownUser(String),
    #[error("library '{0}' not found")]
    UnknownLibrary(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
