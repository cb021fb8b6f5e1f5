pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    default_file_pattern, CheckpointConfig, Config, CsvOptions, ExportConfig, PlexConfig,
    TimestampFormat,
};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
