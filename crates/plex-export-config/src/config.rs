use plex_export_models::bounds::{DATE_FORMAT, STAMP_FORMAT};
use plex_export_models::RewatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run configuration, loaded once and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub plex: Option<PlexConfig>,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub csv: CsvOptions,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlexConfig {
    #[serde(default = "default_plex_url")]
    pub url: String,
    /// May be empty when the token lives in the credential store instead.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: default_plex_url(),
            token: String::new(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Explicit output file; overrides dir/file_pattern when set.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Inclusive lower date bound (coarse or fine token). Beats the
    /// checkpoint when set.
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive upper date bound.
    #[serde(default)]
    pub to: Option<String>,
    /// User scope filter; unset means all users.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_library")]
    pub library: String,
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default)]
    pub timestamp_format: TimestampFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: None,
            from: None,
            to: None,
            user: None,
            library: default_library(),
            dir: default_export_dir(),
            file_pattern: default_file_pattern(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

/// Token variant used in auto-generated filenames. The checkpoint resolver
/// parses both regardless, so switching formats never strands old exports.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    /// Coarse `YYYY-MM-DD`.
    Date,
    /// Fine `YYYY-MM-DD-HH-MM`.
    #[default]
    Datetime,
}

impl TimestampFormat {
    pub fn format_str(&self) -> &'static str {
        match self {
            TimestampFormat::Date => DATE_FORMAT,
            TimestampFormat::Datetime => STAMP_FORMAT,
        }
    }
}

/// Options for the CSV transform and writer stages.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CsvOptions {
    /// Include the Rating column in the output.
    #[serde(default)]
    pub rating: bool,
    /// Convert source-scale ratings onto the half-step 0.5-5.0 scale.
    #[serde(default = "default_true")]
    pub convert_rating: bool,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Export genre-derived tags.
    #[serde(default)]
    pub genres: bool,
    /// Static custom tag string appended to every record.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub rewatch: RewatchPolicy,
    /// Display-only override; false forces the rewatch flag off on every
    /// surviving record without changing which records are kept.
    #[serde(default = "default_true")]
    pub mark_rewatch: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            rating: false,
            convert_rating: default_true(),
            max_rows: default_max_rows(),
            genres: false,
            tags: None,
            rewatch: RewatchPolicy::default(),
            mark_rewatch: default_true(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckpointConfig {
    /// Infer the fetch lower bound from previously written exports.
    #[serde(default = "default_true")]
    pub use_csv: bool,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self { use_csv: default_true() }
    }
}

fn default_true() -> bool {
    true
}

fn default_plex_url() -> String {
    "http://localhost:32400".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_library() -> String {
    "Movies".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("data")
}

pub fn default_file_pattern() -> String {
    "plex-watched-{user}-{timestamp}.csv".to_string()
}

fn default_max_rows() -> usize {
    1900
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_plex_configured(&self) -> bool {
        self.plex
            .as_ref()
            .map(|p| !p.token.is_empty() && p.token != "YOUR_PLEX_TOKEN")
            .unwrap_or(false)
    }
}
