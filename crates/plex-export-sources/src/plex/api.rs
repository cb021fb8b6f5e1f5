use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use plex_export_models::SourceUser;

const PLEX_TV_BASE_URL: &str = "https://plex.tv";
const CLIENT_IDENTIFIER: &str = "plexboxd-cli";

// Plex pages history server-side; one container this large covers any
// realistic personal library in a single request.
const HISTORY_CONTAINER_SIZE: &str = "5000";

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub key: String,
    pub type_: String,
    pub title: String,
}

/// One row of `/status/sessions/history/all`. Rows without a watch
/// timestamp never make it this far.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub rating_key: Option<String>,
    pub type_: String,
    pub title: String,
    pub year: Option<u32>,
    pub viewed_at: DateTime<Utc>,
    pub account_id: Option<i64>,
}

/// Per-title metadata the history endpoint does not carry.
#[derive(Debug, Clone, Default)]
pub struct MovieDetails {
    pub tmdb_id: Option<String>,
    pub directors: String,
    pub genres: String,
    pub user_rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub rating_key: String,
    pub title: String,
    pub year: Option<u32>,
    pub view_count: u32,
}

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Metadata")]
    metadata: Option<Vec<Value>>,
    #[serde(rename = "Video")]
    video: Option<Vec<Value>>,
    #[serde(rename = "Directory")]
    directory: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct PlexResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

impl MediaContainer {
    // Different server versions report history under Metadata or Video.
    fn items(&self) -> &[Value] {
        self.metadata
            .as_deref()
            .or(self.video.as_deref())
            .unwrap_or(&[])
    }
}

pub struct PlexHttpClient {
    client: Client,
    server_url: String,
}

impl PlexHttpClient {
    pub fn new(server_url: String, token: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-token"),
                    reqwest::header::HeaderValue::from_str(&token)
                        .context("Invalid token format")?,
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}/api/v2/user", PLEX_TV_BASE_URL);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to authenticate with Plex")?;

        if response.status().is_success() {
            debug!("Plex authentication successful");
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Plex authentication failed: {}",
                response.status()
            ))
        }
    }

    /// The token owner's plex.tv account.
    pub async fn get_account(&self) -> Result<SourceUser> {
        let url = format!("{}/api/v2/user", PLEX_TV_BASE_URL);
        let json: Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to get Plex account")?
            .json()
            .await
            .context("Failed to parse account response")?;

        parse_user(&json, true).context("Account response missing user id")
    }

    /// Managed (home) users sharing the owner's server.
    pub async fn get_home_users(&self) -> Result<Vec<SourceUser>> {
        let url = format!("{}/api/v2/home/users", PLEX_TV_BASE_URL);
        let json: Value = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to get Plex home users")?
            .json()
            .await
            .context("Failed to parse home users response")?;

        let items = json
            .get("users")
            .and_then(|u| u.as_array())
            .or_else(|| json.as_array())
            .cloned()
            .unwrap_or_default();

        let users = items
            .iter()
            .filter_map(|item| {
                let admin = item
                    .get("admin")
                    .and_then(|a| a.as_bool())
                    .unwrap_or(false);
                parse_user(item, admin)
            })
            .collect();
        Ok(users)
    }

    pub async fn get_libraries(&self) -> Result<Vec<LibraryInfo>> {
        let url = format!("{}/library/sections", self.server_url);
        let response: PlexResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to get libraries")?
            .json()
            .await
            .context("Failed to parse libraries response")?;

        let libraries = response
            .media_container
            .directory
            .unwrap_or_default()
            .iter()
            .filter_map(|dir| {
                Some(LibraryInfo {
                    key: dir.get("key").and_then(value_as_string)?,
                    type_: dir.get("type").and_then(|t| t.as_str())?.to_string(),
                    title: dir.get("title").and_then(|t| t.as_str())?.to_string(),
                })
            })
            .collect::<Vec<_>>();

        debug!(count = libraries.len(), "fetched Plex libraries");
        Ok(libraries)
    }

    /// Watch history for one library section, oldest first. `since` becomes
    /// a server-side `viewedAt` floor; precise filtering stays client-side.
    pub async fn get_history(
        &self,
        library_key: Option<&str>,
        account_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HistoryItem>> {
        let url = format!("{}/status/sessions/history/all", self.server_url);

        let mut query: Vec<(String, String)> = vec![("sort".into(), "viewedAt:asc".into())];
        if let Some(key) = library_key {
            query.push(("librarySectionID".into(), key.to_string()));
        }
        if let Some(id) = account_id {
            query.push(("accountID".into(), id.to_string()));
        }
        if let Some(since) = since {
            query.push(("viewedAt>".into(), since.timestamp().to_string()));
        }

        let response: PlexResponse = self
            .client
            .get(&url)
            .query(&query)
            .header("X-Plex-Container-Size", HISTORY_CONTAINER_SIZE)
            .send()
            .await
            .context("Failed to get watch history")?
            .json()
            .await
            .context("Failed to parse watch history response")?;

        let items = response.media_container.items();
        let mut history = Vec::with_capacity(items.len());
        let mut skipped = 0usize;
        for item in items {
            match parse_history_item(item) {
                Some(parsed) => history.push(parsed),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "history rows without a usable watch timestamp");
        }
        debug!(count = history.len(), "fetched Plex watch history");
        Ok(history)
    }

    /// Full metadata for one item; carries directors, genres, the user
    /// rating, and external guids that the history listing omits.
    pub async fn get_movie_details(&self, rating_key: &str) -> Result<MovieDetails> {
        let url = format!("{}/library/metadata/{}", self.server_url, rating_key);
        let response: PlexResponse = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to get metadata for item {rating_key}"))?
            .json()
            .await
            .context("Failed to parse metadata response")?;

        let item = response
            .media_container
            .items()
            .first()
            .cloned()
            .unwrap_or(Value::Null);
        if item.is_null() {
            warn!(rating_key, "metadata response carried no item");
        }
        Ok(parse_movie_details(&item))
    }

    /// Every movie in a library section with its per-token view count.
    pub async fn get_library_movies(&self, library_key: &str) -> Result<Vec<LibraryEntry>> {
        let url = format!("{}/library/sections/{}/all", self.server_url, library_key);
        let response: PlexResponse = self
            .client
            .get(&url)
            .query(&[("type", "1")])
            .send()
            .await
            .context("Failed to list library movies")?
            .json()
            .await
            .context("Failed to parse library listing")?;

        let movies = response
            .media_container
            .items()
            .iter()
            .filter_map(parse_library_entry)
            .collect::<Vec<_>>();
        debug!(count = movies.len(), library_key, "listed library movies");
        Ok(movies)
    }
}

// Plex is inconsistent about numeric fields: ids and keys arrive as
// either JSON numbers or strings depending on endpoint and version.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_user(value: &Value, owner: bool) -> Option<SourceUser> {
    let id = value
        .get("id")
        .and_then(|id| id.as_i64().or_else(|| id.as_str()?.parse().ok()))?;
    Some(SourceUser {
        id,
        username: value
            .get("username")
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string(),
        title: value
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        owner,
    })
}

fn parse_history_item(value: &Value) -> Option<HistoryItem> {
    let viewed_at = value
        .get("viewedAt")
        .and_then(|v| v.as_i64())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())?;

    Some(HistoryItem {
        rating_key: value.get("ratingKey").and_then(value_as_string),
        type_: value
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        title: value
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string(),
        year: value.get("year").and_then(|y| y.as_u64()).map(|y| y as u32),
        viewed_at,
        account_id: value.get("accountID").and_then(|a| a.as_i64()),
    })
}

fn parse_movie_details(value: &Value) -> MovieDetails {
    MovieDetails {
        tmdb_id: extract_tmdb_id(value),
        directors: join_tag_list(value, "Director"),
        genres: join_tag_list(value, "Genre"),
        user_rating: value.get("userRating").and_then(|r| r.as_f64()),
    }
}

fn parse_library_entry(value: &Value) -> Option<LibraryEntry> {
    Some(LibraryEntry {
        rating_key: value.get("ratingKey").and_then(value_as_string)?,
        title: value.get("title").and_then(|t| t.as_str())?.to_string(),
        year: value.get("year").and_then(|y| y.as_u64()).map(|y| y as u32),
        view_count: value
            .get("viewCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32,
    })
}

/// Pull the TMDB id out of the external guid list, e.g.
/// `{"id": "tmdb://157336"}` yields `157336`.
fn extract_tmdb_id(value: &Value) -> Option<String> {
    value
        .get("Guid")
        .and_then(|g| g.as_array())
        .and_then(|guids| {
            guids.iter().find_map(|guid| {
                guid.get("id")
                    .and_then(|id| id.as_str())
                    .and_then(|id| id.strip_prefix("tmdb://"))
                    .map(String::from)
            })
        })
}

/// Join a tag array like `Director` or `Genre` into "A, B".
fn join_tag_list(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(|list| list.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|entry| entry.get("tag").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}
