use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use plex_export_models::bounds::within_bounds_at;
use plex_export_models::{HistoryEntry, LibraryMovie, SourceUser};

use crate::error::SourceError;
use crate::plex::api::{HistoryItem, LibraryInfo, MovieDetails, PlexHttpClient};
use crate::traits::{HistoryRequest, HistorySource};

/// Plex Media Server backend.
///
/// History rows come from the server's session-history endpoint; the
/// per-title details the export needs (directors, genres, user rating,
/// TMDB id) require one metadata request per unique title, issued
/// concurrently.
pub struct PlexClient {
    server_url: String,
    token: String,
    timeout_secs: u64,
    api: Option<PlexHttpClient>,
}

impl PlexClient {
    pub fn new(server_url: String, token: String, timeout_secs: u64) -> Self {
        Self {
            server_url,
            token,
            timeout_secs,
            api: None,
        }
    }

    fn api(&self) -> Result<&PlexHttpClient, SourceError> {
        self.api
            .as_ref()
            .ok_or_else(|| SourceError::Auth("not authenticated, call authenticate() first".into()))
    }

    /// Map a username/title filter to the account id history is recorded
    /// under. No filter means no account scoping.
    async fn resolve_account_id(&self, filter: Option<&str>) -> Result<Option<i64>, SourceError> {
        let Some(filter) = filter else {
            return Ok(None);
        };
        let users = self.list_users().await?;
        match users.iter().find(|user| user.matches(filter)) {
            Some(user) => {
                debug!(
                    filter,
                    account_id = user.history_account_id(),
                    "resolved user filter"
                );
                Ok(Some(user.history_account_id()))
            }
            None => Err(SourceError::UnknownUser(filter.to_string())),
        }
    }

    async fn find_movie_library(&self, title: &str) -> Result<LibraryInfo, SourceError> {
        let libraries = self.api()?.get_libraries().await?;
        libraries
            .into_iter()
            .find(|lib| lib.type_ == "movie" && lib.title.eq_ignore_ascii_case(title))
            .ok_or_else(|| SourceError::UnknownLibrary(title.to_string()))
    }

    /// One metadata fetch per unique rating key, in parallel. A failed
    /// fetch degrades that title to empty details rather than failing
    /// the whole export.
    async fn fetch_details(
        &self,
        rating_keys: impl IntoIterator<Item = String>,
    ) -> Result<HashMap<String, MovieDetails>, SourceError> {
        let api = self.api()?;
        let unique: HashSet<String> = rating_keys.into_iter().collect();

        let lookups = unique.into_iter().map(|key| async move {
            let details = api.get_movie_details(&key).await;
            (key, details)
        });

        let mut details = HashMap::new();
        for (key, result) in join_all(lookups).await {
            match result {
                Ok(found) => {
                    details.insert(key, found);
                }
                Err(e) => {
                    warn!(rating_key = %key, error = %e, "metadata lookup failed, exporting bare row");
                    details.insert(key, MovieDetails::default());
                }
            }
        }
        Ok(details)
    }

    fn entry_from(item: HistoryItem, details: &MovieDetails) -> HistoryEntry {
        HistoryEntry {
            tmdb_id: details.tmdb_id.clone(),
            title: item.title,
            year: item.year,
            directors: details.directors.clone(),
            genres: details.genres.clone(),
            watched_at: item.viewed_at,
            user_rating: details.user_rating,
        }
    }
}

#[async_trait]
impl HistorySource for PlexClient {
    type Error = SourceError;

    fn source_name(&self) -> &str {
        "plex"
    }

    async fn authenticate(&mut self) -> Result<(), Self::Error> {
        let api = PlexHttpClient::new(
            self.server_url.clone(),
            self.token.clone(),
            self.timeout_secs,
        )?;
        api.authenticate()
            .await
            .map_err(|e| SourceError::Auth(e.to_string()))?;
        info!(server = %self.server_url, "authenticated to Plex");
        self.api = Some(api);
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.api.is_some()
    }

    async fn list_users(&self) -> Result<Vec<SourceUser>, Self::Error> {
        let api = self.api()?;
        let owner = api.get_account().await?;

        let mut users = vec![owner.clone()];
        match api.get_home_users().await {
            Ok(home_users) => {
                users.extend(home_users.into_iter().filter(|u| u.id != owner.id));
            }
            // Single-account servers have no home; the owner still exports.
            Err(e) => debug!(error = %e, "no home users available"),
        }
        Ok(users)
    }

    async fn fetch_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Vec<HistoryEntry>, Self::Error> {
        let api = self.api()?;
        let account_id = self.resolve_account_id(request.user.as_deref()).await?;
        let library = self.find_movie_library(&request.library).await?;

        let since = request
            .from
            .as_ref()
            .map(|bound| bound.datetime().and_utc());
        let items = api
            .get_history(Some(&library.key), account_id, since)
            .await?;

        // The server-side filters are best-effort; re-check everything
        // here so the date window and account scope actually hold.
        let kept: Vec<HistoryItem> = items
            .into_iter()
            .filter(|item| item.type_ == "movie")
            .filter(|item| account_id.map_or(true, |id| item.account_id == Some(id)))
            .filter(|item| {
                within_bounds_at(
                    item.viewed_at.naive_utc(),
                    request.from.as_ref(),
                    request.to.as_ref(),
                )
            })
            .collect();
        debug!(count = kept.len(), library = %library.title, "watch rows after filtering");

        let details = self
            .fetch_details(kept.iter().filter_map(|item| item.rating_key.clone()))
            .await?;

        let bare = MovieDetails::default();
        let entries = kept
            .into_iter()
            .map(|item| {
                let found = item
                    .rating_key
                    .as_ref()
                    .and_then(|key| details.get(key))
                    .unwrap_or(&bare);
                Self::entry_from(item, found)
            })
            .collect();
        Ok(entries)
    }

    async fn fetch_unwatched(
        &self,
        library: &str,
        user: Option<&str>,
    ) -> Result<Vec<LibraryMovie>, Self::Error> {
        let api = self.api()?;
        let account_id = self.resolve_account_id(user).await?;
        let library = self.find_movie_library(library).await?;
        let movies = api.get_library_movies(&library.key).await?;

        // With a user filter, "watched" means that account's history;
        // without one, any watch on the server counts.
        let unwatched: Vec<_> = match account_id {
            Some(id) => {
                let watched: HashSet<String> = api
                    .get_history(Some(&library.key), Some(id), None)
                    .await?
                    .into_iter()
                    .filter(|item| item.account_id == Some(id))
                    .filter_map(|item| item.rating_key)
                    .collect();
                movies
                    .into_iter()
                    .filter(|movie| !watched.contains(&movie.rating_key))
                    .collect()
            }
            None => movies
                .into_iter()
                .filter(|movie| movie.view_count == 0)
                .collect(),
        };

        let details = self
            .fetch_details(unwatched.iter().map(|movie| movie.rating_key.clone()))
            .await?;

        let bare = MovieDetails::default();
        let result = unwatched
            .into_iter()
            .map(|movie| {
                let found = details.get(&movie.rating_key).unwrap_or(&bare);
                LibraryMovie {
                    tmdb_id: found.tmdb_id.clone(),
                    title: movie.title,
                    year: movie.year,
                    directors: found.directors.clone(),
                    genres: found.genres.clone(),
                }
            })
            .collect();
        Ok(result)
    }
}
