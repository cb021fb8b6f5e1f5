// Checkpoint resolution from previously written export files.
//
// The checkpoint is never persisted on its own: it is re-derived on every
// run from the filenames of prior exports, so a run that dies before
// writing leaves the next run's fetch window unchanged.

use chrono::NaiveDateTime;
use plex_export_models::DateBound;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scope part of an export filename: the user filter or the literal "all".
pub fn scope_name(user_filter: Option<&str>) -> String {
    match user_filter {
        Some(user) if !user.is_empty() => user.to_string(),
        _ => "all".to_string(),
    }
}

/// Substitute `{user}` and `{timestamp}` in the configured filename pattern.
/// The resolver parses this shape back, so producer and resolver stay in
/// lock-step through this one function pair.
pub fn export_file_name(pattern: &str, scope: &str, stamp: &str) -> String {
    pattern.replace("{user}", scope).replace("{timestamp}", stamp)
}

fn scan_exports(export_dir: &Path, scope: &str) -> Vec<(NaiveDateTime, PathBuf)> {
    let prefix = format!("plex-watched-{}-", scope);
    let entries = match std::fs::read_dir(export_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %export_dir.display(), error = %e, "export directory not readable, no checkpoint");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name.strip_suffix(".csv") else { continue };
        let Some(token) = stem.strip_prefix(prefix.as_str()) else { continue };

        match token.parse::<DateBound>() {
            Ok(bound) => found.push((bound.datetime(), entry.path())),
            Err(_) => {
                // Not fatal: foreign files in the export dir are ignored
                debug!(file = name, "skipping export with unrecognized timestamp token");
            }
        }
    }
    found
}

/// Latest previously exported timestamp for a scope, used as the inclusive
/// lower bound of the next fetch. `None` when no export parses.
pub fn resolve_checkpoint(export_dir: &Path, scope: &str) -> Option<NaiveDateTime> {
    let checkpoint = scan_exports(export_dir, scope)
        .into_iter()
        .map(|(stamp, _)| stamp)
        .max();

    if let Some(stamp) = checkpoint {
        info!(scope, checkpoint = %DateBound::Minute(stamp).token(), "resolved checkpoint from prior exports");
    }
    checkpoint
}

/// Path of the most recent export for a scope, for cached replay.
pub fn latest_export(export_dir: &Path, scope: &str) -> Option<PathBuf> {
    scan_exports(export_dir, scope)
        .into_iter()
        .max_by_key(|(stamp, _)| *stamp)
        .map(|(_, path)| path)
}
