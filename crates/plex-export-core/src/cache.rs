// Cached-export replay: read a previously written export back into records.
//
// Round-trip contract with the writer: a written export read back here
// reproduces the same records; the rewatch/tag post-processing that was
// already applied is idempotent to reapply.

use anyhow::Result;
use plex_export_models::WatchRecord;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::writer::parse_watched_date;

/// Parse a prior export. Rows with an unparseable watch date or a malformed
/// shape are skipped, never fatal.
pub fn read_cached_records(path: &Path) -> Result<Vec<WatchRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "skipping malformed cached row");
                skipped += 1;
                continue;
            }
        };

        let get = |column: &str| -> &str {
            header_map
                .get(column)
                .and_then(|&i| row.get(i))
                .unwrap_or("")
        };
        let optional = |value: &str| -> Option<String> {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        let Some(watched_on) = parse_watched_date(get("WatchedDate")) else {
            debug!(raw = get("WatchedDate"), "skipping cached row with bad watch date");
            skipped += 1;
            continue;
        };

        records.push(WatchRecord {
            tmdb_id: optional(get("tmdbID")),
            title: get("Title").to_string(),
            year: get("Year").to_string(),
            directors: get("Directors").to_string(),
            watched_on,
            rating: optional(get("Rating")),
            tags: get("Tags").to_string(),
            rewatch: get("Rewatch") == "Yes",
        });
    }

    info!(
        loaded = records.len(),
        skipped,
        path = %path.display(),
        "loaded cached export"
    );
    Ok(records)
}
