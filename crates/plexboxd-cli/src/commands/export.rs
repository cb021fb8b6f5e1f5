use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use color_eyre::eyre::eyre;
use indicatif::ProgressBar;
use serde_json::json;
use tracing::debug;

use plex_export_config::Config;
use plex_export_core::{
    export_file_name, latest_export, read_cached_records, resolve_checkpoint, scope_name,
    slice_by_date, transform_history, write_csv, ExportOptions,
};
use plex_export_models::{DateBound, HistoryEntry, SourceUser, WatchRecord};
use plex_export_sources::{HistoryRequest, HistorySource, PlexClient};

use crate::output::{Output, OutputFormat};

pub struct ExportArgs {
    pub output_file: Option<PathBuf>,
    pub user: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub cached: bool,
    pub list_users: bool,
    pub no_checkpoint: bool,
}

pub async fn run_export(
    args: ExportArgs,
    config_path: Option<PathBuf>,
    output: &Output,
) -> color_eyre::Result<()> {
    let config = super::config::load_config(config_path.as_deref())?;

    let user_filter = args.user.clone().or_else(|| config.export.user.clone());
    let scope = scope_name(user_filter.as_deref());
    let export_dir = args
        .export_dir
        .clone()
        .unwrap_or_else(|| config.export.dir.clone());

    // Flags beat config values on both bounds.
    let explicit_from = parse_bound(args.from_date.as_deref().or(config.export.from.as_deref()))?;
    let to_bound = parse_bound(args.to_date.as_deref().or(config.export.to.as_deref()))?;

    let records = if args.cached {
        if args.list_users {
            return Err(eyre!("--list-users needs the server; drop --cached"));
        }
        replay_cached(&export_dir, &scope, explicit_from, to_bound, output)?
    } else {
        match fetch_fresh(
            &args,
            &config,
            user_filter.as_deref(),
            &scope,
            &export_dir,
            explicit_from,
            to_bound,
            output,
        )
        .await?
        {
            Some(records) => records,
            // --list-users already printed its listing
            None => return Ok(()),
        }
    };

    if records.is_empty() {
        output.info("No watch history found matching the criteria");
        return Ok(());
    }

    let transformed = transform_history(records, &config.csv);

    let output_path = args
        .output_file
        .or_else(|| config.export.output.clone())
        .unwrap_or_else(|| {
            let stamp = Local::now()
                .format(config.export.timestamp_format.format_str())
                .to_string();
            export_dir.join(export_file_name(&config.export.file_pattern, &scope, &stamp))
        });

    let write_options = ExportOptions {
        include_rating: config.csv.rating,
        max_rows: config.csv.max_rows,
    };
    let summary = write_csv(&transformed, &output_path, &write_options).map_err(|e| eyre!("{e:#}"))?;

    if summary.truncated > 0 {
        output.warn(format!(
            "Row cap reached: {} records were not written. Narrow the date range and export again.",
            summary.truncated
        ));
    }
    match output.format() {
        OutputFormat::Human => output.success(format!(
            "Exported {} watch records to {}",
            summary.written,
            output_path.display()
        )),
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({
            "written": summary.written,
            "truncated": summary.truncated,
            "path": output_path,
        })),
    }
    Ok(())
}

fn parse_bound(raw: Option<&str>) -> color_eyre::Result<Option<DateBound>> {
    raw.map(|s| s.parse::<DateBound>().map_err(|e| eyre!("{e}")))
        .transpose()
}

/// Replay the newest previous export through the same slicing and transform
/// pipeline a fresh fetch would go through.
fn replay_cached(
    export_dir: &Path,
    scope: &str,
    from: Option<DateBound>,
    to: Option<DateBound>,
    output: &Output,
) -> color_eyre::Result<Vec<WatchRecord>> {
    let Some(path) = latest_export(export_dir, scope) else {
        return Err(eyre!(
            "No cached export for scope '{}' under {}; run without --cached first",
            scope,
            export_dir.display()
        ));
    };
    output.info(format!("Replaying cached export {}", path.display()));
    let records = read_cached_records(&path).map_err(|e| eyre!("{e:#}"))?;
    Ok(slice_by_date(records, from, to))
}

#[allow(clippy::too_many_arguments)]
async fn fetch_fresh(
    args: &ExportArgs,
    config: &Config,
    user_filter: Option<&str>,
    scope: &str,
    export_dir: &Path,
    explicit_from: Option<DateBound>,
    to_bound: Option<DateBound>,
    output: &Output,
) -> color_eyre::Result<Option<Vec<WatchRecord>>> {
    let (url, token, timeout) = super::config::plex_connection(config)?;
    let mut client = PlexClient::new(url, token, timeout);
    client.authenticate().await.map_err(|e| eyre!("{e}"))?;

    if args.list_users {
        let users = client.list_users().await.map_err(|e| eyre!("{e}"))?;
        print_users(&users, output);
        return Ok(None);
    }

    let derive_checkpoint = config.checkpoint.use_csv && !args.no_checkpoint;
    let from_bound = resolve_from_bound(explicit_from, derive_checkpoint, export_dir, scope);
    if explicit_from.is_none() && derive_checkpoint {
        match &from_bound {
            Some(bound) => output.info(format!("Resuming from checkpoint {}", bound.token())),
            None => debug!(scope, "no previous export, fetching full history"),
        }
    }

    let spinner = (output.format() == OutputFormat::Human && !output.is_quiet()).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_message("Fetching watch history from Plex...");
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    });

    let request = HistoryRequest {
        library: config.export.library.clone(),
        user: user_filter.map(String::from),
        from: from_bound,
        to: to_bound,
    };
    let result = client.fetch_history(&request).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let entries = result.map_err(|e| eyre!("{e}"))?;

    Ok(Some(
        entries.into_iter().map(HistoryEntry::into_record).collect(),
    ))
}

/// Lower-bound precedence for a fresh fetch: an explicit bound (flag, then
/// config) always wins; otherwise the checkpoint is derived from prior
/// exports unless derivation is switched off (`--no-checkpoint` or
/// `[checkpoint].use_csv = false`).
fn resolve_from_bound(
    explicit: Option<DateBound>,
    derive_checkpoint: bool,
    export_dir: &Path,
    scope: &str,
) -> Option<DateBound> {
    match explicit {
        Some(bound) => Some(bound),
        None if derive_checkpoint => resolve_checkpoint(export_dir, scope).map(DateBound::from),
        None => None,
    }
}

fn print_users(users: &[SourceUser], output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            output.println("Server users:");
            for user in users {
                let role = if user.owner { " (owner)" } else { "" };
                output.println(format!("  {} - {}{}", user.username, user.title, role));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&serde_json::to_value(users).unwrap_or_default());
        }
    }
}
