use std::collections::BTreeSet;
use std::path::PathBuf;

use color_eyre::eyre::eyre;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use serde_json::json;

use plex_export_sources::{HistoryRequest, HistorySource, PlexClient};

use crate::output::{Output, OutputFormat};

const SAMPLE_SIZE: usize = 20;

pub async fn run_compare(
    user: Option<String>,
    config_path: Option<PathBuf>,
    output: &Output,
) -> color_eyre::Result<()> {
    let config = super::config::load_config(config_path.as_deref())?;
    let user_filter = user.or_else(|| config.export.user.clone());

    let (url, token, timeout) = super::config::plex_connection(&config)?;
    let mut client = PlexClient::new(url, token, timeout);
    client.authenticate().await.map_err(|e| eyre!("{e}"))?;

    let request = HistoryRequest {
        library: config.export.library.clone(),
        user: user_filter.clone(),
        from: None,
        to: None,
    };
    let watched: BTreeSet<String> = client
        .fetch_history(&request)
        .await
        .map_err(|e| eyre!("{e}"))?
        .into_iter()
        .map(|entry| match entry.year {
            Some(year) => format!("{} ({})", entry.title, year),
            None => entry.title,
        })
        .collect();

    let unwatched: BTreeSet<String> = client
        .fetch_unwatched(&config.export.library, user_filter.as_deref())
        .await
        .map_err(|e| eyre!("{e}"))?
        .into_iter()
        .map(|movie| movie.label())
        .collect();

    match output.format() {
        OutputFormat::Human => {
            let scope = user_filter.as_deref().unwrap_or("all users");
            output.println(format!(
                "Library '{}', scope: {}",
                config.export.library, scope
            ));

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["", "Titles"]);
            table.add_row(vec![Cell::new("Watched"), Cell::new(watched.len())]);
            table.add_row(vec![Cell::new("Unwatched"), Cell::new(unwatched.len())]);
            output.println(table.to_string());

            print_sample("Unwatched sample", &unwatched, output);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({
            "library": config.export.library,
            "user": user_filter,
            "watched": watched.len(),
            "unwatched": unwatched.len(),
            "unwatched_titles": unwatched,
        })),
    }
    Ok(())
}

fn print_sample(heading: &str, titles: &BTreeSet<String>, output: &Output) {
    if titles.is_empty() {
        return;
    }
    output.println(format!("\n{heading}:"));
    for title in titles.iter().take(SAMPLE_SIZE) {
        output.println(format!("  {title}"));
    }
    let rest = titles.len().saturating_sub(SAMPLE_SIZE);
    if rest > 0 {
        output.println(format!("  ... and {rest} more"));
    }
}
