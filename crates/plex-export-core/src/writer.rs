use anyhow::Result;
use chrono::NaiveDate;
use plex_export_models::bounds::DATE_FORMAT;
use plex_export_models::WatchRecord;
use std::path::Path;
use tracing::{info, warn};

/// Options for one export write, derived from the csv config section.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_rating: bool,
    pub max_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    /// Rows dropped by the cap; non-zero means the caller should warn.
    pub truncated: usize,
}

/// Fixed output column order. The Rating column is conditional; the trailing
/// Tags and Rewatch columns always appear.
pub fn columns(include_rating: bool) -> Vec<&'static str> {
    let mut columns = vec!["tmdbID", "Title", "Year", "Directors", "WatchedDate"];
    if include_rating {
        columns.push("Rating");
    }
    columns.extend(["Tags", "Rewatch"]);
    columns
}

fn field(record: &WatchRecord, column: &str) -> String {
    match column {
        "tmdbID" => record.tmdb_id.clone().unwrap_or_default(),
        "Title" => record.title.clone(),
        "Year" => record.year.clone(),
        "Directors" => record.directors.clone(),
        "WatchedDate" => record.watched_on.format(DATE_FORMAT).to_string(),
        "Rating" => record.rating.clone().unwrap_or_default(),
        "Tags" => record.tags.clone(),
        "Rewatch" => if record.rewatch { "Yes" } else { "No" }.to_string(),
        // Missing fields serialize as empty, never as an error
        _ => String::new(),
    }
}

pub(crate) fn parse_watched_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Write the export file: one header row, one row per surviving record.
/// Exceeding the row cap truncates head-preserving and is reported in the
/// summary, never as an error.
pub fn write_csv(records: &[WatchRecord], path: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    let columns = columns(options.include_rating);

    let truncated = records.len().saturating_sub(options.max_rows);
    if truncated > 0 {
        warn!(
            total = records.len(),
            max_rows = options.max_rows,
            "row cap exceeded, truncating export for import compatibility"
        );
    }
    let records = &records[..records.len().min(options.max_rows)];

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| field(record, column)))?;
    }
    writer.flush()?;

    info!(written = records.len(), path = %path.display(), "export written");
    Ok(ExportSummary {
        written: records.len(),
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str, date: &str) -> WatchRecord {
        WatchRecord {
            tmdb_id: Some("603".to_string()),
            title: title.to_string(),
            year: "1999".to_string(),
            directors: "Lana Wachowski, Lilly Wachowski".to_string(),
            watched_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            rating: Some("4.5".to_string()),
            tags: "Action".to_string(),
            rewatch: true,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_header_without_rating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let options = ExportOptions { include_rating: false, max_rows: 1900 };
        write_csv(&[record("The Matrix", "2024-01-01")], &path, &options).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines[0], "tmdbID,Title,Year,Directors,WatchedDate,Tags,Rewatch");
        assert_eq!(lines[1], "603,The Matrix,1999,\"Lana Wachowski, Lilly Wachowski\",2024-01-01,Action,Yes");
    }

    #[test]
    fn test_header_with_rating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let options = ExportOptions { include_rating: true, max_rows: 1900 };
        write_csv(&[record("The Matrix", "2024-01-01")], &path, &options).unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines[0], "tmdbID,Title,Year,Directors,WatchedDate,Rating,Tags,Rewatch");
        assert!(lines[1].contains(",4.5,"));
    }

    #[test]
    fn test_missing_fields_serialize_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut sparse = record("Unknown", "2024-01-01");
        sparse.tmdb_id = None;
        sparse.rating = None;
        sparse.year = String::new();
        sparse.directors = String::new();
        sparse.tags = String::new();
        sparse.rewatch = false;

        let options = ExportOptions { include_rating: true, max_rows: 10 };
        write_csv(&[sparse], &path, &options).unwrap();
        let lines = read_lines(&path);
        assert_eq!(lines[1], ",Unknown,,,2024-01-01,,,No");
    }

    #[test]
    fn test_row_cap_truncates_preserving_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("capped.csv");
        let records: Vec<WatchRecord> = (0..2000)
            .map(|i| record(&format!("Movie {}", i), "2024-01-01"))
            .collect();

        let options = ExportOptions { include_rating: false, max_rows: 1900 };
        let summary = write_csv(&records, &path, &options).unwrap();
        assert_eq!(summary.written, 1900);
        assert_eq!(summary.truncated, 100);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1901); // header + capped rows
        assert!(lines[1].contains("Movie 0"));
        assert!(lines[1900].contains("Movie 1899"));
    }

    #[test]
    fn test_under_cap_reports_no_truncation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.csv");
        let options = ExportOptions { include_rating: false, max_rows: 1900 };
        let summary = write_csv(&[record("A", "2024-01-01")], &path, &options).unwrap();
        assert_eq!(summary, ExportSummary { written: 1, truncated: 0 });
    }

    #[test]
    fn test_empty_dataset_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let options = ExportOptions { include_rating: false, max_rows: 1900 };
        let summary = write_csv(&[], &path, &options).unwrap();
        assert_eq!(summary.written, 0);
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("out.csv");
        let options = ExportOptions { include_rating: false, max_rows: 10 };
        write_csv(&[record("A", "2024-01-01")], &path, &options).unwrap();
        assert!(path.exists());
    }
}
