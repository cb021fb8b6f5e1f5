use plex_export_models::bounds::within_bounds;
use plex_export_models::{DateBound, WatchRecord};

/// Keep the records whose watch date falls within `[from, to]`, open on
/// whichever side is unset. Order is preserved.
///
/// Cached replay and fresh fetches both funnel through the predicates in
/// `plex_export_models::bounds`, so the two paths cannot drift apart.
pub fn slice_by_date(
    records: Vec<WatchRecord>,
    from: Option<DateBound>,
    to: Option<DateBound>,
) -> Vec<WatchRecord> {
    if from.is_none() && to.is_none() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| within_bounds(record.watched_on, from.as_ref(), to.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(title: &str, date: &str) -> WatchRecord {
        WatchRecord {
            tmdb_id: None,
            title: title.to_string(),
            year: "2020".to_string(),
            directors: String::new(),
            watched_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            rating: None,
            tags: String::new(),
            rewatch: false,
        }
    }

    fn titles(records: &[WatchRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_no_bounds_returns_everything() {
        let input = vec![record("a", "2024-01-01"), record("b", "2023-01-01")];
        let sliced = slice_by_date(input.clone(), None, None);
        assert_eq!(sliced, input);
    }

    #[test]
    fn test_inclusive_range() {
        let input = vec![
            record("before", "2023-12-31"),
            record("start", "2024-01-01"),
            record("mid", "2024-02-15"),
            record("end", "2024-03-01"),
            record("after", "2024-03-02"),
        ];
        let from = "2024-01-01".parse().ok();
        let to = "2024-03-01".parse().ok();
        let sliced = slice_by_date(input, from, to);
        assert_eq!(titles(&sliced), vec!["start", "mid", "end"]);
    }

    #[test]
    fn test_open_sides() {
        let input = vec![record("old", "2020-01-01"), record("new", "2025-01-01")];

        let from_only = slice_by_date(input.clone(), "2024-01-01".parse().ok(), None);
        assert_eq!(titles(&from_only), vec!["new"]);

        let to_only = slice_by_date(input, None, "2024-01-01".parse().ok());
        assert_eq!(titles(&to_only), vec!["old"]);
    }

    #[test]
    fn test_string_and_value_bounds_agree() {
        let input = vec![record("a", "2024-01-01"), record("b", "2024-06-01")];
        let parsed: DateBound = "2024-03-01".parse().unwrap();
        let direct = DateBound::Day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        assert_eq!(
            slice_by_date(input.clone(), Some(parsed), None),
            slice_by_date(input, Some(direct), None)
        );
    }

    #[test]
    fn test_order_preserved() {
        let input = vec![
            record("later-first", "2024-06-01"),
            record("earlier-second", "2024-01-05"),
            record("middle-third", "2024-03-01"),
        ];
        let sliced = slice_by_date(input, "2024-01-01".parse().ok(), None);
        assert_eq!(titles(&sliced), vec!["later-first", "earlier-second", "middle-third"]);
    }

    #[test]
    fn test_empty_input() {
        let sliced = slice_by_date(Vec::new(), "2024-01-01".parse().ok(), None);
        assert!(sliced.is_empty());
    }
}
