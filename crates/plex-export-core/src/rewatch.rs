// Rewatch resolution: collapse or flag duplicate viewings of one work.
//
// Flags are always recomputed here from watch dates; whatever the source
// reported is ignored, so cached replay and fresh fetches agree.

use plex_export_models::{RewatchPolicy, WatchRecord};
use std::collections::{HashMap, HashSet};

type IdentityKey = (String, String);

/// Apply the configured rewatch policy to one run's dataset.
///
/// `mark_rewatches = false` forces the flag off on every surviving record.
/// It never changes which records are dropped.
pub fn resolve_rewatches(
    records: Vec<WatchRecord>,
    policy: RewatchPolicy,
    mark_rewatches: bool,
) -> Vec<WatchRecord> {
    let mut resolved = match policy {
        RewatchPolicy::All => flag_chronological_repeats(records),
        RewatchPolicy::First | RewatchPolicy::Disabled => keep_first_watches(records),
        RewatchPolicy::Last => keep_last_watches(records),
    };

    if !mark_rewatches {
        for record in &mut resolved {
            record.rewatch = false;
        }
    }
    resolved
}

/// Retain everything; the chronologically first viewing of each work is not
/// a rewatch, every later one is. Input order is preserved.
fn flag_chronological_repeats(mut records: Vec<WatchRecord>) -> Vec<WatchRecord> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| (records[i].watched_on, i));

    let mut seen: HashSet<IdentityKey> = HashSet::new();
    let mut flags = vec![false; records.len()];
    for i in order {
        flags[i] = !seen.insert(records[i].identity_key());
    }

    for (record, flag) in records.iter_mut().zip(flags) {
        record.rewatch = flag;
    }
    records
}

/// Retain only the earliest viewing per work, in chronological order.
fn keep_first_watches(mut records: Vec<WatchRecord>) -> Vec<WatchRecord> {
    // Stable sort: input encounter order breaks same-day ties
    records.sort_by_key(|record| record.watched_on);

    let mut seen: HashSet<IdentityKey> = HashSet::new();
    let mut kept = Vec::new();
    for mut record in records {
        if seen.insert(record.identity_key()) {
            record.rewatch = false;
            kept.push(record);
        }
    }
    kept
}

/// Retain only the most recent viewing per work; on equal dates the later
/// scan position wins. Output keeps first-occurrence key order.
fn keep_last_watches(records: Vec<WatchRecord>) -> Vec<WatchRecord> {
    let mut index: HashMap<IdentityKey, usize> = HashMap::new();
    let mut kept: Vec<WatchRecord> = Vec::new();

    for mut record in records {
        record.rewatch = false;
        match index.get(&record.identity_key()) {
            Some(&slot) => {
                if record.watched_on >= kept[slot].watched_on {
                    kept[slot] = record;
                }
            }
            None => {
                index.insert(record.identity_key(), kept.len());
                kept.push(record);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn watch(title: &str, date: &str) -> WatchRecord {
        WatchRecord {
            tmdb_id: None,
            title: title.to_string(),
            year: "2019".to_string(),
            directors: String::new(),
            watched_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            rating: None,
            tags: String::new(),
            rewatch: false,
        }
    }

    fn tagged(title: &str, date: &str, marker: &str) -> WatchRecord {
        WatchRecord {
            directors: marker.to_string(),
            ..watch(title, date)
        }
    }

    #[test]
    fn test_all_flags_chronological_first_not_input_first() {
        // Input is not in date order; the 2020 viewing must be the non-rewatch
        let input = vec![
            watch("Arrival", "2021-01-01"),
            watch("Arrival", "2021-06-01"),
            watch("Arrival", "2020-01-01"),
        ];
        let mut resolved = resolve_rewatches(input, RewatchPolicy::All, true);
        assert_eq!(resolved.len(), 3);

        resolved.sort_by_key(|r| r.watched_on);
        let flags: Vec<bool> = resolved.iter().map(|r| r.rewatch).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(resolved[0].watched_on.to_string(), "2020-01-01");
    }

    #[test]
    fn test_all_retains_every_record_in_input_order() {
        let input = vec![
            watch("A", "2024-02-01"),
            watch("B", "2024-01-01"),
            watch("A", "2024-03-01"),
        ];
        let resolved = resolve_rewatches(input, RewatchPolicy::All, true);
        let titles: Vec<&str> = resolved.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "A"]);
        assert_eq!(
            resolved.iter().map(|r| r.rewatch).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_first_keeps_one_per_key() {
        let input = vec![
            watch("Dune", "2023-05-01"),
            watch("Dune", "2021-10-22"),
            watch("Tenet", "2020-08-26"),
        ];
        let resolved = resolve_rewatches(input, RewatchPolicy::First, true);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].title, "Tenet");
        assert_eq!(resolved[1].title, "Dune");
        assert_eq!(resolved[1].watched_on.to_string(), "2021-10-22");
        assert!(resolved.iter().all(|r| !r.rewatch));
    }

    #[test]
    fn test_disabled_behaves_like_first() {
        let input = vec![watch("Dune", "2023-05-01"), watch("Dune", "2021-10-22")];
        let first = resolve_rewatches(input.clone(), RewatchPolicy::First, true);
        let disabled = resolve_rewatches(input, RewatchPolicy::Disabled, true);
        assert_eq!(first, disabled);
    }

    #[test]
    fn test_last_keeps_max_date() {
        let input = vec![
            watch("Heat", "2020-01-01"),
            watch("Ronin", "2022-01-01"),
            watch("Heat", "2024-06-01"),
            watch("Heat", "2021-01-01"),
        ];
        let resolved = resolve_rewatches(input, RewatchPolicy::Last, true);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].title, "Heat");
        assert_eq!(resolved[0].watched_on.to_string(), "2024-06-01");
        assert_eq!(resolved[1].title, "Ronin");
    }

    #[test]
    fn test_last_tie_goes_to_later_scan_position() {
        let input = vec![
            tagged("Heat", "2024-06-01", "earlier"),
            tagged("Heat", "2024-06-01", "later"),
        ];
        let resolved = resolve_rewatches(input, RewatchPolicy::Last, true);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].directors, "later");
    }

    #[test]
    fn test_mark_override_only_clears_flags() {
        let input = vec![
            watch("A", "2024-01-01"),
            watch("A", "2024-02-01"),
            watch("B", "2024-01-15"),
        ];
        let resolved = resolve_rewatches(input, RewatchPolicy::All, false);
        assert_eq!(resolved.len(), 3); // retention untouched
        assert!(resolved.iter().all(|r| !r.rewatch));
    }

    #[test]
    fn test_identity_key_is_case_insensitive_on_title() {
        let input = vec![watch("heat", "2020-01-01"), watch("Heat", "2021-01-01")];
        let resolved = resolve_rewatches(input, RewatchPolicy::First, true);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].watched_on.to_string(), "2020-01-01");
    }

    #[test]
    fn test_same_title_different_year_not_deduped() {
        let mut remake = watch("Dune", "2022-01-01");
        remake.year = "2021".to_string();
        let mut original = watch("Dune", "2022-01-02");
        original.year = "1984".to_string();

        let resolved = resolve_rewatches(vec![remake, original], RewatchPolicy::First, true);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        for policy in [
            RewatchPolicy::All,
            RewatchPolicy::First,
            RewatchPolicy::Last,
            RewatchPolicy::Disabled,
        ] {
            assert!(resolve_rewatches(Vec::new(), policy, true).is_empty());
        }
    }
}
