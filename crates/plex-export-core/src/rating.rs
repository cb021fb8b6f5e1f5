// Rating normalization onto the half-step 0.5-5.0 import scale.

/// Normalize an optional raw rating. `None` means unrated and serializes as
/// an empty field; a bad or non-positive value is unrated, never an error.
///
/// The two conversion branches are deliberate: values at or below 5 are
/// treated as already on the target scale (cached re-exports), values above
/// 5 as the source's 1-10 scale. A raw "5" is ambiguous between the two by
/// construction; both branches land it on 5.0 either way it is read.
pub fn normalize_rating(raw: Option<&str>, convert: bool) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let value: f64 = raw.parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    if !convert {
        return Some(raw.to_string());
    }

    let stars = if value <= 5.0 {
        // Already on the target scale, snap to the nearest half step
        (value / 0.5).round() * 0.5
    } else {
        // 1-10 source scale, halve the rounded integer
        value.round() / 2.0
    };
    let stars = stars.clamp(0.5, 5.0);

    // One decimal place, then trim "3.0" down to "3"
    let formatted = format!("{:.1}", stars);
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    Some(formatted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(raw: &str) -> Option<String> {
        normalize_rating(Some(raw), true)
    }

    #[test]
    fn test_top_of_source_scale() {
        assert_eq!(converted("10").as_deref(), Some("5"));
        assert_eq!(converted("9").as_deref(), Some("4.5"));
        assert_eq!(converted("7").as_deref(), Some("3.5"));
        assert_eq!(converted("6").as_deref(), Some("3"));
    }

    #[test]
    fn test_already_normalized_values_snap_to_half_steps() {
        assert_eq!(converted("4.7").as_deref(), Some("4.5"));
        assert_eq!(converted("3.5").as_deref(), Some("3.5"));
        assert_eq!(converted("3").as_deref(), Some("3"));
        assert_eq!(converted("0.2").as_deref(), Some("0.5")); // clamped floor
    }

    #[test]
    fn test_zero_and_negative_are_unrated() {
        assert_eq!(converted("0"), None);
        assert_eq!(converted("-2"), None);
        assert_eq!(normalize_rating(Some("0"), false), None);
    }

    #[test]
    fn test_absent_empty_and_garbage_are_unrated() {
        assert_eq!(normalize_rating(None, true), None);
        assert_eq!(converted(""), None);
        assert_eq!(converted("   "), None);
        assert_eq!(converted("great"), None);
        assert_eq!(normalize_rating(Some("great"), false), None);
    }

    #[test]
    fn test_conversion_disabled_passes_raw_through() {
        assert_eq!(normalize_rating(Some("8"), false).as_deref(), Some("8"));
        assert_eq!(normalize_rating(Some("4.7"), false).as_deref(), Some("4.7"));
    }

    #[test]
    fn test_clamped_ceiling() {
        assert_eq!(converted("11").as_deref(), Some("5"));
        assert_eq!(converted("99").as_deref(), Some("5"));
    }

    #[test]
    fn test_idempotent_on_own_output() {
        for raw in ["10", "7", "4.7", "1", "0.5"] {
            let once = converted(raw).unwrap();
            let twice = converted(&once).unwrap();
            assert_eq!(once, twice, "re-normalizing {} drifted", raw);
        }
    }
}
