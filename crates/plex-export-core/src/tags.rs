/// Build the output tags field: genre-derived tags first (when enabled and
/// present), then the static custom tag string (when configured and
/// non-empty), joined with `", "`. Nothing configured yields `""`.
///
/// Replayed exports feed their Tags field back in as the genre component,
/// custom tag included, so appending is skipped when the incoming string
/// already carries the custom tag as its delimited tail. That keeps
/// re-running the composer over its own output a no-op.
pub fn compose_tags(genre_tags: &str, export_genres: bool, custom_tags: Option<&str>) -> String {
    let mut tags: Vec<&str> = Vec::new();
    if export_genres && !genre_tags.is_empty() {
        tags.push(genre_tags);
    }
    if let Some(custom) = custom_tags.filter(|s| !s.is_empty()) {
        let suffix = format!(", {custom}");
        let already = tags.iter().any(|s| *s == custom || s.ends_with(&suffix));
        if !already {
            tags.push(custom);
        }
    }
    tags.join(", ")
}
