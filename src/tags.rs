/// Tasks keep at most this many tags; extra input past the cap is dropped.
pub const MAX_TAGS: usize = 10;

/// Splits a raw comma-separated tag string into a cleaned tag list: each part
/// trimmed, empties dropped, duplicates removed case-insensitively while the
/// first-seen casing and relative order win, capped at `MAX_TAGS`.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let tag = part.trim();
        if tag.is_empty() {
            continue;
        }
        let key = tag.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(tag.to_string());
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}
