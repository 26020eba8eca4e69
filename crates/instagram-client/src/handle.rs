/// Instagram usernames are at most 30 characters.
const MAX_HANDLE_LEN: usize = 30;

/// Normalize a raw username into canonical form: trimmed, leading `@`
/// stripped, internal whitespace removed, lowercased.
///
/// Returns `None` for empty or over-length input. Every cache key, upstream
/// lookup, and ledger participant row uses the normalized form, so
/// differently-cased or padded spellings of the same account collide.
pub fn normalize_handle(raw: &str) -> Option<String> {
    let normalized: String = raw
        .trim()
        .trim_start_matches('@')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect();

    if normalized.is_empty() || normalized.len() > MAX_HANDLE_LEN {
        return None;
    }
    Some(normalized)
}
