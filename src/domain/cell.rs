//! Cell normalization: trimming, blank canonicalization and length limits.

/// Default maximum length of a level name (header cell).
pub const MAX_LEVEL_LENGTH: usize = 20;

/// Default maximum length of an option name (data cell).
pub const MAX_OPTION_LENGTH: usize = 45;

/// A cleaned cell value. `None` is the blank marker.
pub type Cell = Option<String>;

/// Length limits applied while cleaning headers and data cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_level_length: usize,
    pub max_option_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_level_length: MAX_LEVEL_LENGTH,
            max_option_length: MAX_OPTION_LENGTH,
        }
    }
}

/// Normalize a raw cell.
///
/// Surrounding whitespace is trimmed, empty or whitespace-only input becomes blank,
/// and the remaining text is cut to `max_len` characters. Never fails; normalizing
/// an already normalized cell returns it unchanged.
pub fn normalize(raw: Option<&str>, max_len: usize) -> Cell {
    let trimmed = raw?.trim();
    let cut = truncate_chars(trimmed, max_len).trim_end();
    if cut.is_empty() {
        None
    } else {
        Some(cut.to_string())
    }
}

/// True for missing, empty and whitespace-only values.
pub fn is_blank(raw: Option<&str>) -> bool {
    raw.map_or(true, |s| s.trim().is_empty())
}

/// Cut `s` to at most `max_len` characters without splitting a code point.
fn truncate_chars(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
