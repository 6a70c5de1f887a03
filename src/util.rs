use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Ellipsizes `text` past `max_chars` characters.
pub fn truncate_label(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }

    let mut shortened = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    Cow::Owned(shortened)
}

/// Deterministic jitter in `[-1, 1]` on both axes for a demo node name, so
/// generated scenes look the same on every run.
pub fn stable_pair(key: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let unit = |bits: u64| (bits as u32) as f32 / u32::MAX as f32 * 2.0 - 1.0;
    (unit(hash), unit(hash >> 32))
}
