use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

/// Cuts `text` to at most `max_chars` characters, appending an ellipsis when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((byte_index, _)) => {
            let mut shortened = text[..byte_index].trim_end().to_owned();
            shortened.push('…');
            Cow::Owned(shortened)
        }
    }
}

/// Deterministic offset in `[-1, 1]²` derived from an id, used to break placement symmetry.
pub fn stable_jitter(id: &str) -> Vec2 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    vec2((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
