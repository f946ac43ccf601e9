//! Conversation label derivation.

/// Maximum label length in characters, excluding the ellipsis marker.
pub const MAX_LABEL_CHARS: usize = 30;

/// A word-boundary cut is only taken past this position, so a long
/// first word does not shrink the label to almost nothing.
const MIN_BREAK_POS: usize = 15;

/// Derives a short label from message text.
///
/// Whitespace is collapsed first. Text of at most
/// [`MAX_LABEL_CHARS`] characters is kept as-is; longer text is
/// truncated to that length, backtracked to the last word boundary past
/// position [`MIN_BREAK_POS`] so no word is cut mid-way, and suffixed
/// with an ellipsis.
pub fn derive_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();

    if chars.len() <= MAX_LABEL_CHARS {
        return collapsed;
    }

    let head = &chars[..MAX_LABEL_CHARS];
    let cut = head
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|pos| *pos > MIN_BREAK_POS)
        .unwrap_or(MAX_LABEL_CHARS);

    let mut label: String = head[..cut].iter().collect();
    label.truncate(label.trim_end().len());
    label.push('…');
    label
}
