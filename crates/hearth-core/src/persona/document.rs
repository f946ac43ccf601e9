//! Persona document ("SOUL") operations.
//!
//! A persona document is markdown with an optional locked section
//! headed by `## Core Principles`. The reflection cycle may rewrite
//! every other part of the document; the locked section must survive
//! byte-for-byte no matter what the reasoning process proposes.

/// Heading that opens the locked section.
pub const LOCKED_HEADING: &str = "## Core Principles";

/// Tag pair the reflection prompt asks the reasoning process to wrap
/// its proposed document in.
pub const REVISION_OPEN_TAG: &str = "<revised_persona>";
pub const REVISION_CLOSE_TAG: &str = "</revised_persona>";

/// Extracts the proposed document from raw reflection output.
///
/// Returns `None` when the tag pair is absent or malformed, in which
/// case the reflection is reported as not applied.
pub fn extract_revision(raw: &str) -> Option<String> {
    let start = raw.find(REVISION_OPEN_TAG)? + REVISION_OPEN_TAG.len();
    let end = raw[start..].find(REVISION_CLOSE_TAG)? + start;
    Some(raw[start..end].trim().to_string())
}

/// Byte range of the locked section within `doc`, if present.
///
/// The section spans from the locked heading line to the next
/// top-level heading (`#` or `##`) or the end of the document.
fn locked_section_range(doc: &str) -> Option<std::ops::Range<usize>> {
    let mut start = None;
    let mut offset = 0;

    for line in doc.split_inclusive('\n') {
        let trimmed = line.trim_end();
        match start {
            None => {
                if trimmed == LOCKED_HEADING {
                    start = Some(offset);
                }
            }
            Some(begin) => {
                if is_top_level_heading(trimmed) {
                    return Some(begin..offset);
                }
            }
        }
        offset += line.len();
    }

    start.map(|begin| begin..doc.len())
}

fn is_top_level_heading(line: &str) -> bool {
    (line.starts_with("# ") || line.starts_with("## ")) && line != LOCKED_HEADING
}

/// Returns the locked section of `doc` with trailing whitespace
/// trimmed, or `None` if the document has no locked section.
pub fn locked_section(doc: &str) -> Option<&str> {
    locked_section_range(doc).map(|range| doc[range].trim_end())
}

/// Substitutes the original locked section back into a proposed
/// document.
///
/// Returns the corrected document and whether a correction was made:
///
/// - original has no locked section → proposal is used unchanged;
/// - proposal kept the section byte-identical → unchanged;
/// - proposal rewrote the section → the original bytes are spliced in
///   at the same position;
/// - proposal dropped the section → it is re-inserted immediately
///   before the proposal's first heading, or appended when the
///   proposal has no headings.
///
/// This never fails: tampering is silently corrected, not rejected.
pub fn restore_locked_section(original: &str, proposed: &str) -> (String, bool) {
    let Some(original_range) = locked_section_range(original) else {
        return (proposed.to_string(), false);
    };
    let original_section = &original[original_range];

    match locked_section_range(proposed) {
        Some(range) if proposed[range.clone()].trim_end() == original_section.trim_end() => {
            (proposed.to_string(), false)
        }
        Some(range) => {
            let mut out = String::with_capacity(proposed.len() + original_section.len());
            out.push_str(&proposed[..range.start]);
            out.push_str(original_section.trim_end());
            out.push('\n');
            out.push_str(&proposed[range.end..]);
            (out, true)
        }
        None => {
            let block = format!("{}\n\n", original_section.trim_end());
            let insert_at = proposed
                .split_inclusive('\n')
                .scan(0, |offset, line| {
                    let at = *offset;
                    *offset += line.len();
                    Some((at, line))
                })
                .find(|(_, line)| line.trim_end().starts_with('#'))
                .map(|(at, _)| at);

            let out = match insert_at {
                Some(at) => format!("{}{}{}", &proposed[..at], block, &proposed[at..]),
                None if proposed.trim().is_empty() => original_section.trim_end().to_string(),
                None => format!("{}\n\n{}", proposed.trim_end(), original_section.trim_end()),
            };
            (out, true)
        }
    }
}
