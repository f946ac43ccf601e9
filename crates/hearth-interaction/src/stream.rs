//! NDJSON stream parsing for reasoning-process output.
//!
//! The process emits one JSON object per line. Lines are folded into a
//! [`TurnAccumulator`] as they arrive; the final reply text is decided
//! only at [`TurnAccumulator::finalize`], once the exit status is
//! known.

use serde_json::Value;
use tracing::warn;

use hearth_core::reasoner::{TurnResult, FALLBACK_FAILURE_TEXT};

/// One parsed line of stream output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Terminal result event carrying the authoritative reply text.
    Result {
        text: String,
        session_id: Option<String>,
    },
    /// A complete assistant message. Each one replaces the previous.
    Assistant {
        text: String,
        session_id: Option<String>,
    },
    /// An incremental text fragment, appended to the current message.
    TextDelta(String),
    /// Any other well-formed event. Only mined for a session id.
    Other { session_id: Option<String> },
    /// A non-JSON line, treated as plain reply text.
    Raw(String),
}

/// Parses one line of process output.
///
/// Returns `None` for blank lines and for malformed JSON fragments,
/// which are logged and dropped. A line that is not JSON at all is
/// kept as [`StreamEvent::Raw`].
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Some(classify(&value)),
        Err(_) if looks_like_json_fragment(trimmed) => {
            warn!(line = trimmed, "dropping malformed stream line");
            None
        }
        Err(_) => Some(StreamEvent::Raw(trimmed.to_string())),
    }
}

fn looks_like_json_fragment(line: &str) -> bool {
    line.starts_with('{') || line.starts_with('[') || line.starts_with('"')
}

fn classify(value: &Value) -> StreamEvent {
    let session_id = value
        .get("session_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    match value.get("type").and_then(Value::as_str) {
        Some("result") => StreamEvent::Result {
            text: value
                .get("result")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            session_id,
        },
        Some("assistant") => StreamEvent::Assistant {
            text: assistant_text(value),
            session_id,
        },
        Some("content_block_delta") => {
            let delta = value
                .pointer("/delta/text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            StreamEvent::TextDelta(delta.to_string())
        }
        _ => StreamEvent::Other { session_id },
    }
}

/// Concatenates the text blocks of an assistant message event.
fn assistant_text(value: &Value) -> String {
    let Some(blocks) = value.pointer("/message/content").and_then(Value::as_array) else {
        return String::new();
    };
    blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

/// Folds stream events into a final reply.
///
/// Precedence at finalization: the result event's text wins outright;
/// otherwise the accumulated assistant text; otherwise, for a failed
/// process, captured stderr; otherwise a fixed fallback message. The
/// first session id seen is kept and later ones ignored.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    result_text: Option<String>,
    turn_text: String,
    session_id: Option<String>,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Result { text, session_id } => {
                self.result_text = Some(text);
                self.capture_session(session_id);
            }
            StreamEvent::Assistant { text, session_id } => {
                self.turn_text = text;
                self.capture_session(session_id);
            }
            StreamEvent::TextDelta(delta) => {
                self.turn_text.push_str(&delta);
            }
            StreamEvent::Other { session_id } => {
                self.capture_session(session_id);
            }
            StreamEvent::Raw(line) => {
                if !self.turn_text.is_empty() {
                    self.turn_text.push('\n');
                }
                self.turn_text.push_str(&line);
            }
        }
    }

    fn capture_session(&mut self, session_id: Option<String>) {
        if self.session_id.is_none() {
            self.session_id = session_id;
        }
    }

    /// The session id captured so far, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Whether any reply text has accumulated yet.
    pub fn has_text(&self) -> bool {
        self.result_text.is_some() || !self.turn_text.trim().is_empty()
    }

    /// Consumes the accumulator and decides the reply.
    pub fn finalize(self, exit_ok: bool, stderr: &str) -> TurnResult {
        let text = match self.result_text {
            Some(text) if !text.trim().is_empty() => text,
            _ if !self.turn_text.trim().is_empty() => self.turn_text,
            _ if !exit_ok && !stderr.trim().is_empty() => stderr.trim().to_string(),
            _ => FALLBACK_FAILURE_TEXT.to_string(),
        };
        TurnResult {
            text,
            session_id: self.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_lines(acc: &mut TurnAccumulator, lines: &[&str]) {
        for line in lines {
            if let Some(event) = parse_line(line) {
                acc.feed(event);
            }
        }
    }

    #[test]
    fn result_event_wins() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"draft"}]},"session_id":"s-1"}"#,
                r#"{"type":"result","result":"final answer","session_id":"s-1"}"#,
            ],
        );
        let result = acc.finalize(true, "");
        assert_eq!(result.text, "final answer");
        assert_eq!(result.session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn later_assistant_message_replaces_earlier() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"thinking..."}]}}"#,
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"here you go"}]}}"#,
            ],
        );
        assert_eq!(acc.finalize(true, "").text, "here you go");
    }

    #[test]
    fn deltas_accumulate_onto_current_message() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[
                r#"{"type":"content_block_delta","delta":{"text":"Hel"}}"#,
                r#"{"type":"content_block_delta","delta":{"text":"lo"}}"#,
            ],
        );
        assert_eq!(acc.finalize(true, "").text, "Hello");
    }

    #[test]
    fn assistant_text_survives_nonzero_exit() {
        // A crash after useful output must not throw that output away.
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[r#"{"type":"assistant","message":{"content":[{"type":"text","text":"partial reply"}]}}"#],
        );
        let result = acc.finalize(false, "process killed");
        assert_eq!(result.text, "partial reply");
    }

    #[test]
    fn stderr_surfaces_only_on_failed_empty_turn() {
        let acc = TurnAccumulator::new();
        let result = acc.finalize(false, "fatal: no credentials\n");
        assert_eq!(result.text, "fatal: no credentials");
    }

    #[test]
    fn empty_successful_turn_gets_fallback_text() {
        let acc = TurnAccumulator::new();
        assert_eq!(acc.finalize(true, "").text, FALLBACK_FAILURE_TEXT);
    }

    #[test]
    fn first_session_id_wins() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[
                r#"{"type":"system","subtype":"init","session_id":"s-first"}"#,
                r#"{"type":"result","result":"ok","session_id":"s-second"}"#,
            ],
        );
        assert_eq!(acc.finalize(true, "").session_id.as_deref(), Some("s-first"));
    }

    #[test]
    fn malformed_json_is_dropped_but_plain_text_is_kept() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[
                r#"{"type":"assistant","mess"#,
                "plain text line",
            ],
        );
        assert_eq!(acc.finalize(true, "").text, "plain text line");
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn unknown_event_only_contributes_session_id() {
        let mut acc = TurnAccumulator::new();
        feed_lines(&mut acc, &[r#"{"type":"tool_use","session_id":"s-9"}"#]);
        assert!(!acc.has_text());
        let result = acc.finalize(true, "");
        assert_eq!(result.session_id.as_deref(), Some("s-9"));
        assert_eq!(result.text, FALLBACK_FAILURE_TEXT);
    }

    #[test]
    fn multiple_text_blocks_are_joined() {
        let mut acc = TurnAccumulator::new();
        feed_lines(
            &mut acc,
            &[r#"{"type":"assistant","message":{"content":[{"type":"text","text":"a"},{"type":"tool_use","name":"x"},{"type":"text","text":"b"}]}}"#],
        );
        assert_eq!(acc.finalize(true, "").text, "ab");
    }
}
