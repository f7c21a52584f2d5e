//! Line-oriented parser for event-stream frames embedded in a response body.
//!
//! The image provider answers a plain POST with a body shaped like an SSE
//! stream (`data: {...}` lines). This parser works on the complete body
//! text and is independent of the HTTP transport.

use serde_json::{Map, Value};

/// Prefix marking an event-stream data line.
pub const DATA_PREFIX: &str = "data:";

/// One JSON object recovered from one `data:` line.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFrame {
    /// 1-based line number within the body.
    pub line_number: usize,
    pub data: Map<String, Value>,
}

/// A `data:` line whose payload was not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub payload: String,
    pub reason: String,
}

/// Result of parsing a body: frames in sequence order plus skipped lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFrames {
    pub frames: Vec<EventFrame>,
    pub skipped: Vec<SkippedLine>,
}

impl ParsedFrames {
    /// The last parseable frame, which carries the final result.
    ///
    /// Selection is positional, never based on the frame's contents.
    pub fn final_frame(&self) -> Option<&EventFrame> {
        self.frames.last()
    }
}

/// Parse every `data:` line of `body` as an independent JSON object.
///
/// Lines whose trimmed form does not start with [`DATA_PREFIX`] are noise
/// and ignored. A data line that fails to parse is recorded in
/// [`ParsedFrames::skipped`] and does not abort the parse.
pub fn parse_event_frames(body: &str) -> ParsedFrames {
    let mut parsed = ParsedFrames::default();

    for (index, line) in body.lines().enumerate() {
        let Some(payload) = line.trim().strip_prefix(DATA_PREFIX) else {
            continue;
        };
        let payload = payload.trim();
        let line_number = index + 1;

        match serde_json::from_str::<Map<String, Value>>(payload) {
            Ok(data) => parsed.frames.push(EventFrame { line_number, data }),
            Err(e) => parsed.skipped.push(SkippedLine {
                line_number,
                payload: payload.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    parsed
}
