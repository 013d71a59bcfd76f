//! Conversions between the stored `macro_value`, event sequences and the
//! human-editable document.
//!
//! ```text
//! "[2,13,0,3,10,0,1,13,0]"  <->  [2,13,0,3,10,0,1,13,0]  <->  KEY_DOWN J
//!                                                             WAIT     10
//!                                                             KEY_UP   J
//! ```

use crate::error::CodecError;
use crate::event::{MacroEvent, MacroEventKind};
use crate::keycodes::KeycodeIndex;
use std::fmt::Write as _;

/// Flat integer list as stored in the `macro_value` column
pub type FlatValue = Vec<u32>;

/// Ordered macro events
pub type MacroSequence = Vec<MacroEvent>;

/// Comment marker for document lines
pub const COMMENT_MARKER: char = '#';

/// Instructions written above the events in the editable document
pub const DOCUMENT_HEADER: &str = "\
# INSTRUCTIONS FOR EDITING THIS OBINSKIT MACRO
#
# Change existing event values, or add new events, noting:
#   1. One event per line
#   2. Each event has 2 tokens separated by whitespace:
#      1. One of:
#         1. KEY_DOWN
#         2. KEY_UP
#         3. WAIT
#      2. Either a keycode for a KEY_* event, or a time in msec for a WAIT event.
#   3. Lines beginning with # are ignored (treated as comments).
# Example: Press J for 10msec before letting go.
#   KEY_DOWN J
#   WAIT     10
#   KEY_UP   J
";

/// Width the kind name is padded to in rendered lines
const KIND_WIDTH: usize = 8;

/// Largest wait expressible in two payload bytes
pub const MAX_WAIT_MS: u64 = u16::MAX as u64;

/// Decode a flat value into events, one per consecutive triple
pub fn decode_flat(ints: &[u32]) -> Result<MacroSequence, CodecError> {
    if ints.len() % 3 != 0 {
        return Err(CodecError::MalformedMacro(format!(
            "length {} is not a multiple of 3",
            ints.len()
        )));
    }

    ints.chunks_exact(3)
        .enumerate()
        .map(|(i, triple)| {
            MacroEvent::from_triple([triple[0], triple[1], triple[2]]).map_err(|e| match e {
                CodecError::MalformedMacro(msg) => {
                    CodecError::MalformedMacro(format!("event {i}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Encode events as `[tag, field2, field3]` triples, concatenated
pub fn encode_flat(seq: &[MacroEvent]) -> FlatValue {
    seq.iter().flat_map(MacroEvent::to_triple).collect()
}

/// Render one event as a document line (without line break)
pub fn render_line(event: &MacroEvent, index: &KeycodeIndex) -> Result<String, CodecError> {
    let kind = event.kind();
    match *event {
        MacroEvent::KeyUp(code) | MacroEvent::KeyDown(code) => {
            let key = index.lookup_by_value(code)?;
            Ok(format!("{kind:KIND_WIDTH$} {}", key.name))
        }
        MacroEvent::Wait(ms) => Ok(format!("{kind:KIND_WIDTH$} {ms}")),
    }
}

/// Parse one document line into an event
pub fn parse_line(line: &str, index: &KeycodeIndex) -> Result<MacroEvent, CodecError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [kind, arg] = tokens[..] else {
        return Err(CodecError::MalformedLine {
            line: line.trim().to_string(),
            tokens: tokens.len(),
        });
    };

    match MacroEventKind::from_name(kind)? {
        MacroEventKind::KeyUp => Ok(MacroEvent::KeyUp(index.lookup_by_name(arg)?.value)),
        MacroEventKind::KeyDown => Ok(MacroEvent::KeyDown(index.lookup_by_name(arg)?.value)),
        MacroEventKind::Wait => parse_duration(arg).map(MacroEvent::Wait),
    }
}

/// Parse a WAIT argument in milliseconds
fn parse_duration(s: &str) -> Result<u16, CodecError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidDuration(s.to_string()));
    }
    // All digits: anything that fails to fit is out of range, not malformed
    s.parse::<u16>()
        .map_err(|_| CodecError::DurationOutOfRange(s.to_string()))
}

/// Render the full editable document: header, then one line per event
pub fn render_document(seq: &[MacroEvent], index: &KeycodeIndex) -> Result<String, CodecError> {
    let mut doc = String::from(DOCUMENT_HEADER);
    for event in seq {
        let line = render_line(event, index)?;
        // Writing to a String cannot fail
        let _ = writeln!(doc, "{line}");
    }
    Ok(doc)
}

/// Parse an edited document. Blank lines and `#` comments are skipped;
/// errors carry the 1-based line number.
pub fn parse_document(text: &str, index: &KeycodeIndex) -> Result<MacroSequence, CodecError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !is_ignored(line))
        .map(|(i, line)| {
            parse_line(line, index).map_err(|e| CodecError::AtLine {
                line: i + 1,
                source: Box::new(e),
            })
        })
        .collect()
}

fn is_ignored(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER)
}

/// Parse the stored textual form, e.g. `[2,13,0]` or `[]`
pub fn parse_raw_value(text: &str) -> Result<FlatValue, CodecError> {
    let invalid = || CodecError::InvalidRawValue(text.to_string());
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(invalid)?
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| item.trim().parse::<u32>().map_err(|_| invalid()))
        .collect()
}

/// Format a flat value in its stored textual form
pub fn format_raw_value(flat: &[u32]) -> String {
    let items: Vec<String> = flat.iter().map(u32::to_string).collect();
    format!("[{}]", items.join(","))
}

/// One line per event triple, e.g. `(3, 10, 0)`, for diffing
pub fn triple_lines(flat: &[u32]) -> Vec<String> {
    flat.chunks(3)
        .map(|chunk| {
            let items: Vec<String> = chunk.iter().map(u32::to_string).collect();
            format!("({})", items.join(", "))
        })
        .collect()
}
