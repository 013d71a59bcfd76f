//! ObinsKit macro codec
//!
//! Keycode table, macro events, and the conversions between the stored
//! `macro_value` integer list and the line-oriented editable document.

pub mod codec;
pub mod error;
pub mod event;
pub mod keycodes;

pub use codec::{
    decode_flat, encode_flat, format_raw_value, parse_document, parse_line, parse_raw_value,
    render_document, render_line, triple_lines, FlatValue, MacroSequence, DOCUMENT_HEADER,
};
pub use error::CodecError;
pub use event::{MacroEvent, MacroEventKind};
pub use keycodes::{keycode_index, KeycodeEntry, KeycodeIndex, NamedKey, ValuedKey, KEYCODE_TABLE};
