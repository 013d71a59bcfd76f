//! Macro events and their 3-integer encoding.
//!
//! Each ObinsKit macro event is three integers. The first is the event tag
//! (1=key up, 2=key down, 3=wait). For key events the second is a keycode
//! and the third is always 0. For waits the duration in milliseconds is
//! `second + third * 256`.

use crate::error::CodecError;
use crate::keycodes::KeycodeIndex;
use std::fmt;

/// Event kind, with its tag in the flat encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroEventKind {
    KeyUp,
    KeyDown,
    Wait,
}

impl MacroEventKind {
    /// All kinds in tag order
    pub const ALL: &'static [MacroEventKind] = &[
        MacroEventKind::KeyUp,
        MacroEventKind::KeyDown,
        MacroEventKind::Wait,
    ];

    /// Tag stored as the first integer of each event
    pub fn tag(self) -> u32 {
        match self {
            MacroEventKind::KeyUp => 1,
            MacroEventKind::KeyDown => 2,
            MacroEventKind::Wait => 3,
        }
    }

    /// Resolve a stored tag
    pub fn from_tag(tag: u32) -> Result<Self, CodecError> {
        match tag {
            1 => Ok(MacroEventKind::KeyUp),
            2 => Ok(MacroEventKind::KeyDown),
            3 => Ok(MacroEventKind::Wait),
            other => Err(CodecError::UnknownEventKind(other.to_string())),
        }
    }

    /// Name used in the editable document
    pub fn name(self) -> &'static str {
        match self {
            MacroEventKind::KeyUp => "KEY_UP",
            MacroEventKind::KeyDown => "KEY_DOWN",
            MacroEventKind::Wait => "WAIT",
        }
    }

    /// Resolve a document kind name, ignoring ASCII case
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CodecError::UnknownEventKind(name.to_string()))
    }
}

impl fmt::Display for MacroEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Honour width so callers can pad kinds into a column
        f.pad(self.name())
    }
}

/// A single macro event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroEvent {
    /// Release the key with this keycode value
    KeyUp(u8),
    /// Press the key with this keycode value
    KeyDown(u8),
    /// Pause for this many milliseconds
    Wait(u16),
}

impl MacroEvent {
    pub fn kind(&self) -> MacroEventKind {
        match self {
            MacroEvent::KeyUp(_) => MacroEventKind::KeyUp,
            MacroEvent::KeyDown(_) => MacroEventKind::KeyDown,
            MacroEvent::Wait(_) => MacroEventKind::Wait,
        }
    }

    /// Build an event from its kind and the two payload fields.
    ///
    /// Key events must have a zero third field; anything else could not be
    /// reproduced from the document form.
    pub fn from_fields(kind: MacroEventKind, field2: u8, field3: u8) -> Result<Self, CodecError> {
        match kind {
            MacroEventKind::KeyUp | MacroEventKind::KeyDown if field3 != 0 => {
                Err(CodecError::MalformedMacro(format!(
                    "{} event has non-zero third field {field3}",
                    kind.name()
                )))
            }
            MacroEventKind::KeyUp => Ok(MacroEvent::KeyUp(field2)),
            MacroEventKind::KeyDown => Ok(MacroEvent::KeyDown(field2)),
            MacroEventKind::Wait => Ok(MacroEvent::Wait(u16::from_le_bytes([field2, field3]))),
        }
    }

    /// The two payload fields (`field2`, `field3`)
    pub fn fields(&self) -> (u8, u8) {
        match *self {
            MacroEvent::KeyUp(code) | MacroEvent::KeyDown(code) => (code, 0),
            MacroEvent::Wait(ms) => {
                let [lo, hi] = ms.to_le_bytes();
                (lo, hi)
            }
        }
    }

    /// Decode one `[tag, field2, field3]` triple
    pub fn from_triple(triple: [u32; 3]) -> Result<Self, CodecError> {
        let [tag, field2, field3] = triple;
        let kind = MacroEventKind::from_tag(tag)?;
        let narrow = |v: u32| {
            u8::try_from(v).map_err(|_| {
                CodecError::MalformedMacro(format!(
                    "{} event field {v} exceeds 255",
                    kind.name()
                ))
            })
        };
        Self::from_fields(kind, narrow(field2)?, narrow(field3)?)
    }

    /// Encode as `[tag, field2, field3]`
    pub fn to_triple(&self) -> [u32; 3] {
        let (field2, field3) = self.fields();
        [self.kind().tag(), u32::from(field2), u32::from(field3)]
    }

    /// Detailed form for debug logs, e.g.
    /// `KEY_DOWN [2, 13, 0] keycode=J (legacy id 36)`.
    pub fn describe(&self, index: &KeycodeIndex) -> String {
        let [tag, field2, field3] = self.to_triple();
        let detail = match *self {
            MacroEvent::KeyUp(code) | MacroEvent::KeyDown(code) => {
                match index.lookup_by_value(code) {
                    Ok(key) => format!("keycode={} (legacy id {})", key.name, key.legacy_id),
                    Err(_) => format!("keycode=? ({code})"),
                }
            }
            MacroEvent::Wait(ms) => format!("wait={ms}ms"),
        };
        format!("{:8} [{tag}, {field2}, {field3}] {detail}", self.kind())
    }
}
