//! ObinsKit keycode table and its two lookup directions.
//!
//! The table was reverse engineered from the ObinsKit Electron app (via the
//! dighelm project). It is kept in authored order because lookups are built
//! first-seen-wins: several legacy ids share a value (e.g. `PrintScreen` at
//! 91 and 3639) and the navigation cluster appears twice under different
//! legacy ids. Entries that were outright duplicates of earlier names
//! (keypad digits, keypad Enter) are left out of the table.
//!
//! Left/right modifier variants carry explicit `Left`/`Right` prefixes since
//! the original labels (`CTRL`, `ALT`, `SHIFT`) did not distinguish them.

use crate::error::CodecError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One authored row of the keycode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeycodeEntry {
    /// Reverse-engineered identifier, kept for traceability only
    pub legacy_id: u32,
    /// Label used in the editable document
    pub name: &'static str,
    /// Code stored in `macro_value` payloads
    pub value: u8,
}

const fn key(legacy_id: u32, name: &'static str, value: u8) -> KeycodeEntry {
    KeycodeEntry {
        legacy_id,
        name,
        value,
    }
}

/// All known ObinsKit keycodes, in authored order
#[rustfmt::skip]
pub const KEYCODE_TABLE: &[KeycodeEntry] = &[
    key(1, "Esc", 41),
    key(2, "1", 30), key(3, "2", 31), key(4, "3", 32), key(5, "4", 33),
    key(6, "5", 34), key(7, "6", 35), key(8, "7", 36), key(9, "8", 37),
    key(10, "9", 38), key(11, "0", 39),
    key(12, "-_", 45), key(13, "=+", 46),
    key(14, "Backspace", 42), key(15, "Tab", 43),
    key(16, "Q", 20), key(17, "W", 26), key(18, "E", 8), key(19, "R", 21),
    key(20, "T", 23), key(21, "Y", 28), key(22, "U", 24), key(23, "I", 12),
    key(24, "O", 18), key(25, "P", 19),
    key(26, "[{", 47), key(27, "]}", 48),
    key(28, "Enter", 40),
    key(29, "LeftCtrl", 224),
    key(30, "A", 4), key(31, "S", 22), key(32, "D", 7), key(33, "F", 9),
    key(34, "G", 10), key(35, "H", 11), key(36, "J", 13), key(37, "K", 14),
    key(38, "L", 15),
    key(39, ";:", 51), key(40, "\"", 52), key(41, "`~", 53),
    key(42, "LeftShift", 225),
    key(43, "\\|", 49),
    key(44, "Z", 29), key(45, "X", 27), key(46, "C", 6), key(47, "V", 25),
    key(48, "B", 5), key(49, "N", 17), key(50, "M", 16),
    key(51, ",<", 54), key(52, ".>", 55), key(53, "/?", 56),
    key(54, "RightShift", 229),
    key(56, "LeftAlt", 226),
    key(57, "Space", 44),
    key(58, "CapsLock", 57),
    key(59, "F1", 58), key(60, "F2", 59), key(61, "F3", 60), key(62, "F4", 61),
    key(63, "F5", 62), key(64, "F6", 63), key(65, "F7", 64), key(66, "F8", 65),
    key(67, "F9", 66), key(68, "F10", 67),
    key(69, "NumLock", 83),
    // Authored as "Scroll Lock"; names must be a single token in the document.
    key(70, "ScrollLock", 71),
    key(74, "-", 86),
    key(78, "+", 87),
    key(83, ".", 99),
    key(87, "F11", 68), key(88, "F12", 69),
    key(91, "PrintScreen", 70),
    key(3613, "RightCtrl", 228),
    key(3639, "PrintScreen", 70),
    key(3640, "RightAlt", 230),
    key(3653, "Pause", 72),
    key(3655, "Home", 74),
    key(3657, "PageUp", 75),
    key(3663, "End", 77),
    key(3665, "PageDown", 78),
    key(3666, "Insert", 73),
    key(3667, "Delete", 76),
    key(3677, "Menu", 101),
    key(57416, "↑", 82), key(57419, "←", 80), key(57421, "→", 79), key(57424, "↓", 81),
    key(61000, "↑", 82),
    key(61001, "PageUp", 75),
    key(61003, "←", 80),
    key(61005, "→", 79),
    key(61007, "End", 77),
    key(61008, "↓", 81),
    key(61009, "PageDown", 78),
    key(61010, "Insert", 73),
    key(61011, "Delete", 76),
    key(60999, "Home", 74),
];

/// Result of a lookup by keycode value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedKey {
    pub name: &'static str,
    pub legacy_id: u32,
}

/// Result of a lookup by key name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuedKey {
    pub value: u8,
    pub legacy_id: u32,
}

/// Value and name lookups derived from one ordered keycode table
#[derive(Debug, Clone, Default)]
pub struct KeycodeIndex {
    by_value: HashMap<u8, NamedKey>,
    by_name: HashMap<&'static str, ValuedKey>,
}

impl KeycodeIndex {
    /// Build both lookups in a single forward pass. When a value or a name
    /// has already been seen, the later entry is skipped for that lookup.
    pub fn build(entries: &[KeycodeEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            match index.by_value.entry(entry.value) {
                Entry::Occupied(_) => tracing::trace!(
                    "keycode value {} already mapped, skipping legacy id {} ({})",
                    entry.value,
                    entry.legacy_id,
                    entry.name
                ),
                Entry::Vacant(slot) => {
                    slot.insert(NamedKey {
                        name: entry.name,
                        legacy_id: entry.legacy_id,
                    });
                }
            }

            index.by_name.entry(entry.name).or_insert(ValuedKey {
                value: entry.value,
                legacy_id: entry.legacy_id,
            });
        }
        index
    }

    /// Look up a keycode value stored in a macro payload
    pub fn lookup_by_value(&self, value: u8) -> Result<NamedKey, CodecError> {
        self.by_value
            .get(&value)
            .copied()
            .ok_or_else(|| CodecError::UnknownKeycode(value.to_string()))
    }

    /// Look up a key name from the editable document (exact, case-sensitive)
    pub fn lookup_by_name(&self, name: &str) -> Result<ValuedKey, CodecError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::UnknownKeycode(name.to_string()))
    }

    /// Number of distinct keycode values
    pub fn value_count(&self) -> usize {
        self.by_value.len()
    }

    /// Number of distinct key names
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }
}

static INDEX: OnceLock<KeycodeIndex> = OnceLock::new();

/// Get the process-wide index over [`KEYCODE_TABLE`]
pub fn keycode_index() -> &'static KeycodeIndex {
    INDEX.get_or_init(|| KeycodeIndex::build(KEYCODE_TABLE))
}
