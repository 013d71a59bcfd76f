//! Before/after diff of two `macro_value`s, one event triple per line.

use obinskit_macro::triple_lines;
use similar::{ChangeTag, TextDiff};

/// Whether a diff line was removed from the old value or added in the new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChangeKind {
    Removed,
    Inserted,
}

/// One changed triple line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    pub kind: LineChangeKind,
    /// 0-based event index in the old value (removals)
    pub old_index: Option<usize>,
    /// 0-based event index in the new value (insertions)
    pub new_index: Option<usize>,
    /// Triple rendering, e.g. `(3, 10, 0)`
    pub line: String,
}

/// Diff of two flat macro values
#[derive(Debug, Clone)]
pub struct MacroDiff {
    changes: Vec<LineChange>,
    unified: String,
}

impl MacroDiff {
    pub fn between(old: &[u32], new: &[u32]) -> Self {
        let old_text = to_text(&triple_lines(old));
        let new_text = to_text(&triple_lines(new));
        let diff = TextDiff::from_lines(&old_text, &new_text);

        let changes = diff
            .iter_all_changes()
            .filter_map(|change| {
                let kind = match change.tag() {
                    ChangeTag::Delete => LineChangeKind::Removed,
                    ChangeTag::Insert => LineChangeKind::Inserted,
                    ChangeTag::Equal => return None,
                };
                Some(LineChange {
                    kind,
                    old_index: change.old_index(),
                    new_index: change.new_index(),
                    line: change.value().trim_end().to_string(),
                })
            })
            .collect();

        let unified = diff
            .unified_diff()
            .context_radius(3)
            .header("old macro_value", "new macro_value")
            .to_string();

        Self { changes, unified }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[LineChange] {
        &self.changes
    }

    /// Unified diff text (empty when nothing changed)
    pub fn unified(&self) -> &str {
        &self.unified
    }
}

fn to_text(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}
