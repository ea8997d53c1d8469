use serde::Deserialize;
use serde::Serialize;

/// The kind of change a single `EditOperation` applies to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Replace,
    Insert,
    Delete,
}

/// A single line-range edit. `line_start`/`line_end` are 1-based and
/// inclusive, matching the wire contract in spec.md §4.4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOperation {
    pub action: EditAction,
    pub line_start: usize,
    #[serde(default)]
    pub line_end: Option<usize>,
    #[serde(default)]
    pub content: Option<String>,
}
