use std::path::Path;
use std::path::PathBuf;

use gateway_protocol::EditAction;
use gateway_protocol::EditOperation;
use similar::ChangeTag;
use similar::TextDiff;

use crate::error::GatewayError;
use crate::error::Result;
use crate::path_validator::PathValidator;

pub struct ReadOutcome {
    pub content: String,
    pub is_binary: bool,
    pub truncated: bool,
    pub total_lines: usize,
}

pub struct EditOutcome {
    pub diff: String,
    pub new_line_count: usize,
    pub edits_applied: usize,
}

const BINARY_SENTINEL: &str = "[Binary file - content not displayed]";
const MAX_DIFF_LINES: usize = 50;

/// Reads `path` (already validated) and slices it to the requested,
/// clamped line range, matching spec.md §4.4's read contract.
pub fn read_file(
    validator: &PathValidator,
    resolved: &Path,
    line_start: Option<usize>,
    line_end: Option<usize>,
    max_file_size_bytes: u64,
    max_output_lines: usize,
) -> Result<ReadOutcome> {
    let metadata = std::fs::metadata(resolved)?;
    if metadata.len() > max_file_size_bytes {
        return Err(GatewayError::FileTooLarge {
            size: metadata.len(),
            limit: max_file_size_bytes,
        });
    }

    if validator.is_binary(resolved) {
        return Ok(ReadOutcome {
            content: BINARY_SENTINEL.to_string(),
            is_binary: true,
            truncated: false,
            total_lines: 0,
        });
    }

    let raw = std::fs::read(resolved)?;
    let text = String::from_utf8_lossy(&raw);
    let lines = split_keepends(&text);
    let total_lines = lines.len();

    let start = line_start.unwrap_or(1).saturating_sub(1).min(total_lines);
    let end = line_end.unwrap_or(total_lines).max(start).min(total_lines);

    let mut selected = lines[start..end].to_vec();
    let truncated = selected.len() >= max_output_lines;
    if truncated {
        selected.truncate(max_output_lines);
    }

    Ok(ReadOutcome {
        content: selected.concat(),
        is_binary: false,
        truncated,
        total_lines,
    })
}

/// Applies `edits` atomically to `resolved` (already validated for write),
/// writing the new content only after every edit has been computed and the
/// diff preview generated.
pub fn edit_file(
    resolved: &Path,
    display_path: &str,
    edits: &[EditOperation],
    create_if_missing: bool,
) -> Result<EditOutcome> {
    if edits.is_empty() {
        return Err(GatewayError::InvalidEdit {
            reason: "no edits provided".to_string(),
        });
    }

    let original_lines = if resolved.exists() {
        if resolved.is_dir() {
            return Err(GatewayError::InvalidEdit {
                reason: "path is a directory".to_string(),
            });
        }
        let raw = std::fs::read(resolved)?;
        split_keepends(&String::from_utf8_lossy(&raw))
    } else if create_if_missing {
        Vec::new()
    } else {
        return Err(GatewayError::InvalidEdit {
            reason: format!("file not found: {}", resolved.display()),
        });
    };

    let mut new_lines = original_lines.clone();
    let mut sorted_edits: Vec<&EditOperation> = edits.iter().collect();
    sorted_edits.sort_by(|a, b| b.line_start.cmp(&a.line_start));

    for edit in sorted_edits {
        let idx = edit.line_start.saturating_sub(1).min(new_lines.len());
        match edit.action {
            EditAction::Delete => {
                let end_idx = edit.line_end.unwrap_or(edit.line_start).min(new_lines.len());
                if idx < end_idx {
                    new_lines.drain(idx..end_idx);
                }
            }
            EditAction::Replace => {
                let end_idx = edit.line_end.unwrap_or(edit.line_start).min(new_lines.len());
                let content_lines = split_keepends_with_trailing_newline(
                    edit.content.as_deref().unwrap_or(""),
                );
                let splice_end = end_idx.max(idx);
                new_lines.splice(idx..splice_end, content_lines);
            }
            EditAction::Insert => {
                let content_lines = split_keepends_with_trailing_newline(
                    edit.content.as_deref().unwrap_or(""),
                );
                new_lines.splice(idx..idx, content_lines);
            }
        }
    }

    let diff = build_diff(&original_lines, &new_lines, display_path);
    let new_content: String = new_lines.concat();
    write_atomic(resolved, new_content.as_bytes())?;

    Ok(EditOutcome {
        diff,
        new_line_count: new_lines.len(),
        edits_applied: edits.len(),
    })
}

fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile_in(dir, target)?;
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, target)?;
    Ok(())
}

fn tempfile_in(dir: &Path, target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tmp".to_string());
    Ok(dir.join(format!(".{name}.gateway-tmp")))
}

fn build_diff(original: &[String], updated: &[String], display_path: &str) -> String {
    let original_text = original.concat();
    let updated_text = updated.concat();
    let diff = TextDiff::from_lines(&original_text, &updated_text);

    let mut lines = Vec::new();
    lines.push(format!("--- a/{display_path}"));
    lines.push(format!("+++ b/{display_path}"));
    for change in diff.iter_all_changes() {
        let prefix = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        lines.push(format!("{prefix}{}", change.value().trim_end_matches('\n')));
    }
    lines.truncate(MAX_DIFF_LINES);
    lines.join("\n")
}

/// Splits text the way Python's `str.splitlines(keepends=True)` does for the
/// `\n`-only case: every line keeps its trailing newline except a possible
/// final partial line.
fn split_keepends(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch == '\n' {
            lines.push(text[start..=i].to_string());
            start = i + 1;
        }
    }
    if start < text.len() {
        lines.push(text[start..].to_string());
    }
    lines
}

fn split_keepends_with_trailing_newline(content: &str) -> Vec<String> {
    let mut lines = split_keepends(content);
    if let Some(last) = lines.last_mut() {
        if !last.ends_with('\n') {
            last.push('\n');
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_protocol::EditOperation;

    fn validator(root: &Path) -> PathValidator {
        PathValidator::new(root.to_path_buf(), Vec::new())
    }

    #[test]
    fn read_applies_clamped_line_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\nthree\nfour\n").expect("write");
        let v = validator(dir.path());
        let outcome = read_file(&v, &path, Some(2), Some(3), 10_000_000, 10_000).expect("read");
        assert_eq!(outcome.content, "two\nthree\n");
        assert_eq!(outcome.total_lines, 4);
        assert!(!outcome.is_binary);
    }

    #[test]
    fn read_flags_binary_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.bin");
        std::fs::write(&path, [0u8, 1, 2]).expect("write");
        let v = validator(dir.path());
        let outcome = read_file(&v, &path, None, None, 10_000_000, 10_000).expect("read");
        assert!(outcome.is_binary);
        assert_eq!(outcome.content, BINARY_SENTINEL);
    }

    #[test]
    fn edit_replace_applies_in_descending_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").expect("write");

        let edits = vec![
            EditOperation {
                action: EditAction::Replace,
                line_start: 2,
                line_end: Some(2),
                content: Some("TWO".to_string()),
            },
            EditOperation {
                action: EditAction::Insert,
                line_start: 1,
                line_end: None,
                content: Some("ZERO\n".to_string()),
            },
        ];

        let outcome = edit_file(&path, "a.txt", &edits, false).expect("edit");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "ZERO\none\nTWO\nthree\n");
        assert_eq!(outcome.edits_applied, 2);
        assert!(outcome.diff.contains("-two"));
        assert!(outcome.diff.contains("+TWO"));
    }

    #[test]
    fn edit_delete_removes_line_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").expect("write");

        let edits = vec![EditOperation {
            action: EditAction::Delete,
            line_start: 2,
            line_end: Some(2),
            content: None,
        }];

        edit_file(&path, "a.txt", &edits, false).expect("edit");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "one\nthree\n");
    }

    #[test]
    fn edit_creates_missing_file_when_allowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("new.txt");

        let edits = vec![EditOperation {
            action: EditAction::Insert,
            line_start: 1,
            line_end: None,
            content: Some("hello\n".to_string()),
        }];

        edit_file(&path, "new.txt", &edits, true).expect("edit");
        assert_eq!(std::fs::read_to_string(&path).expect("read back"), "hello\n");
    }
}
