use std::path::Path;

use gateway_protocol::EntryKind;

use super::db::PendingEntry;

/// Walks `root` breadth-first-ish (via recursion), skipping hidden entries,
/// and returns every file/directory as a workspace-relative `PendingEntry`.
pub(super) fn full_walk(root: &Path) -> Vec<PendingEntry> {
    let mut entries = Vec::new();
    walk_dir(root, root, 0, &mut entries);
    entries
}

fn walk_dir(root: &Path, dir: &Path, depth: i64, out: &mut Vec<PendingEntry>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    for item in read_dir.flatten() {
        let name = item.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = item.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative_str = relative.to_string_lossy().to_string();
        let Ok(file_type) = item.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            out.push(PendingEntry {
                path: relative_str,
                name,
                kind: EntryKind::Directory,
                size: None,
                mtime: None,
                depth: depth + 1,
            });
            walk_dir(root, &path, depth + 1, out);
        } else if file_type.is_file() {
            let meta = item.metadata().ok();
            let size = meta.as_ref().map(|m| m.len());
            let mtime = meta.as_ref().and_then(|m| m.modified().ok()).map(to_unix_secs);
            out.push(PendingEntry {
                path: relative_str,
                name,
                kind: EntryKind::File,
                size,
                mtime,
                depth: depth + 1,
            });
        }
    }
}

fn to_unix_secs(time: std::time::SystemTime) -> f64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_hidden_entries_and_records_depth() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("sub").join("a.txt"), b"hi").expect("write");
        fs::write(dir.path().join(".hidden"), b"x").expect("write");

        let entries = full_walk(dir.path());
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"sub"));
        assert!(paths.contains(&"sub/a.txt"));
        assert!(!paths.iter().any(|p| p.contains(".hidden")));

        let sub_a = entries.iter().find(|e| e.path == "sub/a.txt").expect("entry");
        assert_eq!(sub_a.depth, 2);
    }
}
