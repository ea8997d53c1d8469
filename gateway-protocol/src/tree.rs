use serde::Deserialize;
use serde::Serialize;

/// Whether a tree entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// One row of the indexed filesystem tree, workspace-root-relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    #[serde(default)]
    pub size: Option<u64>,
    pub mtime: f64,
    pub depth: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_sort_before_files_when_equal_depth() {
        let dir = EntryKind::Directory;
        let file = EntryKind::File;
        assert!(dir < file);
    }
}

impl PartialOrd for EntryKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntryKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(k: &EntryKind) -> u8 {
            match k {
                EntryKind::Directory => 0,
                EntryKind::File => 1,
            }
        }
        rank(self).cmp(&rank(other))
    }
}
