use std::path::Path;

use gateway_protocol::EntryKind;
use gateway_protocol::TreeEntry;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::error::Result;

pub(super) fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS files (
            path TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            size INTEGER,
            mtime REAL,
            depth INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_depth ON files(depth);
        CREATE INDEX IF NOT EXISTS idx_type ON files(type);",
    )?;
    Ok(conn)
}

pub(super) struct PendingEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub mtime: Option<f64>,
    pub depth: i64,
}

/// Replaces the entire index contents with `entries`.
pub(super) fn replace_all(conn: &mut Connection, entries: &[PendingEntry]) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM files", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO files (path, name, type, size, mtime, depth) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.path,
                entry.name,
                kind_str(entry.kind),
                entry.size.map(|s| s as i64),
                entry.mtime,
                entry.depth,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Upserts a single path's metadata (used by the debounced watcher flush).
pub(super) fn upsert(conn: &Connection, entry: &PendingEntry) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO files (path, name, type, size, mtime, depth) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.path,
            entry.name,
            kind_str(entry.kind),
            entry.size.map(|s| s as i64),
            entry.mtime,
            entry.depth,
        ],
    )?;
    Ok(())
}

/// Deletes a path and everything indexed beneath it.
pub(super) fn delete_subtree(conn: &Connection, relative_path: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM files WHERE path = ?1 OR path LIKE ?2",
        params![relative_path, format!("{relative_path}/%")],
    )?;
    Ok(())
}

fn kind_str(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Directory => "dir",
    }
}

fn kind_from_str(s: &str) -> EntryKind {
    if s == "dir" { EntryKind::Directory } else { EntryKind::File }
}

pub(super) struct StructureCounts {
    pub total_files: i64,
    pub total_dirs: i64,
}

pub(super) fn query_structure(
    conn: &Connection,
    base_path: &str,
    max_depth: i64,
    include_hidden: bool,
    pattern: Option<&str>,
) -> Result<(Vec<TreeEntry>, StructureCounts)> {
    let mut stmt;
    let rows: Vec<(String, String, String, Option<i64>, i64)> = if base_path.is_empty() {
        stmt = conn.prepare(
            "SELECT path, name, type, size, depth FROM files WHERE depth <= ?1 ORDER BY type DESC, path",
        )?;
        stmt.query_map(params![max_depth], row_to_tuple)?
            .collect::<rusqlite::Result<_>>()?
    } else {
        stmt = conn.prepare(
            "SELECT path, name, type, size, depth FROM files WHERE (path = ?1 OR path LIKE ?2) AND depth <= ?3 ORDER BY type DESC, path",
        )?;
        let like = format!("{base_path}/%");
        stmt.query_map(params![base_path, like, max_depth], row_to_tuple)?
            .collect::<rusqlite::Result<_>>()?
    };

    let wild = pattern.map(wildmatch::WildMatch::new);
    let entries = rows
        .into_iter()
        .filter(|(_, name, ..)| include_hidden || !name.starts_with('.'))
        .filter(|(_, name, ..)| wild.as_ref().map(|w| w.matches(name)).unwrap_or(true))
        .map(|(path, name, kind, size, depth)| TreeEntry {
            path,
            name,
            kind: kind_from_str(&kind),
            size: size.map(|s| s as u64),
            mtime: 0.0,
            depth,
        })
        .collect();

    let total_files: i64 = conn
        .query_row("SELECT COUNT(*) FROM files WHERE type='file'", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);
    let total_dirs: i64 = conn
        .query_row("SELECT COUNT(*) FROM files WHERE type='dir'", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    Ok((entries, StructureCounts { total_files, total_dirs }))
}

fn row_to_tuple(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String, Option<i64>, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}
