mod db;
mod walk;
mod watcher;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gateway_protocol::EntryKind;
use gateway_protocol::TreeEntry;
use notify_debouncer_mini::Debouncer;
use notify_debouncer_mini::notify::RecommendedWatcher;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;
use tracing::warn;

use crate::error::Result;

pub struct StructureResult {
    pub root: PathBuf,
    pub entries: Vec<TreeEntry>,
    pub total_files: i64,
    pub total_dirs: i64,
}

/// Indexes the workspace filesystem tree into SQLite and keeps it current
/// with a debounced `notify` watcher, so directory listings never have to
/// walk the filesystem on the request path.
pub struct TreeIndexer {
    workspace_root: PathBuf,
    conn: Arc<Mutex<Connection>>,
    debounce: Duration,
    watch_handle: Mutex<Option<(Debouncer<RecommendedWatcher>, tokio::task::JoinHandle<()>)>>,
}

impl TreeIndexer {
    pub fn new(workspace_root: impl Into<PathBuf>, db_path: &Path, debounce_ms: u64) -> Result<Self> {
        let conn = db::open(db_path)?;
        Ok(Self {
            workspace_root: workspace_root.into(),
            conn: Arc::new(Mutex::new(conn)),
            debounce: Duration::from_millis(debounce_ms),
            watch_handle: Mutex::new(None),
        })
    }

    /// Performs an initial full reindex and starts the background watcher.
    pub async fn start(&self) -> Result<usize> {
        let indexed = self.refresh().await?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
        let debouncer = watcher::watch(&self.workspace_root, self.debounce, tx).map_err(|err| {
            crate::error::GatewayError::Io {
                source: std::io::Error::other(err.to_string()),
            }
        })?;

        let conn = Arc::clone(&self.conn);
        let root = self.workspace_root.clone();
        let handle = tokio::spawn(async move {
            while let Some(paths) = rx.recv().await {
                let mut guard = conn.lock().await;
                for path in paths {
                    if let Err(err) = flush_one(&mut guard, &root, &path) {
                        warn!("tree index update failed for {}: {err}", path.display());
                    }
                }
            }
        });

        *self.watch_handle.lock().await = Some((debouncer, handle));
        info!("tree indexer started, {indexed} entries");
        Ok(indexed)
    }

    /// Stops the background watcher, if running.
    pub async fn stop(&self) {
        if let Some((debouncer, handle)) = self.watch_handle.lock().await.take() {
            drop(debouncer);
            handle.abort();
        }
    }

    /// Clears and rebuilds the entire index from the filesystem.
    pub async fn refresh(&self) -> Result<usize> {
        let entries = walk::full_walk(&self.workspace_root);
        let count = entries.len();
        let mut conn = self.conn.lock().await;
        db::replace_all(&mut conn, &entries)?;
        Ok(count)
    }

    pub async fn get_structure(
        &self,
        path: &str,
        depth: u32,
        include_hidden: bool,
        pattern: Option<&str>,
    ) -> Result<StructureResult> {
        let depth = depth.clamp(1, 5) as i64;
        let base_path = path.trim_matches('/');
        let base_depth = if base_path.is_empty() {
            0
        } else {
            base_path.split('/').count() as i64
        };
        let max_depth = base_depth + depth;

        let conn = self.conn.lock().await;
        let (entries, counts) =
            db::query_structure(&conn, base_path, max_depth, include_hidden, pattern)?;

        let root = if base_path.is_empty() {
            self.workspace_root.clone()
        } else {
            self.workspace_root.join(base_path)
        };

        Ok(StructureResult {
            root,
            entries,
            total_files: counts.total_files,
            total_dirs: counts.total_dirs,
        })
    }
}

fn flush_one(conn: &mut Connection, root: &Path, path: &Path) -> Result<()> {
    let Ok(relative) = path.strip_prefix(root) else {
        return Ok(());
    };
    let relative_str = relative.to_string_lossy().to_string();
    if relative_str.is_empty() {
        return Ok(());
    }

    if path.exists() {
        let meta = std::fs::symlink_metadata(path)?;
        let kind = if meta.is_dir() { EntryKind::Directory } else { EntryKind::File };
        let size = if meta.is_file() { Some(meta.len()) } else { None };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let depth = relative.components().count() as i64;
        db::upsert(
            conn,
            &db::PendingEntry {
                path: relative_str,
                name,
                kind,
                size,
                mtime: None,
                depth,
            },
        )?;
    } else {
        db::delete_subtree(conn, &relative_str)?;
    }
    Ok(())
}
