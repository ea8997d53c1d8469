use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use notify_debouncer_mini::DebounceEventResult;
use notify_debouncer_mini::Debouncer;
use notify_debouncer_mini::new_debouncer;
use notify_debouncer_mini::notify::RecommendedWatcher;
use notify_debouncer_mini::notify::RecursiveMode;
use tokio::sync::mpsc;

/// Starts watching `root` recursively, forwarding coalesced-changed paths on
/// `tx` after `debounce`. The returned `Debouncer` must be kept alive for the
/// watch to remain active.
pub(super) fn watch(
    root: &Path,
    debounce: Duration,
    tx: mpsc::UnboundedSender<Vec<PathBuf>>,
) -> notify_debouncer_mini::notify::Result<Debouncer<RecommendedWatcher>> {
    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        if let Ok(events) = result {
            let paths: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
            let _ = tx.send(paths);
        }
    })?;
    debouncer
        .watcher()
        .watch(root, RecursiveMode::Recursive)?;
    Ok(debouncer)
}
