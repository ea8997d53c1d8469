use std::path::Path;
use std::path::PathBuf;

use wildmatch::WildMatch;

use crate::error::GatewayError;
use crate::error::Result;

/// Confines filesystem access to a workspace root: resolves `..`/symlinks and
/// rejects anything that escapes the root or matches a blocked glob.
pub struct PathValidator {
    workspace_root: PathBuf,
    blocked_patterns: Vec<String>,
}

impl PathValidator {
    pub fn new(workspace_root: impl Into<PathBuf>, blocked_patterns: Vec<String>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            blocked_patterns,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Resolves `path` to an absolute path inside the workspace root,
    /// rejecting traversal, symlink escapes, and blocklist matches.
    pub fn validate(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() || path == "." || path == "./" || path == "/" {
            return Ok(self.workspace_root.clone());
        }

        let clean = path.trim_start_matches('/');
        let target = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.workspace_root.join(clean)
        };

        let resolved = resolve_non_strict(&target).map_err(|source| GatewayError::PathUnresolvable {
            path: path.to_string(),
            source,
        })?;

        let relative = resolved
            .strip_prefix(&self.workspace_root)
            .map_err(|_| GatewayError::PathEscapesWorkspace {
                path: path.to_string(),
                resolved: resolved.clone(),
            })?;

        let relative_str = relative.to_string_lossy();
        let basename = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        for pattern in &self.blocked_patterns {
            let matcher = WildMatch::new(pattern);
            if matcher.matches(&relative_str) || matcher.matches(&basename) {
                return Err(GatewayError::BlockedByPattern {
                    pattern: pattern.clone(),
                });
            }
        }

        Ok(resolved)
    }

    /// Like [`Self::validate`], plus checks the parent directory exists and
    /// is writable.
    pub fn validate_for_write(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.validate(path)?;
        let parent = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.workspace_root.clone());

        if !parent.exists() {
            return Err(GatewayError::ParentMissing { parent });
        }

        if !is_writable(&parent) {
            return Err(GatewayError::ParentNotWritable { parent });
        }

        Ok(resolved)
    }

    /// Samples the first 8KiB of `path` and flags it binary on a NUL byte or
    /// a >30% ratio of non-text bytes.
    pub fn is_binary(&self, path: &Path) -> bool {
        let Ok(bytes) = std::fs::read(path) else {
            return false;
        };
        let sample = &bytes[..bytes.len().min(8192)];
        if sample.contains(&0) {
            return true;
        }
        if sample.is_empty() {
            return false;
        }
        let non_text = sample.iter().filter(|&&b| !is_text_byte(b)).count();
        (non_text as f64 / sample.len() as f64) > 0.3
    }
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, 7 | 8 | 9 | 10 | 12 | 13 | 27) || b >= 0x20
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o200 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

/// Resolves `path` the way Python's `Path.resolve(strict=False)` does:
/// collapses `.`/`..` lexically, then canonicalizes the longest existing
/// ancestor and re-appends whatever doesn't exist yet. This lets
/// `validate`/`validate_for_write` accept a path whose final component (or
/// several components) don't exist yet, which `create_if_missing` writes
/// need.
fn resolve_non_strict(path: &Path) -> std::io::Result<PathBuf> {
    let normalized = lexically_normalize(path);

    let mut existing = normalized.clone();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    while !existing.exists() {
        let Some(name) = existing.file_name() else { break };
        remainder.push(name.to_os_string());
        let Some(parent) = existing.parent() else { break };
        existing = parent.to_path_buf();
    }

    let mut resolved = std::fs::canonicalize(&existing)?;
    for part in remainder.into_iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
