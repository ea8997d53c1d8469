use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("path escapes workspace: {path} resolves to {resolved}")]
    PathEscapesWorkspace { path: String, resolved: PathBuf },

    #[error("cannot resolve path {path}: {source}")]
    PathUnresolvable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("access blocked by pattern {pattern}")]
    BlockedByPattern { pattern: String },

    #[error("parent directory does not exist: {parent}")]
    ParentMissing { parent: PathBuf },

    #[error("parent directory not writable: {parent}")]
    ParentNotWritable { parent: PathBuf },

    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("operation is blocked: {reason}")]
    OperationBlocked { reason: String },

    #[error("approval {id} not found")]
    ApprovalNotFound { id: String },

    #[error("approval {id} is already resolved as {status}")]
    ApprovalAlreadyResolved { id: String, status: String },

    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("index database error: {source}")]
    Index {
        #[from]
        source: rusqlite::Error,
    },

    #[error("invalid edit: {reason}")]
    InvalidEdit { reason: String },

    #[error("command timed out after {secs}s")]
    CommandTimedOut { secs: u64 },

    #[error("failed to spawn command: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GatewayError>;
