use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use gateway_protocol::AuditEntry;
use gateway_protocol::AuditResult;
use gateway_protocol::OperationKind;
use gateway_protocol::Sensitivity;
use tracing::error;
use tracing::info;

/// Append-only JSON-lines audit logger. Write failures never propagate to
/// the caller: they're downgraded to a `tracing::error!` plus a best-effort
/// `tracing::info!` dump of the entry, matching the original service's
/// fallback.
pub struct AuditLogger {
    log_file: Mutex<std::fs::File>,
}

impl AuditLogger {
    pub fn new(log_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_file_path(log_dir);
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { log_file: Mutex::new(file) })
    }

    pub fn log(&self, entry: AuditEntry) {
        let Ok(json) = serde_json::to_string(&entry) else {
            error!("failed to serialize audit entry");
            return;
        };

        let write_result = {
            let mut guard = self.log_file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            writeln!(guard, "{json}")
        };

        if let Err(err) = write_result {
            error!("failed to write audit log: {err}");
            info!("AUDIT: {json}");
        }
    }

    pub fn log_read_structure(&self, user_id: &str, path: &str, success: bool) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation: OperationKind::ReadStructure,
            target: if path.is_empty() { "/".to_string() } else { path.to_string() },
            result: if success { AuditResult::Success } else { AuditResult::Error },
            details: None,
            sensitivity: None,
            approval_id: None,
        });
    }

    pub fn log_read_file(&self, user_id: &str, path: &str, success: bool, lines: usize) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation: OperationKind::ReadFile,
            target: path.to_string(),
            result: if success { AuditResult::Success } else { AuditResult::Error },
            details: Some(format!("lines_read={lines}")),
            sensitivity: None,
            approval_id: None,
        });
    }

    pub fn log_edit_file(&self, user_id: &str, path: &str, success: bool, edits: usize) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation: OperationKind::EditFile,
            target: path.to_string(),
            result: if success { AuditResult::Success } else { AuditResult::Error },
            details: Some(format!("edits_applied={edits}")),
            sensitivity: None,
            approval_id: None,
        });
    }

    pub fn log_execute(&self, user_id: &str, command: &str, success: bool, exit_code: i32, duration_ms: u64) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation: OperationKind::Execute,
            target: command.to_string(),
            result: if success { AuditResult::Success } else { AuditResult::Error },
            details: Some(format!("exit_code={exit_code} duration_ms={duration_ms}")),
            sensitivity: None,
            approval_id: None,
        });
    }

    pub fn log_blocked(&self, user_id: &str, operation: OperationKind, target: &str, reason: &str) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation,
            target: target.to_string(),
            result: AuditResult::Blocked,
            details: Some(reason.to_string()),
            sensitivity: None,
            approval_id: None,
        });
    }

    pub fn log_approval_requested(&self, user_id: &str, target: &str, sensitivity: Sensitivity, approval_id: &str) {
        self.log(AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: user_id.to_string(),
            operation: OperationKind::ApprovalRequested,
            target: target.to_string(),
            result: AuditResult::Success,
            details: None,
            sensitivity: Some(sensitivity),
            approval_id: Some(approval_id.to_string()),
        });
    }
}

fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join("gateway_audit.jsonl")
}
