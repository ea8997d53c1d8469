use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gateway_protocol::ApprovalStatus;
use gateway_protocol::EditOperation;
use gateway_protocol::OperationKind;
use gateway_protocol::Sensitivity;
use tracing::info;
use tracing::warn;
use wildmatch::WildMatch;

use crate::approval::ApprovalQueue;
use crate::audit::AuditLogger;
use crate::classify;
use crate::classify::FileOperationKind;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::error::Result;
use crate::executor;
use crate::fs_ops;
use crate::path_validator::PathValidator;
use crate::tree_index::StructureResult;
use crate::tree_index::TreeIndexer;
use crate::user_settings::InMemoryUserSettingsStore;
use crate::user_settings::UserSettingsStore;
use crate::user_settings::effective_blocked_patterns;

/// Outcome of an operation that may have needed (and received, or been
/// denied) human approval.
pub enum Gated<T> {
    Completed(T),
    PendingApproval { approval_id: String, sensitivity: Sensitivity },
    Denied { approval_id: String },
}

/// Orchestrates C1-C8 behind the single entrypoint a tool caller uses,
/// mirroring `SystemGatewayTool.run`'s dispatch but in-process rather than
/// over HTTP.
pub struct GatewayAdapter {
    validator: Arc<PathValidator>,
    tree: Arc<TreeIndexer>,
    approvals: Arc<ApprovalQueue>,
    audit: Arc<AuditLogger>,
    user_settings: Arc<dyn UserSettingsStore>,
    config: GatewayConfig,
}

impl GatewayAdapter {
    pub fn new(
        validator: Arc<PathValidator>,
        tree: Arc<TreeIndexer>,
        approvals: Arc<ApprovalQueue>,
        audit: Arc<AuditLogger>,
        config: GatewayConfig,
    ) -> Self {
        Self::with_user_settings(
            validator,
            tree,
            approvals,
            audit,
            Arc::new(InMemoryUserSettingsStore::new()),
            config,
        )
    }

    pub fn with_user_settings(
        validator: Arc<PathValidator>,
        tree: Arc<TreeIndexer>,
        approvals: Arc<ApprovalQueue>,
        audit: Arc<AuditLogger>,
        user_settings: Arc<dyn UserSettingsStore>,
        config: GatewayConfig,
    ) -> Self {
        Self { validator, tree, approvals, audit, user_settings, config }
    }

    /// Checks `resolved` against the user's additional blocked-path globs
    /// (layered on top of, never replacing, the workspace-wide blocklist
    /// `PathValidator` already enforces). Runs the user's patterns through
    /// `effective_blocked_patterns` with an empty global list, since the
    /// workspace-wide defaults are already enforced separately.
    fn user_blocks_path(&self, user_id: &str, resolved: &Path) -> bool {
        let settings = self.user_settings.get(user_id);
        if settings.blocked_paths.is_empty() {
            return false;
        }

        let relative = resolved.strip_prefix(self.validator.workspace_root()).unwrap_or(resolved);
        let relative_str = relative.to_string_lossy();
        let basename = resolved.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

        effective_blocked_patterns(&[], &settings).iter().any(|pattern| {
            let matcher = WildMatch::new(pattern);
            matcher.matches(&relative_str) || matcher.matches(&basename)
        })
    }

    pub async fn read_structure(
        &self,
        user_id: &str,
        path: &str,
        depth: u32,
        include_hidden: bool,
        pattern: Option<&str>,
    ) -> Result<StructureResult> {
        let sensitivity = classify::classify_file_operation(FileOperationKind::ReadStructure, path);
        if sensitivity == Sensitivity::Blocked {
            self.audit.log_blocked(user_id, OperationKind::ReadStructure, path, "blocked pattern");
            return Err(GatewayError::OperationBlocked {
                reason: format!("access blocked: {path}"),
            });
        }

        let result = self.tree.get_structure(path, depth, include_hidden, pattern).await;
        self.audit.log_read_structure(user_id, path, result.is_ok());
        result
    }

    pub async fn read_file(
        &self,
        user_id: &str,
        path: &str,
        line_start: Option<usize>,
        line_end: Option<usize>,
    ) -> Result<fs_ops::ReadOutcome> {
        let sensitivity = classify::classify_file_operation(FileOperationKind::ReadFile, path);
        if sensitivity == Sensitivity::Blocked {
            self.audit.log_blocked(user_id, OperationKind::ReadFile, path, "blocked pattern");
            return Err(GatewayError::OperationBlocked {
                reason: format!("access blocked: {path}"),
            });
        }

        let resolved = self.validator.validate(path)?;
        if self.user_blocks_path(user_id, &resolved) {
            self.audit.log_blocked(user_id, OperationKind::ReadFile, path, "user blocklist overlay");
            return Err(GatewayError::OperationBlocked {
                reason: format!("access blocked for this user: {path}"),
            });
        }
        if !resolved.exists() {
            return Err(GatewayError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        if resolved.is_dir() {
            return Err(GatewayError::InvalidEdit { reason: "path is a directory, not a file".to_string() });
        }

        let outcome = fs_ops::read_file(
            &self.validator,
            &resolved,
            line_start,
            line_end,
            self.config.max_file_size_bytes,
            self.config.max_output_lines,
        );
        self.audit.log_read_file(
            user_id,
            path,
            outcome.is_ok(),
            outcome.as_ref().map(|o| o.total_lines).unwrap_or(0),
        );
        outcome
    }

    /// Edits `path`. If the operation needs approval, queues it and returns
    /// `Gated::PendingApproval` immediately rather than blocking the caller;
    /// the HTTP layer polls `/approvals/{id}` or waits inline depending on
    /// the caller's choice.
    pub async fn edit_file(
        &self,
        user_id: &str,
        path: &str,
        edits: Vec<EditOperation>,
        create_if_missing: bool,
        wait_for_decision: bool,
    ) -> Result<Gated<fs_ops::EditOutcome>> {
        let sensitivity = classify::classify_file_operation(FileOperationKind::EditFile, path);
        if sensitivity == Sensitivity::Blocked {
            self.audit.log_blocked(user_id, OperationKind::EditFile, path, "blocked pattern");
            return Err(GatewayError::OperationBlocked {
                reason: format!("editing this file is blocked: {path}"),
            });
        }

        if sensitivity.requires_approval() {
            let gated = self
                .gate(
                    user_id,
                    &format!("edit file: {path}"),
                    path,
                    sensitivity,
                    wait_for_decision,
                )
                .await?;
            if let Some(denial) = gated {
                return Ok(denial);
            }
        }

        let resolved = self.validator.validate_for_write(path)?;
        if self.user_blocks_path(user_id, &resolved) {
            self.audit.log_blocked(user_id, OperationKind::EditFile, path, "user blocklist overlay");
            return Err(GatewayError::OperationBlocked {
                reason: format!("editing this file is blocked for this user: {path}"),
            });
        }

        let outcome = fs_ops::edit_file(&resolved, path, &edits, create_if_missing);
        self.audit.log_edit_file(
            user_id,
            path,
            outcome.is_ok(),
            outcome.as_ref().map(|o| o.edits_applied).unwrap_or(0),
        );
        Ok(Gated::Completed(outcome?))
    }

    pub async fn execute(
        &self,
        user_id: &str,
        command: &str,
        cwd: Option<&str>,
        timeout_secs: Option<u64>,
        wait_for_decision: bool,
    ) -> Result<Gated<executor::ExecutionOutcome>> {
        let sensitivity = classify::classify_command(command);
        if sensitivity == Sensitivity::Blocked {
            self.audit.log_blocked(user_id, OperationKind::Execute, command, "blocked command");
            return Err(GatewayError::OperationBlocked {
                reason: format!("command blocked for security: {command}"),
            });
        }

        if sensitivity.requires_approval() {
            let gated = self
                .gate(user_id, &format!("execute command: {command}"), command, sensitivity, wait_for_decision)
                .await?;
            if let Some(denial) = gated {
                return Ok(denial);
            }
        }

        let cwd_path = match cwd {
            Some(dir) => self.validator.validate(dir)?,
            None => self.validator.workspace_root().to_path_buf(),
        };
        let timeout = timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_timeout)
            .min(self.config.max_timeout);

        let outcome = executor::run(executor::ExecutionRequest {
            command,
            cwd: &cwd_path,
            timeout,
            max_output_chars: self.config.max_output_lines * 100,
        })
        .await;

        self.audit.log_execute(
            user_id,
            command,
            outcome.as_ref().map(|o| o.exit_code == 0).unwrap_or(false),
            outcome.as_ref().map(|o| o.exit_code).unwrap_or(-1),
            outcome.as_ref().map(|o| o.duration_ms).unwrap_or(0),
        );
        Ok(Gated::Completed(outcome?))
    }

    pub async fn refresh_index(&self) -> Result<usize> {
        self.tree.refresh().await
    }

    /// Queues an approval and, if `wait` is set, polls until it resolves or
    /// the configured TTL elapses. Returns `Some(Gated::...)` when the
    /// caller should stop (pending/denied), `None` when approved and the
    /// caller should proceed.
    async fn gate<T>(
        &self,
        user_id: &str,
        operation: &str,
        target: &str,
        sensitivity: Sensitivity,
        wait: bool,
    ) -> Result<Option<Gated<T>>> {
        let request = self.approvals.queue_approval(
            user_id,
            operation,
            target,
            sensitivity,
            None,
            Some(Duration::from_secs(self.config.approval_ttl_secs)),
        );
        self.audit.log_approval_requested(user_id, target, sensitivity, &request.id);
        info!("queued approval {} for {}", request.id, operation);

        if !wait {
            return Ok(Some(Gated::PendingApproval { approval_id: request.id, sensitivity }));
        }

        let resolved = self
            .approvals
            .wait_for_decision(
                &request.id,
                Duration::from_millis(500),
                Some(Duration::from_secs(self.config.approval_ttl_secs)),
            )
            .await;

        match resolved {
            Some(req) if req.status == ApprovalStatus::Approved => Ok(None),
            Some(req) => {
                warn!("approval {} not granted: {:?}", req.id, req.status);
                Ok(Some(Gated::Denied { approval_id: req.id }))
            }
            None => Ok(Some(Gated::Denied { approval_id: request.id })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::InMemoryTtlStore;

    fn adapter(root: &std::path::Path) -> GatewayAdapter {
        let validator = Arc::new(PathValidator::new(root.to_path_buf(), Vec::new()));
        let tree = Arc::new(
            TreeIndexer::new(root.to_path_buf(), &root.join("index.db"), 50).expect("tree"),
        );
        let approvals = Arc::new(ApprovalQueue::new(Arc::new(InMemoryTtlStore::new()), Duration::from_secs(30)));
        let audit = Arc::new(AuditLogger::new(&root.join("audit")).expect("audit"));
        let mut config = GatewayConfig::default();
        config.workspace_root = root.to_path_buf();
        config.approval_ttl_secs = 30;
        GatewayAdapter::new(validator, tree, approvals, audit, config)
    }

    fn adapter_with_user_settings(
        root: &std::path::Path,
        user_settings: Arc<dyn crate::user_settings::UserSettingsStore>,
    ) -> GatewayAdapter {
        let validator = Arc::new(PathValidator::new(root.to_path_buf(), Vec::new()));
        let tree = Arc::new(
            TreeIndexer::new(root.to_path_buf(), &root.join("index.db"), 50).expect("tree"),
        );
        let approvals = Arc::new(ApprovalQueue::new(Arc::new(InMemoryTtlStore::new()), Duration::from_secs(30)));
        let audit = Arc::new(AuditLogger::new(&root.join("audit")).expect("audit"));
        let mut config = GatewayConfig::default();
        config.workspace_root = root.to_path_buf();
        config.approval_ttl_secs = 30;
        GatewayAdapter::with_user_settings(validator, tree, approvals, audit, user_settings, config)
    }

    #[tokio::test]
    async fn read_file_of_ordinary_path_does_not_require_approval() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.txt"), "hello\n").expect("write");
        let a = adapter(dir.path());
        let outcome = a.read_file("u1", "a.txt", None, None).await.expect("read");
        assert_eq!(outcome.content, "hello\n");
    }

    #[tokio::test]
    async fn editing_blocked_file_is_rejected_outright() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("secret.env"), "SECRET=1").expect("write");
        let a = adapter(dir.path());
        let err = a
            .edit_file("u1", "secret.env", vec![], false, false)
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn per_user_blocklist_overlay_blocks_reads_not_blocked_globally() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "hello\n").expect("write");
        let store = Arc::new(crate::user_settings::InMemoryUserSettingsStore::new());
        let mut settings = crate::user_settings::GatewayUserSettings::default();
        settings.blocked_paths.push("notes.txt".to_string());
        store.set("u1", settings);
        let a = adapter_with_user_settings(dir.path(), store);

        let err = a.read_file("u1", "notes.txt", None, None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn per_user_blocklist_overlay_does_not_affect_other_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "hello\n").expect("write");
        let store = Arc::new(crate::user_settings::InMemoryUserSettingsStore::new());
        let mut settings = crate::user_settings::GatewayUserSettings::default();
        settings.blocked_paths.push("notes.txt".to_string());
        store.set("u1", settings);
        let a = adapter_with_user_settings(dir.path(), store);

        let outcome = a.read_file("u2", "notes.txt", None, None).await.expect("read");
        assert_eq!(outcome.content, "hello\n");
    }

    #[tokio::test]
    async fn execute_of_auto_command_runs_immediately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = adapter(dir.path());
        let outcome = a.execute("u1", "echo hi", None, None, false).await.expect("execute");
        match outcome {
            Gated::Completed(result) => assert_eq!(result.exit_code, 0),
            _ => panic!("expected completed execution"),
        }
    }

    #[tokio::test]
    async fn execute_of_prompt_command_without_waiting_queues_approval() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = adapter(dir.path());
        let outcome = a.execute("u1", "npm install left-pad", None, None, false).await.expect("execute");
        match outcome {
            Gated::PendingApproval { sensitivity, .. } => assert_eq!(sensitivity, Sensitivity::Prompt),
            _ => panic!("expected pending approval"),
        }
    }
}
