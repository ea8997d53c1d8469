use serde::Deserialize;
use serde::Serialize;

use crate::sensitivity::Sensitivity;

/// The kind of operation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ReadStructure,
    ReadFile,
    EditFile,
    Execute,
    ApprovalRequested,
    ApprovalGranted,
    ApprovalDenied,
    ApprovalExpired,
}

/// Outcome of the recorded operation, independent of its sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Denied,
    Blocked,
    Error,
}

/// One append-only line in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_id: String,
    pub operation: OperationKind,
    pub target: String,
    pub result: AuditResult,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
    #[serde(default)]
    pub approval_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_operation_kind_snake_case() {
        let json = serde_json::to_string(&OperationKind::ApprovalRequested).expect("serialize");
        assert_eq!(json, "\"approval_requested\"");
    }

    #[test]
    fn entry_round_trips_without_optional_fields() {
        let entry = AuditEntry {
            timestamp: chrono::Utc::now(),
            user_id: "u1".to_string(),
            operation: OperationKind::ReadFile,
            target: "src/lib.rs".to_string(),
            result: AuditResult::Success,
            details: None,
            sensitivity: Some(Sensitivity::Auto),
            approval_id: None,
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        let back: AuditEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.user_id, "u1");
        assert!(back.approval_id.is_none());
    }
}
