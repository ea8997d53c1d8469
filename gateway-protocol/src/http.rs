use serde::Deserialize;
use serde::Serialize;

use crate::approval::ApprovalRequest;
use crate::approval::ApprovalStatus;
use crate::edit::EditOperation;
use crate::sensitivity::Sensitivity;
use crate::tree::TreeEntry;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub workspace_root: String,
    pub workspace_exists: bool,
}

fn default_depth() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureRequest {
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureResponse {
    pub success: bool,
    pub root: String,
    pub tree: Vec<TreeEntry>,
    pub stats: StructureStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureStats {
    pub total_files: i64,
    pub total_dirs: i64,
    pub returned: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadRequest {
    pub path: String,
    #[serde(default)]
    pub line_start: Option<usize>,
    #[serde(default)]
    pub line_end: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadResponse {
    pub success: bool,
    pub content: String,
    pub is_binary: bool,
    pub truncated: bool,
    pub total_lines: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    pub path: String,
    pub edits: Vec<EditOperation>,
    #[serde(default)]
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub success: bool,
    pub diff: String,
    #[serde(default)]
    pub approval_id: Option<String>,
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub approval_id: Option<String>,
    #[serde(default)]
    pub sensitivity: Option<Sensitivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexRefreshResponse {
    pub success: bool,
    pub entries_indexed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalListResponse {
    pub success: bool,
    pub approvals: Vec<ApprovalRequest>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResponse {
    pub success: bool,
    pub approval: ApprovalRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalActionRequest {
    pub status: ApprovalActionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalActionStatus {
    Approved,
    Rejected,
}

impl From<ApprovalActionStatus> for ApprovalStatus {
    fn from(value: ApprovalActionStatus) -> Self {
        match value {
            ApprovalActionStatus::Approved => ApprovalStatus::Approved,
            ApprovalActionStatus::Rejected => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_request_defaults_depth_to_two() {
        let req: StructureRequest = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(req.depth, 2);
        assert_eq!(req.path, "");
    }

    #[test]
    fn approval_action_status_maps_to_terminal_status() {
        assert_eq!(
            ApprovalStatus::from(ApprovalActionStatus::Approved),
            ApprovalStatus::Approved
        );
    }
}
