use serde::Deserialize;
use serde::Serialize;

use crate::sensitivity::Sensitivity;

/// Lifecycle of a single human-in-the-loop approval request.
///
/// `Pending` is the only non-terminal state; everything else is final once
/// written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ApprovalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// A single queued operation awaiting (or having received) a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub user_id: String,
    pub operation: String,
    pub target: String,
    pub sensitivity: Sensitivity,
    pub status: ApprovalStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ApprovalRequest {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.status == ApprovalStatus::Pending && now >= self.expires_at
    }
}
