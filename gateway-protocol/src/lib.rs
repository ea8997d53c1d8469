//! Wire and domain types shared by `gateway-core` and `gateway-server`.

pub mod approval;
pub mod audit;
pub mod edit;
pub mod http;
pub mod sensitivity;
pub mod tree;

pub use approval::ApprovalRequest;
pub use approval::ApprovalStatus;
pub use audit::AuditEntry;
pub use audit::AuditResult;
pub use audit::OperationKind;
pub use edit::EditAction;
pub use edit::EditOperation;
pub use sensitivity::Sensitivity;
pub use tree::EntryKind;
pub use tree::TreeEntry;
