use std::sync::LazyLock;

use regex::RegexSet;

use crate::approval::ApprovalQueue;

static APPROVE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^yes$", r"(?i)^y$", r"(?i)^approve$", r"(?i)^approved$", r"(?i)^ok$",
        r"(?i)^okay$", r"(?i)^go ahead$", r"(?i)^do it$", r"(?i)^proceed$", r"(?i)^confirm$",
        r"(?i)^confirmed$", r"(?i)^allow$", r"(?i)^allowed$", r"(?i)^accept$",
        r"(?i)^accepted$", r"(?i)^yes,?\s*please$", r"(?i)^yes,?\s*go ahead$",
    ])
    .expect("approve pattern set compiles")
});

static REJECT_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^no$", r"(?i)^n$", r"(?i)^reject$", r"(?i)^rejected$", r"(?i)^deny$",
        r"(?i)^denied$", r"(?i)^cancel$", r"(?i)^cancelled$", r"(?i)^stop$", r"(?i)^abort$",
        r"(?i)^don'?t$", r"(?i)^no,?\s*thanks$", r"(?i)^no,?\s*don'?t$", r"(?i)^nevermind$",
        r"(?i)^never\s*mind$",
    ])
    .expect("reject pattern set compiles")
});

pub struct InterceptorOutcome {
    pub approved: bool,
    pub message: String,
}

fn matches(text: &str, set: &RegexSet) -> bool {
    set.is_match(text.trim().to_lowercase().as_str())
}

/// Checks whether a free-text chat `message` resolves the user's single
/// oldest pending approval, mirroring `check_for_approval_response`'s
/// "resolve the first pending request" behavior.
pub fn check_for_approval_response(
    queue: &ApprovalQueue,
    user_id: &str,
    message: &str,
) -> Option<InterceptorOutcome> {
    let pending = queue.get_pending_for_user(user_id);
    let latest = pending.first()?;

    let is_approve = matches(message, &APPROVE_PATTERNS);
    let is_reject = matches(message, &REJECT_PATTERNS);

    if is_approve {
        return Some(match queue.approve(&latest.id) {
            Ok(resolved) => InterceptorOutcome {
                approved: true,
                message: format!("Approved: {}\n\nExecuting operation...", resolved.operation),
            },
            Err(_) => InterceptorOutcome {
                approved: false,
                message: "Failed to process approval. The request may have expired.".to_string(),
            },
        });
    }

    if is_reject {
        return Some(match queue.reject(&latest.id) {
            Ok(resolved) => InterceptorOutcome {
                approved: false,
                message: format!("Rejected: {}\n\nOperation cancelled.", resolved.operation),
            },
            Err(_) => InterceptorOutcome {
                approved: false,
                message: "Failed to process rejection. The request may have expired.".to_string(),
            },
        });
    }

    None
}

/// Renders the pending-approvals list for inclusion in conversational
/// context, or `None` when nothing is pending.
pub fn format_pending_approval_prompt(queue: &ApprovalQueue, user_id: &str) -> Option<String> {
    let pending = queue.get_pending_for_user(user_id);
    if pending.is_empty() {
        return None;
    }

    let mut lines = vec!["PENDING APPROVAL REQUIRED:".to_string()];
    for req in &pending {
        lines.push(format!("\n- {}", req.operation));
        if let Some(details) = &req.details {
            lines.push(format!("  Details: {details}"));
        }
        lines.push(format!("  Sensitivity: {}", req.sensitivity));
        lines.push(format!("  Expires: {}", req.expires_at.format("%H:%M:%S")));
    }
    lines.push("\nRespond with 'yes' to approve or 'no' to reject.".to_string());

    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use gateway_protocol::Sensitivity;

    use super::*;
    use crate::approval::InMemoryTtlStore;

    fn queue() -> ApprovalQueue {
        ApprovalQueue::new(Arc::new(InMemoryTtlStore::new()), Duration::from_secs(120))
    }

    #[test]
    fn yes_approves_the_oldest_pending_request() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        let outcome = check_for_approval_response(&q, "u1", "yes").expect("outcome");
        assert!(outcome.approved);
        assert_eq!(q.get_status(&req.id).expect("status").status, gateway_protocol::ApprovalStatus::Approved);
    }

    #[test]
    fn no_rejects_the_oldest_pending_request() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        let outcome = check_for_approval_response(&q, "u1", "no thanks").expect("outcome");
        assert!(!outcome.approved);
        assert_eq!(q.get_status(&req.id).expect("status").status, gateway_protocol::ApprovalStatus::Rejected);
    }

    #[test]
    fn unrelated_text_is_not_intercepted() {
        let q = queue();
        q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        assert!(check_for_approval_response(&q, "u1", "what's the weather").is_none());
    }

    #[test]
    fn yes_resolves_the_oldest_of_several_pending_requests() {
        let q = queue();
        let first = q.queue_approval("u1", "execute", "first", Sensitivity::High, None, None);
        let second = q.queue_approval("u1", "execute", "second", Sensitivity::High, None, None);
        let outcome = check_for_approval_response(&q, "u1", "yes").expect("outcome");
        assert!(outcome.approved);
        assert_eq!(q.get_status(&first.id).expect("status").status, gateway_protocol::ApprovalStatus::Approved);
        assert_eq!(q.get_status(&second.id).expect("status").status, gateway_protocol::ApprovalStatus::Pending);
    }

    #[test]
    fn no_pending_approvals_means_no_interception() {
        let q = queue();
        assert!(check_for_approval_response(&q, "u1", "yes").is_none());
    }

    #[test]
    fn prompt_lists_pending_operations() {
        let q = queue();
        q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        let prompt = format_pending_approval_prompt(&q, "u1").expect("prompt");
        assert!(prompt.contains("rm -rf build"));
        assert!(prompt.contains("yes"));
    }
}
