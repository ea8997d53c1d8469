use std::sync::Arc;
use std::time::Duration;

use gateway_protocol::ApprovalRequest;
use gateway_protocol::ApprovalStatus;
use gateway_protocol::Sensitivity;
use uuid::Uuid;

use super::store::TtlStore;
use crate::error::GatewayError;
use crate::error::Result;

const APPROVAL_KEY_PREFIX: &str = "hitl:approval:";
const USER_INDEX_PREFIX: &str = "hitl:user:";
const RESOLVED_TTL: Duration = Duration::from_secs(60);

/// Manages the queue of pending human-in-the-loop approval requests on top
/// of a [`TtlStore`], matching `HITLApprovalService`'s queue/poll/approve/
/// reject contract.
pub struct ApprovalQueue {
    store: Arc<dyn TtlStore>,
    default_ttl: Duration,
}

impl ApprovalQueue {
    pub fn new(store: Arc<dyn TtlStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn queue_approval(
        &self,
        user_id: &str,
        operation: &str,
        target: &str,
        sensitivity: Sensitivity,
        details: Option<String>,
        ttl: Option<Duration>,
    ) -> ApprovalRequest {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let now = chrono::Utc::now();
        let request = ApprovalRequest {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            operation: operation.to_string(),
            target: target.to_string(),
            sensitivity,
            status: ApprovalStatus::Pending,
            created_at: now,
            expires_at: now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
            details,
        };

        self.store_request(&request, ttl);
        self.store.sadd(&user_key(user_id), &request.id);
        self.store.expire(&user_key(user_id), ttl + Duration::from_secs(60));
        request
    }

    pub fn get_status(&self, approval_id: &str) -> Option<ApprovalRequest> {
        let raw = self.store.get(&approval_key(approval_id))?;
        serde_json::from_str(&raw).ok()
    }

    pub fn get_pending_for_user(&self, user_id: &str) -> Vec<ApprovalRequest> {
        let ids = self.store.smembers(&user_key(user_id));
        let mut pending = Vec::new();
        let mut expired_ids = Vec::new();

        for id in ids {
            match self.get_status(&id) {
                Some(request) if request.status == ApprovalStatus::Pending => pending.push(request),
                Some(_) => {}
                None => expired_ids.push(id),
            }
        }

        for id in &expired_ids {
            self.store.srem(&user_key(user_id), id);
        }

        pending.sort_by_key(|request| request.created_at);
        pending
    }

    pub fn approve(&self, approval_id: &str) -> Result<ApprovalRequest> {
        self.resolve(approval_id, ApprovalStatus::Approved)
    }

    pub fn reject(&self, approval_id: &str) -> Result<ApprovalRequest> {
        self.resolve(approval_id, ApprovalStatus::Rejected)
    }

    fn resolve(&self, approval_id: &str, status: ApprovalStatus) -> Result<ApprovalRequest> {
        let mut request = self
            .get_status(approval_id)
            .ok_or_else(|| GatewayError::ApprovalNotFound {
                id: approval_id.to_string(),
            })?;

        if request.status != ApprovalStatus::Pending {
            return Err(GatewayError::ApprovalAlreadyResolved {
                id: approval_id.to_string(),
                status: format!("{:?}", request.status),
            });
        }

        request.status = status;
        self.store_request(&request, RESOLVED_TTL);
        Ok(request)
    }

    /// Polls until the request leaves `Pending`, times out, or disappears
    /// (expired), matching `wait_for_decision`'s three outcomes.
    pub async fn wait_for_decision(
        &self,
        approval_id: &str,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> Option<ApprovalRequest> {
        let started = tokio::time::Instant::now();
        loop {
            let request = self.get_status(approval_id)?;
            if request.status != ApprovalStatus::Pending {
                return Some(request);
            }
            if let Some(max_wait) = max_wait {
                if started.elapsed() >= max_wait {
                    return Some(request);
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    fn store_request(&self, request: &ApprovalRequest, ttl: Duration) {
        if let Ok(json) = serde_json::to_string(request) {
            self.store.setex(&approval_key(&request.id), ttl, json);
        }
    }
}

fn approval_key(id: &str) -> String {
    format!("{APPROVAL_KEY_PREFIX}{id}")
}

fn user_key(user_id: &str) -> String {
    format!("{USER_INDEX_PREFIX}{user_id}")
}

#[cfg(test)]
mod tests {
    use super::super::store::InMemoryTtlStore;
    use super::*;

    fn queue() -> ApprovalQueue {
        ApprovalQueue::new(Arc::new(InMemoryTtlStore::new()), Duration::from_secs(120))
    }

    #[test]
    fn queue_then_get_status_round_trips() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        let fetched = q.get_status(&req.id).expect("status");
        assert_eq!(fetched.status, ApprovalStatus::Pending);
        assert_eq!(fetched.user_id, "u1");
    }

    #[test]
    fn approve_transitions_pending_to_approved() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        let resolved = q.approve(&req.id).expect("approve");
        assert_eq!(resolved.status, ApprovalStatus::Approved);
    }

    #[test]
    fn approving_twice_fails_on_the_second_call() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "rm -rf build", Sensitivity::High, None, None);
        q.approve(&req.id).expect("first approve");
        let err = q.reject(&req.id);
        assert!(matches!(err, Err(GatewayError::ApprovalAlreadyResolved { .. })));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let q = queue();
        assert!(q.approve("does-not-exist").is_err());
    }

    #[test]
    fn pending_for_user_lists_only_pending() {
        let q = queue();
        let req1 = q.queue_approval("u1", "execute", "a", Sensitivity::Prompt, None, None);
        let req2 = q.queue_approval("u1", "execute", "b", Sensitivity::Prompt, None, None);
        q.approve(&req1.id).expect("approve");
        let pending = q.get_pending_for_user("u1");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, req2.id);
    }

    #[test]
    fn pending_for_user_is_sorted_oldest_first() {
        let q = queue();
        let req1 = q.queue_approval("u1", "execute", "a", Sensitivity::Prompt, None, None);
        let req2 = q.queue_approval("u1", "execute", "b", Sensitivity::Prompt, None, None);

        // Backdate req2 so it's now the oldest, then re-store it directly:
        // the user-id index (a HashSet under the hood) doesn't preserve
        // insertion order, so only a sort on `created_at` can get this right.
        let mut backdated = req2.clone();
        backdated.created_at = req1.created_at - chrono::Duration::seconds(60);
        q.store_request(&backdated, Duration::from_secs(120));

        let pending = q.get_pending_for_user("u1");
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, backdated.id);
        assert_eq!(pending[1].id, req1.id);
    }

    #[tokio::test]
    async fn wait_for_decision_returns_once_resolved() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "a", Sensitivity::Prompt, None, None);
        q.approve(&req.id).expect("approve");
        let resolved = q
            .wait_for_decision(&req.id, Duration::from_millis(10), Some(Duration::from_secs(1)))
            .await
            .expect("resolved");
        assert_eq!(resolved.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn wait_for_decision_times_out_while_still_pending() {
        let q = queue();
        let req = q.queue_approval("u1", "execute", "a", Sensitivity::Prompt, None, None);
        let result = q
            .wait_for_decision(&req.id, Duration::from_millis(5), Some(Duration::from_millis(20)))
            .await
            .expect("still present");
        assert_eq!(result.status, ApprovalStatus::Pending);
    }
}
