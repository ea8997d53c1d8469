use std::sync::Arc;

use gateway_core::GatewayAdapter;
use gateway_core::GatewayConfig;
use gateway_core::approval::ApprovalQueue;

#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<GatewayAdapter>,
    pub approvals: Arc<ApprovalQueue>,
    pub config: Arc<GatewayConfig>,
}
