//! Dashboard aggregates and service health

use serde::{Deserialize, Serialize};

/// Aggregates from `GET /dashboard/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_agents: u64,
    pub active_agents: u64,
    pub total_profit: f64,
    pub successful_trades: u64,
    pub success_rate: f64,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    #[serde(default)]
    pub solana_connected: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}
