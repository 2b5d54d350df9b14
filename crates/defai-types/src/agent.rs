//! Agent records as served by the backend
//!
//! The backend owns every agent. These types mirror its JSON and add the
//! small amount of client-side logic the console needs (which lifecycle
//! actions a card offers, human labels).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DefaiError;

/// Free-form strategy configuration
pub type StrategyConfig = serde_json::Map<String, serde_json::Value>;

/// Agent risk appetite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Label used by the creation wizard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Conservative",
            Self::Medium => "Balanced",
            Self::High => "Aggressive",
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = DefaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DefaiError::InvalidInput(format!("unknown risk level: {other}"))),
        }
    }
}

/// Agent lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Created,
    Active,
    Paused,
    Stopped,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    /// Lifecycle actions a card offers for this status.
    ///
    /// Idle agents can be started; anything else can be paused or stopped.
    pub fn available_actions(&self) -> &'static [LifecycleAction] {
        match self {
            Self::Created | Self::Stopped | Self::Paused => &[LifecycleAction::Start],
            Self::Active | Self::Error => &[LifecycleAction::Pause, LifecycleAction::Stop],
        }
    }

    /// Whether `action` is offered for this status
    pub fn allows(&self, action: LifecycleAction) -> bool {
        self.available_actions().contains(&action)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle transition requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Pause,
    Stop,
}

impl LifecycleAction {
    /// Path segment under `/agents/{id}/`
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A trading agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub strategy_type: String,
    #[serde(default)]
    pub strategy_config: StrategyConfig,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub chain: String,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub watched_tokens: Vec<String>,
    pub max_investment: f64,
    pub min_profit_threshold: f64,
    pub stop_loss_percent: f64,
    pub status: AgentStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_at: Option<String>,
    pub owner_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub total_trades: u64,
    #[serde(default)]
    pub success_rate: f64,
}

impl Agent {
    pub fn is_profitable(&self) -> bool {
        self.total_profit > 0.0
    }
}

/// Body of `POST /agents/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub strategy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_config: Option<StrategyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_investment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_profit_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

/// Body of `PUT /agents/{id}`; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_config: Option<StrategyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_investment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_profit_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl UpdateAgentRequest {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Execution status of a single strategy run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One strategy execution, from `GET /agents/{id}/executions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    pub id: String,
    pub agent_id: String,
    pub strategy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub status: ExecutionStatus,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub profit_percent: f64,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Periodic performance aggregate, from `GET /agents/{id}/performance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub id: String,
    pub agent_id: String,
    pub date: String,
    pub period_type: String,
    pub trades_count: u64,
    pub successful_trades: u64,
    pub total_profit: f64,
    pub net_profit: f64,
    pub success_rate: f64,
    pub roi_percent: f64,
    pub portfolio_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent_json(status: &str) -> serde_json::Value {
        json!({
            "id": "a1",
            "name": "Alpha",
            "strategy_type": "arbitrage",
            "strategy_config": {"slippage": 0.5},
            "risk_level": "high",
            "chain": "solana",
            "protocols": ["jupiter"],
            "watched_tokens": ["SOL", "USDC"],
            "max_investment": 1000.0,
            "min_profit_threshold": 0.01,
            "stop_loss_percent": 0.1,
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "owner_id": "u1",
            "is_public": false,
            "total_profit": 12.5,
            "total_trades": 4,
            "success_rate": 0.75
        })
    }

    #[test]
    fn agent_deserializes_backend_shape() {
        let agent: Agent = serde_json::from_value(agent_json("active")).unwrap();
        assert_eq!(agent.status, AgentStatus::Active);
        assert_eq!(agent.risk_level, RiskLevel::High);
        assert!(agent.description.is_none());
        assert!(agent.is_profitable());
        assert_eq!(agent.strategy_config.get("slippage"), Some(&json!(0.5)));
    }

    #[test]
    fn idle_statuses_offer_start_only() {
        for status in [AgentStatus::Created, AgentStatus::Stopped, AgentStatus::Paused] {
            assert_eq!(status.available_actions(), &[LifecycleAction::Start]);
        }
    }

    #[test]
    fn running_statuses_offer_pause_and_stop() {
        assert!(AgentStatus::Active.allows(LifecycleAction::Pause));
        assert!(AgentStatus::Active.allows(LifecycleAction::Stop));
        assert!(!AgentStatus::Active.allows(LifecycleAction::Start));
        assert!(AgentStatus::Error.allows(LifecycleAction::Stop));
    }

    #[test]
    fn create_request_omits_unset_fields() {
        let req = CreateAgentRequest {
            name: "Beta".into(),
            strategy_type: "lending".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"name": "Beta", "strategy_type": "lending"}));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateAgentRequest::default().is_empty());
        let update = UpdateAgentRequest {
            risk_level: Some(RiskLevel::Low),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
