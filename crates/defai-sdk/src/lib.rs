//! DeFAI SDK - Typed client for the agent backend
//!
//! A thin request/response wrapper: no caching, no retries, no idempotency
//! handling. Failures are logged and handed back to the caller unchanged.
//!
//! # Quick Start
//!
//! ```ignore
//! use defai_sdk::{ApiClient, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = ApiClient::new(Config::from_env())?;
//!
//!     let stats = api.dashboard_stats().await?;
//!     println!("{} agents, {} active", stats.total_agents, stats.active_agents);
//!
//!     let agent = api.agent("Yield Hunter")
//!         .strategy("yield_farming")
//!         .protocols(["jupiter", "orca"])
//!         .create()
//!         .await?;
//!     api.start_agent(&agent.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! The client owns a shared token slot. Once `set_token` is called, every
//! request carries `Authorization: Bearer <token>` until `clear_token`.
//! Clones share the slot, so the session and the UI see the same token.

pub use defai_types::*;

use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Error Types
// ============================================================================

/// SDK-specific errors
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SdkError {
    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<SdkError> for DefaiError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::Network(err) => DefaiError::Network(err.to_string()),
            SdkError::Api { status, message } if status == 401 || status == 403 => {
                DefaiError::AuthFailed(message)
            }
            SdkError::Api { status, message } => {
                DefaiError::Network(format!("HTTP {status}: {message}"))
            }
            SdkError::Serialization(err) => DefaiError::Serialization(err.to_string()),
            SdkError::Config(msg) => DefaiError::InvalidInput(msg),
        }
    }
}

/// SDK Result type
pub type SdkResult<T> = std::result::Result<T, SdkError>;

// ============================================================================
// Configuration
// ============================================================================

/// Backend URL used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8002";

/// Environment variable holding the backend URL
pub const API_URL_ENV: &str = "DEFAI_API_URL";

/// SDK configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Read the base URL from `DEFAI_API_URL`, falling back to the default
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { base_url, ..Default::default() }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }
}

// ============================================================================
// Main Client
// ============================================================================

/// Client for the agent backend
#[derive(Clone)]
pub struct ApiClient {
    base_url: Arc<str>,
    client: Client,
    token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.has_token())
            .finish()
    }
}

impl ApiClient {
    /// Create with custom configuration
    pub fn new(config: Config) -> SdkResult<Self> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SdkError::Config(e.to_string()))?;

        Ok(Self {
            base_url: Arc::from(trimmed),
            client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Client for `base_url` with default settings
    pub fn connect(base_url: &str) -> SdkResult<Self> {
        Self::new(Config::with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------------
    // Token slot
    // ------------------------------------------------------------------------

    /// Attach `Authorization: Bearer <token>` to every following request
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Stop sending the bearer token
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    // ------------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, method: &Method, path: &str, builder: RequestBuilder) -> SdkResult<Response> {
        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(%method, path, error = %e, "API error: request failed");
                return Err(SdkError::Network(e));
            }
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        });
        tracing::error!(%method, path, status = status.as_u16(), %message, "API error");
        Err(SdkError::Api { status: status.as_u16(), message })
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> SdkResult<T> {
        let builder = self.request(method.clone(), path);
        let resp = self.send(&method, path, builder).await?;
        decode(resp).await
    }

    async fn call_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> SdkResult<T> {
        let builder = self.request(method.clone(), path).json(body);
        let resp = self.send(&method, path, builder).await?;
        decode(resp).await
    }

    // ------------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------------

    /// List all agents
    pub async fn list_agents(&self) -> SdkResult<Vec<Agent>> {
        self.call(Method::GET, "/agents/").await
    }

    /// Get a single agent
    pub async fn get_agent(&self, id: &str) -> SdkResult<Agent> {
        self.call(Method::GET, &format!("/agents/{id}")).await
    }

    /// Create an agent
    pub async fn create_agent(&self, request: &CreateAgentRequest) -> SdkResult<Agent> {
        self.call_json(Method::POST, "/agents/", request).await
    }

    /// Update an agent
    pub async fn update_agent(&self, id: &str, request: &UpdateAgentRequest) -> SdkResult<Agent> {
        self.call_json(Method::PUT, &format!("/agents/{id}"), request).await
    }

    /// Delete an agent
    pub async fn delete_agent(&self, id: &str) -> SdkResult<()> {
        let path = format!("/agents/{id}");
        let builder = self.request(Method::DELETE, &path);
        self.send(&Method::DELETE, &path, builder).await?;
        Ok(())
    }

    /// Request a lifecycle transition
    pub async fn transition_agent(&self, id: &str, action: LifecycleAction) -> SdkResult<Agent> {
        tracing::info!(agent_id = id, %action, "Requesting agent transition");
        self.call(Method::POST, &format!("/agents/{id}/{}", action.path_segment()))
            .await
    }

    pub async fn start_agent(&self, id: &str) -> SdkResult<Agent> {
        self.transition_agent(id, LifecycleAction::Start).await
    }

    pub async fn stop_agent(&self, id: &str) -> SdkResult<Agent> {
        self.transition_agent(id, LifecycleAction::Stop).await
    }

    pub async fn pause_agent(&self, id: &str) -> SdkResult<Agent> {
        self.transition_agent(id, LifecycleAction::Pause).await
    }

    /// Start building an agent
    pub fn agent(&self, name: &str) -> AgentBuilder {
        AgentBuilder::new(self.clone(), name.to_string())
    }

    // ------------------------------------------------------------------------
    // Performance
    // ------------------------------------------------------------------------

    pub async fn agent_executions(&self, id: &str) -> SdkResult<Vec<AgentExecution>> {
        self.call(Method::GET, &format!("/agents/{id}/executions")).await
    }

    pub async fn agent_performance(&self, id: &str) -> SdkResult<Vec<AgentPerformance>> {
        self.call(Method::GET, &format!("/agents/{id}/performance")).await
    }

    // ------------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------------

    pub async fn dashboard_stats(&self) -> SdkResult<DashboardStats> {
        self.call(Method::GET, "/dashboard/stats").await
    }

    pub async fn health(&self) -> SdkResult<HealthStatus> {
        self.call(Method::GET, "/health").await
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Exchange signed wallet credentials for a bearer token.
    ///
    /// Does not install the token; that is the session's decision.
    pub async fn authenticate_wallet(&self, request: &WalletAuthRequest) -> SdkResult<WalletAuthResponse> {
        self.call_json(Method::POST, "/auth/wallet", request).await
    }

    /// Check `token` against the backend, independent of the token slot
    pub async fn verify_token(&self, token: &str) -> SdkResult<VerifyResponse> {
        let path = "/auth/verify";
        let builder = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        let resp = self.send(&Method::GET, path, builder).await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> SdkResult<T> {
    let bytes = resp.bytes().await?;
    // Empty bodies decode as JSON null so `()` and `Option<_>` work.
    let slice: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    Ok(serde_json::from_slice(slice)?)
}

/// Pull a human message out of a backend error body
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => ["detail", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key))
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

// ============================================================================
// Agent Builder
// ============================================================================

/// Builder for creating agents
pub struct AgentBuilder {
    api: ApiClient,
    request: CreateAgentRequest,
}

impl AgentBuilder {
    fn new(api: ApiClient, name: String) -> Self {
        Self {
            api,
            request: CreateAgentRequest { name, ..Default::default() },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.request.description = Some(description.into());
        self
    }

    pub fn strategy(mut self, strategy_type: impl Into<String>) -> Self {
        self.request.strategy_type = strategy_type.into();
        self
    }

    pub fn strategy_config(mut self, config: StrategyConfig) -> Self {
        self.request.strategy_config = Some(config);
        self
    }

    pub fn risk(mut self, risk: RiskLevel) -> Self {
        self.request.risk_level = Some(risk);
        self
    }

    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.protocols = Some(protocols.into_iter().map(Into::into).collect());
        self
    }

    pub fn watch_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.watched_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_investment(mut self, amount: f64) -> Self {
        self.request.max_investment = Some(amount);
        self
    }

    pub fn min_profit_threshold(mut self, ratio: f64) -> Self {
        self.request.min_profit_threshold = Some(ratio);
        self
    }

    pub fn stop_loss(mut self, ratio: f64) -> Self {
        self.request.stop_loss_percent = Some(ratio);
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.request.is_public = Some(is_public);
        self
    }

    /// The request that `create` would send
    pub fn request(&self) -> &CreateAgentRequest {
        &self.request
    }

    /// Create the agent
    pub async fn create(self) -> SdkResult<Agent> {
        if self.request.name.trim().is_empty() || self.request.strategy_type.trim().is_empty() {
            return Err(SdkError::Config(
                "an agent needs a name and a strategy type".to_string(),
            ));
        }
        self.api.create_agent(&self.request).await
    }
}
