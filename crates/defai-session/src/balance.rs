//! Native-token balance lookups over chain JSON-RPC

use async_trait::async_trait;
use defai_types::Chain;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::{SessionConfig, SessionError, SessionResult};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;
const WEI_PER_ETH: f64 = 1_000_000_000_000_000_000.0;

/// Source of an address's native balance, in whole tokens
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, address: &str) -> SessionResult<f64>;
}

/// Minimal JSON-RPC 2.0 caller
#[derive(Debug, Clone)]
struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client, url: url.to_string() }
    }

    async fn call(&self, method: &str, params: Value) -> SessionResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Balance(format!("{method} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SessionError::Balance(format!(
                "{method} failed: HTTP {}",
                resp.status()
            )));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| SessionError::Balance(format!("failed to parse {method} response: {e}")))?;
        if let Some(error) = value.get("error") {
            return Err(SessionError::Balance(format!("rpc returned error for {method}: {error}")));
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| SessionError::Balance(format!("{method} result was missing")))
    }
}

/// Solana `getBalance`
#[derive(Debug, Clone)]
pub struct SolanaRpcBalance {
    rpc: RpcClient,
}

impl SolanaRpcBalance {
    pub fn new(url: &str) -> Self {
        Self { rpc: RpcClient::new(url) }
    }
}

#[async_trait]
impl BalanceSource for SolanaRpcBalance {
    async fn balance(&self, address: &str) -> SessionResult<f64> {
        let result = self.rpc.call("getBalance", json!([address])).await?;
        lamports_to_sol(&result)
    }
}

/// Ethereum `eth_getBalance` at the latest block
#[derive(Debug, Clone)]
pub struct EthereumRpcBalance {
    rpc: RpcClient,
}

impl EthereumRpcBalance {
    pub fn new(url: &str) -> Self {
        Self { rpc: RpcClient::new(url) }
    }
}

#[async_trait]
impl BalanceSource for EthereumRpcBalance {
    async fn balance(&self, address: &str) -> SessionResult<f64> {
        let result = self.rpc.call("eth_getBalance", json!([address, "latest"])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| SessionError::Balance("eth_getBalance result was not a string".into()))?;
        Ok(parse_wei_hex(raw)? as f64 / WEI_PER_ETH)
    }
}

/// `getBalance` result, either `{"value": n}` or a bare number
fn lamports_to_sol(result: &Value) -> SessionResult<f64> {
    let lamports = result
        .get("value")
        .unwrap_or(result)
        .as_u64()
        .ok_or_else(|| SessionError::Balance(format!("unexpected getBalance result: {result}")))?;
    Ok(lamports as f64 / LAMPORTS_PER_SOL)
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_wei_hex(raw: &str) -> SessionResult<u128> {
    let trimmed = raw.trim().to_ascii_lowercase();
    let digits = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| SessionError::Balance(format!("{raw:?} must be 0x-prefixed hex")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| SessionError::Balance(format!("{raw:?} is not a hex quantity: {e}")))
}

/// Balance source per chain
#[derive(Clone)]
pub struct ChainBalances {
    solana: Arc<dyn BalanceSource>,
    ethereum: Arc<dyn BalanceSource>,
}

impl ChainBalances {
    pub fn new(solana: Arc<dyn BalanceSource>, ethereum: Arc<dyn BalanceSource>) -> Self {
        Self { solana, ethereum }
    }

    /// Public RPC endpoints from the config
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            Arc::new(SolanaRpcBalance::new(&config.solana_rpc_url)),
            Arc::new(EthereumRpcBalance::new(&config.ethereum_rpc_url)),
        )
    }

    pub fn for_chain(&self, chain: Chain) -> &Arc<dyn BalanceSource> {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Ethereum => &self.ethereum,
        }
    }
}

impl std::fmt::Debug for ChainBalances {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainBalances").finish_non_exhaustive()
    }
}
