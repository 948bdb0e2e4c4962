//! ETH JSON-RPC balance client.
//!
//! Speaks plain JSON-RPC 2.0 over HTTP (`eth_getBalance`), works against
//! any Anvil/Geth-compatible node.

use super::error::LookupError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// External balance collaborator as the coordinator sees it.
///
/// `is_valid_address` is a cheap syntactic pre-check; `get_balance` must
/// only be called for addresses that pass it.
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    /// Syntactic address check, no network involved.
    fn is_valid_address(&self, address: &str) -> bool {
        is_eth_address(address)
    }

    /// Current balance of `address` in ETH.
    async fn get_balance(&self, address: &str) -> Result<Decimal, LookupError>;
}

/// JSON-RPC request structure
#[derive(Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Balance client connected to an Ethereum node via JSON-RPC.
pub struct EthRpcClient {
    url: String,
    client: reqwest::Client,
}

impl EthRpcClient {
    /// Create a client for `url`. Every call is bounded by `timeout`; a
    /// timed-out lookup surfaces as [`LookupError::Timeout`].
    pub fn new(url: &str, timeout: Duration) -> Result<Self, LookupError> {
        info!("Initializing ETH RPC client for {}", url);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LookupError::RpcConnection(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Make a JSON-RPC call
    async fn rpc_call<T, R>(&self, method: &'static str, params: T) -> Result<R, LookupError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::RpcConnection(format!("HTTP request failed: {}", e))
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(LookupError::RpcConnection(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| LookupError::InvalidResponse("No result in RPC response".to_string()))
    }
}

#[async_trait]
impl BalanceLookup for EthRpcClient {
    async fn get_balance(&self, address: &str) -> Result<Decimal, LookupError> {
        let result: String = self
            .rpc_call("eth_getBalance", (address, "latest"))
            .await?;

        let wei = u128::from_str_radix(result.trim_start_matches("0x"), 16)
            .map_err(|e| LookupError::InvalidResponse(format!("Invalid balance value: {}", e)))?;

        debug!(address = address, wei = %wei, "Balance fetched");
        Ok(wei_to_eth(&wei.to_string()))
    }
}

/// Syntactic ETH address check: `0x` prefix, 42 chars, hex body.
pub fn is_eth_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Convert wei (u128 string) to Decimal with 18 decimals.
pub fn wei_to_eth(wei_str: &str) -> Decimal {
    Decimal::from_str(wei_str)
        .map(|d| d / Decimal::from(10u64.pow(18)))
        .unwrap_or_default()
}
