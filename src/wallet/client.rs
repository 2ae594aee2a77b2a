//! Read-only chain access
//!
//! [`EvmClient`] is the narrow surface the services need from a chain:
//! `eth_chainId`, `eth_call` and `eth_estimateGas`. [`RpcEvmClient`] backs it
//! with an alloy HTTP provider.
//!
//! SECURITY NOTE:
//! - This module never signs or submits transactions

use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::Bytes;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

#[async_trait]
pub trait EvmClient: Send + Sync {
    /// Chain id reported by the node
    async fn chain_id(&self) -> Result<u64>;

    /// Execute a read-only call and return the raw return data
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    /// Estimate gas for a transaction
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;
}

/// JSON-RPC client for one chain
#[derive(Debug, Clone)]
pub struct RpcEvmClient {
    rpc_url: url::Url,
}

impl RpcEvmClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;
        Ok(Self { rpc_url })
    }

    /// Parse revert reason from RPC error message
    fn parse_revert_reason(error: &str) -> String {
        if error.contains("execution reverted") {
            if let Some(start) = error.find("revert: ") {
                let reason = &error[start + 8..];
                if let Some(end) = reason.find('"') {
                    return reason[..end].to_string();
                }
                return reason.to_string();
            }
            if let Some(start) = error.find("0x") {
                let hex_data = &error[start..];
                let end = hex_data
                    .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
                    .unwrap_or(hex_data.len());
                let data = &hex_data[..end];
                // Error(string) selector 0x08c379a0
                if data.starts_with("0x08c379a0") && data.len() > 138 {
                    if let Ok(decoded) = hex::decode(&data[138..]) {
                        let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                        if let Ok(s) = String::from_utf8(filtered) {
                            return s;
                        }
                    }
                }
                return format!("Reverted with data: {}", data);
            }
            return "execution reverted".to_string();
        }

        error.to_string()
    }
}

#[async_trait]
impl EvmClient for RpcEvmClient {
    async fn chain_id(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        provider
            .get_chain_id()
            .await
            .map_err(|e| Error::ContractCall(format!("Failed to get chain id: {}", e)))
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        provider.call(tx).await.map_err(|e| {
            Error::ContractCall(format!(
                "eth_call failed: {}",
                Self::parse_revert_reason(&e.to_string())
            ))
        })
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        provider.estimate_gas(tx).await.map_err(|e| {
            Error::ContractCall(format!(
                "Gas estimation failed: {}",
                Self::parse_revert_reason(&e.to_string())
            ))
        })
    }
}
