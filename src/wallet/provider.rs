//! Wallet provider: chain selection plus the active account address

use super::{EvmClient, RpcEvmClient, SecureWallet};
use crate::config::rpc::{self, RpcConfig};
use crate::config::Config;
use crate::runtime::{AgentRuntime, ContextProvider, Memory, State};
use crate::{Error, Result};
use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// A configured chain and its client
#[derive(Clone)]
pub struct ChainEntry {
    /// Canonical chain name ("baseSepolia")
    pub name: String,
    pub id: u64,
    pub client: Arc<dyn EvmClient>,
}

impl std::fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainEntry")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

/// Holds one client per configured chain and tracks the active chain
#[derive(Debug)]
pub struct WalletProvider {
    chains: Vec<ChainEntry>,
    current: RwLock<usize>,
    address: Option<Address>,
}

impl WalletProvider {
    /// Build from explicit chain entries; the first entry starts active
    pub fn new(chains: Vec<ChainEntry>, address: Option<Address>) -> Result<Self> {
        if chains.is_empty() {
            return Err(Error::Config(
                "Wallet provider needs at least one chain".to_string(),
            ));
        }
        Ok(Self {
            chains,
            current: RwLock::new(0),
            address,
        })
    }

    /// Build JSON-RPC clients for every configured chain
    pub fn from_config(
        config: &Config,
        rpc_config: &RpcConfig,
        wallet: Option<&SecureWallet>,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(config.chains.len());
        for name in &config.chains {
            let info = rpc::chain_by_name(name)
                .ok_or_else(|| Error::Config(format!("Unknown chain: {}", name)))?;
            let url = rpc_config.get(info.id).ok_or_else(|| {
                Error::Config(format!("No RPC URL configured for chain {}", info.name))
            })?;
            entries.push(ChainEntry {
                name: info.name.to_string(),
                id: info.id,
                client: Arc::new(RpcEvmClient::new(url)?),
            });
        }

        let provider = Self::new(entries, wallet.map(SecureWallet::address))?;
        tracing::info!(
            chains = ?provider.chain_names(),
            address = ?provider.address(),
            "Wallet provider initialized"
        );
        Ok(provider)
    }

    /// Names of all configured chains
    pub fn chain_names(&self) -> Vec<String> {
        self.chains.iter().map(|c| c.name.clone()).collect()
    }

    fn position(&self, name: &str) -> Result<usize> {
        let wanted = rpc::normalize_chain_name(name);
        self.chains
            .iter()
            .position(|c| rpc::normalize_chain_name(&c.name) == wanted)
            .ok_or_else(|| Error::ChainNotConfigured {
                chain: name.to_string(),
                configured: self.chain_names(),
            })
    }

    /// Look up a configured chain without switching to it
    pub fn chain(&self, name: &str) -> Result<&ChainEntry> {
        let idx = self.position(name)?;
        Ok(&self.chains[idx])
    }

    /// Make `name` the active chain
    pub fn switch_chain(&self, name: &str) -> Result<&ChainEntry> {
        let idx = self.position(name)?;
        match self.current.write() {
            Ok(mut current) => *current = idx,
            Err(poisoned) => *poisoned.into_inner() = idx,
        }
        tracing::debug!(chain = %self.chains[idx].name, "Switched active chain");
        Ok(&self.chains[idx])
    }

    /// The active chain
    pub fn current_chain(&self) -> &ChainEntry {
        let idx = match self.current.read() {
            Ok(current) => *current,
            Err(poisoned) => *poisoned.into_inner(),
        };
        &self.chains[idx]
    }

    /// The agent's own account, when a private key is configured
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Connected client wallet first, then the agent's own account
    pub fn resolve_address(&self, runtime: &dyn AgentRuntime) -> Result<Address> {
        runtime
            .wallet_address()
            .or(self.address)
            .ok_or_else(|| {
                Error::InvalidInput(
                    "No wallet address available. Connect a wallet or configure EVM_PRIVATE_KEY."
                        .to_string(),
                )
            })
    }
}

#[async_trait]
impl ContextProvider for WalletProvider {
    fn name(&self) -> &'static str {
        "evmWallet"
    }

    async fn get(
        &self,
        runtime: &dyn AgentRuntime,
        _message: &Memory,
        _state: &State,
    ) -> Result<String> {
        let chain = self.current_chain();
        let address = match self.resolve_address(runtime) {
            Ok(address) => address.to_checksum(None),
            Err(_) => "not connected".to_string(),
        };
        Ok(format!(
            "EVM Wallet Address: {}\nCurrent chain: {} ({})",
            address, chain.name, chain.id
        ))
    }
}
