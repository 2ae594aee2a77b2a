//! Shared fakes for unit tests

use crate::runtime::{AgentRuntime, ParamExtractor};
use crate::services::abi::IERC20;
use crate::services::SwapBackend;
use crate::types::{IcySwapInfo, SignatureRequest, SignatureResponse};
use crate::wallet::{ChainEntry, EvmClient, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::{address, Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Anvil account #0
pub const TEST_WALLET: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvRestore(Vec<(String, Option<String>)>);

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in &self.0 {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Run `f` with env vars set (`Some`) or removed (`None`), serialized across tests
pub fn with_locked_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let _restore = EnvRestore(
        vars.iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect(),
    );
    for (key, value) in vars {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    f()
}

fn whole_tokens(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// Chain that serves a single 18-decimal "Icy Token" for any address
pub struct FakeEvmClient {
    balance: U256,
    allowance: U256,
    failing: bool,
    calls: AtomicUsize,
}

impl FakeEvmClient {
    pub const GAS: u64 = 46_000;
    pub const CHAIN_ID: u64 = 84532;

    /// Wallet holds `balance` whole ICY
    pub fn icy(balance: u64) -> Self {
        Self::with_balance(whole_tokens(balance))
    }

    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            allowance: U256::ZERO,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_allowance(mut self, allowance: U256) -> Self {
        self.allowance = allowance;
        self
    }

    /// Every `eth_call` and gas estimate errors
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of `eth_call`s served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvmClient for FakeEvmClient {
    async fn chain_id(&self) -> Result<u64> {
        Ok(Self::CHAIN_ID)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::ContractCall(
                "eth_call failed: connection refused".to_string(),
            ));
        }

        let input = tx.input.input().cloned().unwrap_or_default();
        if input.len() < 4 {
            return Err(Error::ContractCall("eth_call failed: empty calldata".to_string()));
        }
        let selector: [u8; 4] = [input[0], input[1], input[2], input[3]];

        let encoded = if selector == IERC20::decimalsCall::SELECTOR {
            IERC20::decimalsCall::abi_encode_returns(&18u8)
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            IERC20::balanceOfCall::abi_encode_returns(&self.balance)
        } else if selector == IERC20::symbolCall::SELECTOR {
            IERC20::symbolCall::abi_encode_returns(&"ICY".to_string())
        } else if selector == IERC20::nameCall::SELECTOR {
            IERC20::nameCall::abi_encode_returns(&"Icy Token".to_string())
        } else if selector == IERC20::allowanceCall::SELECTOR {
            IERC20::allowanceCall::abi_encode_returns(&self.allowance)
        } else {
            return Err(Error::ContractCall(
                "eth_call failed: execution reverted".to_string(),
            ));
        };
        Ok(encoded.into())
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> Result<u64> {
        if self.failing {
            return Err(Error::ContractCall(
                "Gas estimation failed: connection refused".to_string(),
            ));
        }
        Ok(Self::GAS)
    }
}

/// Provider configured for baseSepolia (active) and mainnet, both served by `client`
pub fn wallet_provider(client: Arc<FakeEvmClient>) -> Arc<WalletProvider> {
    let client: Arc<dyn EvmClient> = client;
    let provider = WalletProvider::new(
        vec![
            ChainEntry {
                name: "baseSepolia".to_string(),
                id: 84532,
                client: client.clone(),
            },
            ChainEntry {
                name: "mainnet".to_string(),
                id: 1,
                client,
            },
        ],
        Some(TEST_WALLET),
    )
    .expect("non-empty chain set");
    Arc::new(provider)
}

/// Backend that quotes a fixed rate and signs whatever it is asked to
pub struct FakeBackend {
    info: Option<IcySwapInfo>,
    info_calls: AtomicUsize,
    requests: Mutex<Vec<SignatureRequest>>,
}

impl FakeBackend {
    pub fn ok(rate: &str, min_fee: &str) -> Self {
        Self {
            info: Some(IcySwapInfo {
                icy_satoshi_rate: rate.to_string(),
                min_satoshi_fee: min_fee.to_string(),
                min_icy_to_swap: "20".to_string(),
                ..IcySwapInfo::default()
            }),
            info_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `swap_info` answers with a 503
    pub fn unavailable() -> Self {
        Self {
            info: None,
            info_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn signature_requests(&self) -> Vec<SignatureRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl SwapBackend for FakeBackend {
    async fn swap_info(&self) -> Result<IcySwapInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone().ok_or_else(|| {
            Error::RemoteService("Failed to fetch swap info: service unavailable".to_string())
        })
    }

    async fn generate_signature(&self, request: &SignatureRequest) -> Result<SignatureResponse> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(SignatureResponse {
            icy_amount: request.icy_amount.clone(),
            btc_amount: request.btc_amount.clone(),
            nonce: "7".to_string(),
            deadline: "1700000000".to_string(),
            signature: format!("0x{}", "ab".repeat(65)),
        })
    }
}

/// Extractor returning a canned object and recording the contexts it saw
#[derive(Default)]
pub struct StaticExtractor {
    value: Option<Value>,
    contexts: Mutex<Vec<String>>,
}

impl StaticExtractor {
    pub fn new(value: Value) -> Self {
        Self {
            value: Some(value),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().expect("contexts lock").clone()
    }
}

#[async_trait]
impl ParamExtractor for StaticExtractor {
    async fn extract(&self, context: &str, _schema: &Value) -> Result<Value> {
        self.contexts
            .lock()
            .expect("contexts lock")
            .push(context.to_string());
        self.value
            .clone()
            .ok_or_else(|| Error::Extraction("model returned no JSON object".to_string()))
    }
}

/// Runtime with in-memory settings
#[derive(Default)]
pub struct FakeRuntime {
    settings: HashMap<String, String>,
    wallet: Option<Address>,
    extractor: StaticExtractor,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_wallet(mut self, address: Address) -> Self {
        self.wallet = Some(address);
        self
    }

    pub fn with_extraction(mut self, value: Value) -> Self {
        self.extractor = StaticExtractor::new(value);
        self
    }

    pub fn contexts(&self) -> Vec<String> {
        self.extractor.contexts()
    }
}

impl AgentRuntime for FakeRuntime {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn wallet_address(&self) -> Option<Address> {
        self.wallet
    }

    fn extractor(&self) -> &dyn ParamExtractor {
        &self.extractor
    }
}
