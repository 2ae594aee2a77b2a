//! Configuration for the ICY swap agent plugin

pub mod rpc;

use crate::{Error, Result};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export RPC config
pub use rpc::{ChainInfo, RpcConfig};

/// Runtime setting holding the agent's EVM private key
pub const PRIVATE_KEY_SETTING: &str = "EVM_PRIVATE_KEY";

/// Environment variable overriding the swap backend base URL
pub const BACKEND_URL_ENV: &str = "ICY_BACKEND_URL";

/// Remote swap backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, without the `/api/v1` suffix
    pub base_url: String,
}

impl BackendConfig {
    pub fn swap_info_url(&self) -> String {
        format!("{}/api/v1/swap/info", self.base_url.trim_end_matches('/'))
    }

    pub fn signature_url(&self) -> String {
        format!(
            "{}/api/v1/swap/generate-signature",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://develop-backend.icy.so".to_string(),
        }
    }
}

/// ICY to BTC swap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Chain the ICY token and swap contract live on
    pub chain: String,
    /// ICY ERC-20 token
    pub icy_token_address: Address,
    /// IcyBtcSwap contract
    pub swap_contract_address: Address,
    /// Minimum ICY amount per swap (human-readable)
    pub min_icy_amount: String,
    /// ICY token decimals used for base-unit conversion
    pub icy_decimals: u8,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            chain: "baseSepolia".to_string(),
            icy_token_address: address!("5233E10cc24736F107fEda42ff0157e91Cf1F8b6"),
            swap_contract_address: address!("175c2adA4a0b1AC1cc9717F4E47b6868332bad76"),
            min_icy_amount: "20".to_string(),
            icy_decimals: 18,
        }
    }
}

/// Settings for the OpenAI-compatible parameter extractor used by the CLI host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions base URL
    pub base_url: String,
    pub model: String,
    /// Name of the env var holding the API key
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chains the wallet provider is configured for
    pub chains: Vec<String>,
    /// Swap backend settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Swap settings
    #[serde(default)]
    pub swap: SwapConfig,
    /// Parameter extractor settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Path to audit log file; `null` turns auditing off
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: Option<String>,
}

fn default_audit_log_path() -> Option<String> {
    Some("audit.jsonl".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chains: vec!["baseSepolia".to_string()],
            backend: BackendConfig::default(),
            swap: SwapConfig::default(),
            llm: LlmConfig::default(),
            audit_log_path: default_audit_log_path(),
        }
    }
}

impl Config {
    /// Load from a JSON file (or defaults), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
            }
            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            tracing::debug!(url = %url, "Using swap backend URL from env");
            self.backend.base_url = url;
        }
    }

    /// Every configured chain (and the swap chain) must be a known chain
    pub fn validate(&self) -> Result<()> {
        if self.chains.is_empty() {
            return Err(Error::Config("at least one chain must be configured".to_string()));
        }
        for name in self.chains.iter().chain(std::iter::once(&self.swap.chain)) {
            if rpc::chain_by_name(name).is_none() {
                return Err(Error::Config(format!("Unknown chain: {}", name)));
            }
        }
        if !self
            .chains
            .iter()
            .any(|c| rpc::normalize_chain_name(c) == rpc::normalize_chain_name(&self.swap.chain))
        {
            return Err(Error::Config(format!(
                "Swap chain {} is not in the configured chains",
                self.swap.chain
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::with_locked_env;

    #[test]
    fn config_deserialize_defaults() {
        let value = serde_json::json!({
            "chains": ["baseSepolia", "mainnet"]
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.swap.min_icy_amount, "20");
        assert_eq!(parsed.swap.icy_decimals, 18);
        assert_eq!(parsed.audit_log_path, Config::default().audit_log_path);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn audit_log_can_be_disabled() {
        let parsed: Config = serde_json::from_value(serde_json::json!({
            "chains": ["baseSepolia"],
            "audit_log_path": null
        }))
        .expect("parse config");
        assert!(parsed.audit_log_path.is_none());
    }

    #[test]
    fn config_rejects_unknown_chain() {
        let mut config = Config::default();
        config.chains.push("polygon".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn config_requires_swap_chain_in_chain_set() {
        let mut config = Config::default();
        config.chains = vec!["mainnet".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn backend_urls_are_derived_from_base() {
        let backend = BackendConfig {
            base_url: "http://localhost:8080/".to_string(),
        };
        assert_eq!(backend.swap_info_url(), "http://localhost:8080/api/v1/swap/info");
        assert_eq!(
            backend.signature_url(),
            "http://localhost:8080/api/v1/swap/generate-signature"
        );
    }

    #[test]
    fn load_reads_file_and_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"chains": ["base-sepolia"], "swap": {"chain": "baseSepolia",
               "icy_token_address": "0x5233E10cc24736F107fEda42ff0157e91Cf1F8b6",
               "swap_contract_address": "0x175c2adA4a0b1AC1cc9717F4E47b6868332bad76",
               "min_icy_amount": "25", "icy_decimals": 18}}"#,
        )
        .unwrap();

        let config = with_locked_env(&[(BACKEND_URL_ENV, Some("http://backend.test"))], || {
            Config::load(Some(&path))
        })
        .unwrap();

        assert_eq!(config.swap.min_icy_amount, "25");
        assert_eq!(config.backend.base_url, "http://backend.test");
    }
}
