//! RPC endpoint configuration and the known chain registry
//!
//! RPC URLs are resolved per chain id:
//! 1. Per-chain env vars (ETH_RPC_URL, BASE_SEPOLIA_RPC_URL, etc.) - highest priority
//! 2. ALCHEMY_API_KEY - builds URLs automatically
//! 3. Public RPC fallbacks - for testing only
//!
//! # Examples
//!
//! ```bash
//! # Option 1: Per-chain URLs (recommended)
//! export BASE_SEPOLIA_RPC_URL="https://base-sepolia.g.alchemy.com/v2/YOUR_KEY"
//!
//! # Option 2: Single provider API key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//! ```

use std::collections::HashMap;

/// Chain ID constants
pub mod chains {
    pub const MAINNET: u64 = 1;
    pub const SEPOLIA: u64 = 11155111;
    pub const BASE: u64 = 8453;
    pub const BASE_SEPOLIA: u64 = 84532;
    pub const ARBITRUM: u64 = 42161;
    pub const OPTIMISM: u64 = 10;
}

/// A chain the plugin knows how to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Canonical name, as the agent sees it (e.g. "baseSepolia")
    pub name: &'static str,
    pub id: u64,
    /// Per-chain env var override
    env_var: &'static str,
    /// Alchemy network slug
    alchemy_slug: &'static str,
    /// Public endpoint (rate limited, for testing only)
    public_rpc: &'static str,
}

const KNOWN_CHAINS: &[ChainInfo] = &[
    ChainInfo {
        name: "mainnet",
        id: chains::MAINNET,
        env_var: "ETH_RPC_URL",
        alchemy_slug: "eth-mainnet",
        public_rpc: "https://eth.llamarpc.com",
    },
    ChainInfo {
        name: "sepolia",
        id: chains::SEPOLIA,
        env_var: "SEPOLIA_RPC_URL",
        alchemy_slug: "eth-sepolia",
        public_rpc: "https://ethereum-sepolia-rpc.publicnode.com",
    },
    ChainInfo {
        name: "base",
        id: chains::BASE,
        env_var: "BASE_RPC_URL",
        alchemy_slug: "base-mainnet",
        public_rpc: "https://mainnet.base.org",
    },
    ChainInfo {
        name: "baseSepolia",
        id: chains::BASE_SEPOLIA,
        env_var: "BASE_SEPOLIA_RPC_URL",
        alchemy_slug: "base-sepolia",
        public_rpc: "https://sepolia.base.org",
    },
    ChainInfo {
        name: "arbitrum",
        id: chains::ARBITRUM,
        env_var: "ARBITRUM_RPC_URL",
        alchemy_slug: "arb-mainnet",
        public_rpc: "https://arb1.arbitrum.io/rpc",
    },
    ChainInfo {
        name: "optimism",
        id: chains::OPTIMISM,
        env_var: "OPTIMISM_RPC_URL",
        alchemy_slug: "opt-mainnet",
        public_rpc: "https://mainnet.optimism.io",
    },
];

const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";

/// Lowercase and drop `-`/`_` so "base-sepolia" and "baseSepolia" match
pub fn normalize_chain_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Look up a known chain by name
pub fn chain_by_name(name: &str) -> Option<&'static ChainInfo> {
    let wanted = normalize_chain_name(name);
    KNOWN_CHAINS
        .iter()
        .find(|c| normalize_chain_name(c.name) == wanted)
}

/// All chains the registry knows about
pub fn known_chains() -> &'static [ChainInfo] {
    KNOWN_CHAINS
}

/// RPC configuration for multiple chains
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        let mut urls = HashMap::new();

        for chain in KNOWN_CHAINS {
            if let Ok(url) = std::env::var(chain.env_var) {
                tracing::debug!(chain = chain.name, env_var = chain.env_var, "Using RPC URL from env");
                urls.insert(chain.id, url);
            }
        }

        if let Ok(key) = std::env::var(ALCHEMY_API_KEY) {
            for chain in KNOWN_CHAINS {
                urls.entry(chain.id).or_insert_with(|| {
                    format!("https://{}.g.alchemy.com/v2/{}", chain.alchemy_slug, key)
                });
            }
        }

        for chain in KNOWN_CHAINS {
            urls.entry(chain.id).or_insert_with(|| {
                tracing::debug!(chain = chain.name, "No RPC configured, using public RPC (rate limited)");
                chain.public_rpc.to_string()
            });
        }

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }

    /// Check if a chain is configured
    pub fn has_chain(&self, chain_id: u64) -> bool {
        self.urls.contains_key(&chain_id)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::with_locked_env;

    #[test]
    fn test_chain_lookup_ignores_case_and_separators() {
        assert_eq!(chain_by_name("baseSepolia").unwrap().id, chains::BASE_SEPOLIA);
        assert_eq!(chain_by_name("base-sepolia").unwrap().id, chains::BASE_SEPOLIA);
        assert_eq!(chain_by_name("BASE_SEPOLIA").unwrap().name, "baseSepolia");
        assert_eq!(chain_by_name("mainnet").unwrap().id, chains::MAINNET);
        assert!(chain_by_name("polygon").is_none());
    }

    #[test]
    fn test_public_rpc_fallbacks() {
        let config = with_locked_env(
            &[
                ("BASE_SEPOLIA_RPC_URL", None),
                ("ETH_RPC_URL", None),
                (ALCHEMY_API_KEY, None),
            ],
            RpcConfig::from_env,
        );

        assert_eq!(config.get(chains::BASE_SEPOLIA), Some("https://sepolia.base.org"));
        assert_eq!(config.get(chains::MAINNET), Some("https://eth.llamarpc.com"));
        assert!(known_chains().iter().all(|c| config.has_chain(c.id)));
    }

    #[test]
    fn test_env_override_beats_alchemy() {
        let config = with_locked_env(
            &[
                ("BASE_SEPOLIA_RPC_URL", Some("https://custom.rpc")),
                ("BASE_RPC_URL", None),
                (ALCHEMY_API_KEY, Some("KEY")),
            ],
            RpcConfig::from_env,
        );

        assert_eq!(config.get(chains::BASE_SEPOLIA), Some("https://custom.rpc"));
        assert_eq!(
            config.get(chains::BASE),
            Some("https://base-mainnet.g.alchemy.com/v2/KEY")
        );
    }

    #[test]
    fn test_get_returns_url() {
        let mut urls = HashMap::new();
        urls.insert(1, "https://custom.rpc".to_string());
        let config = RpcConfig::with_urls(urls);

        assert_eq!(config.get(1), Some("https://custom.rpc"));
        assert_eq!(config.get(999), None);
    }
}
