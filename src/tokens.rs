//! Well-known token registry
//!
//! Token hints handed to the parameter extractor so it can map a token name
//! ("usdc on base-sepolia") to a contract address, plus a metadata fallback
//! for display.

use crate::config::rpc::chains;
use alloy::primitives::{address, Address};

/// Token metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token symbol (e.g., "USDC", "ICY")
    pub symbol: &'static str,
    /// Number of decimals
    pub decimals: u8,
    pub chain_id: u64,
    pub address: Address,
}

/// Well-known token addresses per chain
pub mod addresses {
    use super::*;

    // === Base Sepolia ===
    pub const ICY_BASE_SEPOLIA: Address = address!("5233E10cc24736F107fEda42ff0157e91Cf1F8b6");
    pub const USDC_BASE_SEPOLIA: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");
    pub const WETH_BASE_SEPOLIA: Address = address!("4200000000000000000000000000000000000006");

    // === Ethereum Mainnet ===
    pub const USDC_ETH: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const DAI_ETH: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    // === Base ===
    pub const USDC_BASE: Address = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");
}

const KNOWN_TOKENS: &[TokenInfo] = &[
    TokenInfo {
        symbol: "ICY",
        decimals: 18,
        chain_id: chains::BASE_SEPOLIA,
        address: addresses::ICY_BASE_SEPOLIA,
    },
    TokenInfo {
        symbol: "USDC",
        decimals: 6,
        chain_id: chains::BASE_SEPOLIA,
        address: addresses::USDC_BASE_SEPOLIA,
    },
    TokenInfo {
        symbol: "WETH",
        decimals: 18,
        chain_id: chains::BASE_SEPOLIA,
        address: addresses::WETH_BASE_SEPOLIA,
    },
    TokenInfo {
        symbol: "USDC",
        decimals: 6,
        chain_id: chains::MAINNET,
        address: addresses::USDC_ETH,
    },
    TokenInfo {
        symbol: "DAI",
        decimals: 18,
        chain_id: chains::MAINNET,
        address: addresses::DAI_ETH,
    },
    TokenInfo {
        symbol: "WETH",
        decimals: 18,
        chain_id: chains::MAINNET,
        address: addresses::WETH_ETH,
    },
    TokenInfo {
        symbol: "USDC",
        decimals: 6,
        chain_id: chains::BASE,
        address: addresses::USDC_BASE,
    },
    TokenInfo {
        symbol: "WETH",
        decimals: 18,
        chain_id: chains::BASE,
        address: addresses::WETH_BASE,
    },
];

/// Find a token by chain and address
pub fn lookup(chain_id: u64, address: &Address) -> Option<&'static TokenInfo> {
    KNOWN_TOKENS
        .iter()
        .find(|t| t.chain_id == chain_id && &t.address == address)
}

/// Find a token by chain and symbol (case-insensitive)
pub fn by_symbol(chain_id: u64, symbol: &str) -> Option<&'static TokenInfo> {
    KNOWN_TOKENS
        .iter()
        .find(|t| t.chain_id == chain_id && t.symbol.eq_ignore_ascii_case(symbol))
}

/// Tokens known on a chain
pub fn tokens_for_chain(chain_id: u64) -> impl Iterator<Item = &'static TokenInfo> {
    KNOWN_TOKENS.iter().filter(move |t| t.chain_id == chain_id)
}

/// Render token hints for the given chains, one line per token
pub fn prompt_hints<'a>(chains: impl IntoIterator<Item = &'a str>) -> String {
    let mut lines = Vec::new();
    for name in chains {
        let Some(chain) = crate::config::rpc::chain_by_name(name) else {
            continue;
        };
        for token in tokens_for_chain(chain.id) {
            lines.push(format!(
                "- For {} on {}, token address is {}",
                token.symbol, chain.name, token.address
            ));
        }
    }
    lines.join("\n")
}
