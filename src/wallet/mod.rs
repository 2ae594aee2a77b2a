//! Wallet access for the plugin
//!
//! The private key only ever lives inside [`SecureWallet`]; everything else
//! sees the public address and an [`EvmClient`] per configured chain.

mod client;
mod provider;
mod signer;

pub use client::{EvmClient, RpcEvmClient};
pub use provider::{ChainEntry, WalletProvider};
pub use signer::SecureWallet;
