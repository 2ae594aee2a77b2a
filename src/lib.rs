//! ICY Swap Agent
//!
//! A conversational-agent plugin that lets a chat agent:
//! - Check ERC-20 token balances on configured EVM chains
//! - Prepare an ICY to BTC swap: quote via the swap backend, obtain a signed
//!   authorization, and build the approve + swap transactions
//!
//! # Security Model
//!
//! - Swap transactions are returned unsigned for the connected client wallet
//! - Private keys never leave the wallet module and are never logged
//! - Every action dispatch can be recorded to a JSONL audit trail

pub mod actions;
pub mod config;
pub mod llm;
pub mod plugin;
pub mod runtime;
pub mod services;
pub mod templates;
pub mod tokens;
pub mod types;
pub mod wallet;

mod error;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use actions::{Action, ActionResponse};
pub use config::{Config, RpcConfig};
pub use error::{Error, Result};
pub use plugin::Plugin;
pub use runtime::{AgentRuntime, Memory, ParamExtractor, State};
