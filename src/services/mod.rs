//! Token balance and swap services
//!
//! Services are plain request/response glue over the chain ([`crate::wallet::EvmClient`])
//! and the swap backend ([`SwapBackend`]).

pub mod abi;
mod backend;
mod swap;
mod token;

pub use backend::{HttpSwapBackend, SwapBackend};
pub use swap::{calculate_icy_to_satoshi, estimate_net_satoshi, parse_token_amount, SwapService};
pub use token::{format_units, TokenService};
