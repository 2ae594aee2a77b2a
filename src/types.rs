//! Request-scoped value objects shared by services and actions.
//!
//! Nothing here is persisted; every value lives for a single action run.

use alloy::primitives::{Address, Bytes, U256};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Normalized ERC-20 balance for one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Balance formatted with the token's decimals ("12.5")
    pub balance: String,
    pub symbol: String,
    pub token_name: String,
    /// Chain name as configured ("baseSepolia")
    pub chain: String,
    #[ts(type = "number")]
    pub chain_id: u64,
    #[ts(type = "string")]
    pub token_address: Address,
    pub decimals: u8,
}

/// Inputs for a balance lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBalanceParams {
    pub chain: String,
    pub token_address: Address,
    pub wallet_address: Address,
}

/// What the extractor is asked to produce for a balance check
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedBalanceParams {
    /// Chain name, one of the supported chains
    pub chain: String,
    /// ERC-20 contract address (0x-prefixed)
    pub token_address: String,
}

/// What the extractor is asked to produce for a swap
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapIcyToBtcParams {
    /// Bitcoin address that receives the BTC
    pub btc_address: String,
    /// Amount of ICY to swap, as a decimal string
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub icy_amount: String,
    /// Computed from the backend rate, never user-supplied
    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub satoshi_amount: Option<String>,
}

/// Accept `"20"` or `20` and keep the decimal text
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Envelope used by every backend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: String,
}

/// Rate and fee snapshot from the swap backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcySwapInfo {
    pub circulated_icy_balance: String,
    pub icy_satoshi_rate: String,
    pub icy_usd_rate: String,
    pub min_icy_to_swap: String,
    pub min_satoshi_fee: String,
    pub satoshi_balance: String,
    pub satoshi_per_usd: f64,
    pub satoshi_usd_rate: String,
    pub service_fee_rate: f64,
}

/// Body of the signature request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub btc_address: String,
    /// ICY amount in base units (18 decimals)
    pub icy_amount: String,
    /// Satoshi amount
    pub btc_amount: String,
}

/// Backend-issued swap authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub icy_amount: String,
    pub btc_amount: String,
    pub nonce: String,
    pub deadline: String,
    /// Hex signature, with or without 0x
    pub signature: String,
}

/// Arguments of the on-chain `swap` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTxParams {
    pub icy_amount: String,
    pub btc_address: String,
    pub btc_amount: String,
    pub nonce: String,
    pub deadline: String,
    pub signature: String,
}

impl SwapTxParams {
    pub fn from_signature(btc_address: &str, signature: &SignatureResponse) -> Self {
        Self {
            icy_amount: signature.icy_amount.clone(),
            btc_address: btc_address.to_string(),
            btc_amount: signature.btc_amount.clone(),
            nonce: signature.nonce.clone(),
            deadline: signature.deadline.clone(),
            signature: signature.signature.clone(),
        }
    }
}

/// Unsigned transaction handed to the client wallet for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TxPayload {
    #[ts(type = "string")]
    pub from: Address,
    #[ts(type = "string")]
    pub to: Address,
    #[ts(type = "string")]
    pub data: Bytes,
    #[ts(type = "string")]
    pub value: U256,
    /// Left unset when the signing wallet has to estimate it
    #[ts(type = "number | null")]
    pub gas: Option<u64>,
    #[ts(type = "number")]
    pub chain_id: u64,
}
