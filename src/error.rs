//! Error types for the ICY swap agent plugin

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "The chain {chain} not configured yet. Add the chain or choose one from configured: {}",
        .configured.join(",")
    )]
    ChainNotConfigured {
        chain: String,
        configured: Vec<String>,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    RemoteService(String),

    #[error("{0}")]
    ContractCall(String),

    #[error("Parameter extraction failed: {0}")]
    Extraction(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable code placed in failure callback content
    pub fn code(&self) -> &'static str {
        match self {
            Error::ChainNotConfigured { .. } => "CHAIN_NOT_CONFIGURED",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            Error::RemoteService(_) => "REMOTE_SERVICE_ERROR",
            Error::ContractCall(_) => "CONTRACT_CALL_ERROR",
            Error::Extraction(_) | Error::Json(_) => "EXTRACTION_ERROR",
            Error::Wallet(_) => "WALLET_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
