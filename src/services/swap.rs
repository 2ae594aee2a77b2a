//! ICY to BTC swap preparation
//!
//! Payload-only: the service quotes, obtains a backend authorization and
//! encodes the `approve` + `swap` calls. It never signs or broadcasts; the
//! connected client wallet does that.

use super::abi::{IIcyBtcSwap, IERC20};
use super::backend::SwapBackend;
use super::token::read_contract;
use crate::config::SwapConfig;
use crate::types::{IcySwapInfo, SignatureRequest, SignatureResponse, SwapTxParams, TxPayload};
use crate::wallet::{ChainEntry, WalletProvider};
use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// Builds swap quotes and unsigned transactions
#[derive(Clone)]
pub struct SwapService {
    wallet: Arc<WalletProvider>,
    backend: Arc<dyn SwapBackend>,
    config: SwapConfig,
}

impl SwapService {
    pub fn new(
        wallet: Arc<WalletProvider>,
        backend: Arc<dyn SwapBackend>,
        config: SwapConfig,
    ) -> Self {
        Self {
            wallet,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    /// Rate and fee snapshot; fetched per attempt, never cached
    pub async fn get_swap_info(&self) -> Result<IcySwapInfo> {
        let info = self.backend.swap_info().await?;
        tracing::info!(
            icy_satoshi_rate = %info.icy_satoshi_rate,
            min_satoshi_fee = %info.min_satoshi_fee,
            "Fetched swap info"
        );
        Ok(info)
    }

    /// Request a backend authorization for swapping `icy_amount` (human-readable)
    pub async fn generate_swap_signature(
        &self,
        btc_address: &str,
        icy_amount: &str,
        satoshi_amount: &str,
    ) -> Result<SignatureResponse> {
        let icy_base_units = parse_token_amount(icy_amount, self.config.icy_decimals)?;

        let request = SignatureRequest {
            btc_address: btc_address.to_string(),
            icy_amount: icy_base_units.to_string(),
            btc_amount: satoshi_amount.to_string(),
        };

        self.backend.generate_signature(&request).await
    }

    /// Current ICY allowance `owner` has granted the swap contract
    pub async fn current_allowance(&self, owner: Address) -> Result<U256> {
        let chain = self.swap_chain()?;
        read_contract(
            chain.client.as_ref(),
            self.config.icy_token_address,
            IERC20::allowanceCall {
                owner,
                spender: self.config.swap_contract_address,
            },
        )
        .await
    }

    /// Unsigned ERC-20 `approve(swapContract, amount)`; `amount` is in base units
    pub async fn build_approve_token_tx(
        &self,
        amount: &str,
        wallet_address: Address,
    ) -> Result<TxPayload> {
        let amount = parse_base_units(amount, "icy_amount")?;
        let chain = self.swap_chain()?;

        let data = IERC20::approveCall {
            spender: self.config.swap_contract_address,
            amount,
        }
        .abi_encode();

        let to = self.config.icy_token_address;
        let tx = TransactionRequest::default()
            .from(wallet_address)
            .to(to)
            .input(Bytes::from(data.clone()).into());

        let gas = chain.client.estimate_gas(tx).await?;
        let chain_id = chain.client.chain_id().await?;

        tracing::info!(
            token = %to,
            spender = %self.config.swap_contract_address,
            amount = %amount,
            gas,
            chain_id,
            "Built approve transaction"
        );

        Ok(TxPayload {
            from: wallet_address,
            to,
            data: data.into(),
            value: U256::ZERO,
            gas: Some(gas),
            chain_id,
        })
    }

    /// Unsigned `swap(icyAmount, btcAddress, btcAmount, nonce, deadline, signature)`
    ///
    /// Gas is left to the signing wallet: estimating here would revert until
    /// the approval is mined.
    pub async fn build_swap_token_tx(
        &self,
        params: &SwapTxParams,
        wallet_address: Address,
    ) -> Result<TxPayload> {
        let chain = self.swap_chain()?;

        let signature = decode_signature(&params.signature)?;
        let data = IIcyBtcSwap::swapCall {
            icyAmount: parse_base_units(&params.icy_amount, "icy_amount")?,
            btcAddress: params.btc_address.clone(),
            btcAmount: parse_base_units(&params.btc_amount, "btc_amount")?,
            nonce: parse_base_units(&params.nonce, "nonce")?,
            deadline: parse_base_units(&params.deadline, "deadline")?,
            signature,
        }
        .abi_encode();

        let chain_id = chain.client.chain_id().await?;

        tracing::info!(
            contract = %self.config.swap_contract_address,
            btc_address = %params.btc_address,
            nonce = %params.nonce,
            chain_id,
            "Built swap transaction"
        );

        Ok(TxPayload {
            from: wallet_address,
            to: self.config.swap_contract_address,
            data: data.into(),
            value: U256::ZERO,
            gas: None,
            chain_id,
        })
    }

    fn swap_chain(&self) -> Result<&ChainEntry> {
        self.wallet.chain(&self.config.chain)
    }
}

/// Satoshi for `icy_amount` at `rate` satoshi per ICY, floored to whole satoshi
pub fn calculate_icy_to_satoshi(icy_amount: &str, rate: &str) -> Result<String> {
    let icy = parse_decimal(icy_amount, "ICY amount")?;
    let rate = parse_decimal(rate, "ICY/satoshi rate")?;

    let satoshi = icy
        .checked_mul(rate)
        .ok_or_else(|| Error::InvalidInput("ICY amount is too large to quote".to_string()))?;

    Ok(satoshi.floor().normalize().to_string())
}

/// User-facing estimate after the minimum fee, floored at zero
pub fn estimate_net_satoshi(satoshi_amount: &str, min_satoshi_fee: &str) -> Result<String> {
    let satoshi = parse_decimal(satoshi_amount, "satoshi amount")?;
    let fee = if min_satoshi_fee.trim().is_empty() {
        Decimal::ZERO
    } else {
        parse_decimal(min_satoshi_fee, "minimum satoshi fee")?
    };

    let net = satoshi
        .checked_sub(fee)
        .ok_or_else(|| {
            Error::RemoteService(format!(
                "Minimum satoshi fee {} cannot be applied to {}",
                min_satoshi_fee, satoshi_amount
            ))
        })?
        .max(Decimal::ZERO);
    Ok(net.floor().normalize().to_string())
}

/// Parse a positive human-readable amount into base units
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<U256> {
    let invalid = || {
        Error::InvalidInput(format!(
            "Invalid amount {:?}. Please provide a valid positive number.",
            amount
        ))
    };

    match parse_units(amount.trim(), decimals).map_err(|_| invalid())? {
        ParseUnits::U256(value) if !value.is_zero() => Ok(value),
        _ => Err(invalid()),
    }
}

fn parse_decimal(value: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid {} {:?}: {}", what, value, e)))
}

fn parse_base_units(value: &str, field: &str) -> Result<U256> {
    U256::from_str(value.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid {} {:?}: {}", field, value, e)))
}

fn decode_signature(signature: &str) -> Result<Bytes> {
    let raw = signature.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw)
        .map(Bytes::from)
        .map_err(|e| Error::InvalidInput(format!("Invalid swap signature: {}", e)))
}
