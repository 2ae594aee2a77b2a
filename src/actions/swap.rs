//! `swapIcyToBtc`: prepare the approve + swap transactions for an ICY to BTC swap
//!
//! Checks run in order and each one short-circuits:
//! 1. wallet ICY balance lookup
//! 2. parameter extraction (BTC address, ICY amount)
//! 3. minimum amount
//! 4. amount not above the balance
//!
//! Only then is the backend asked for a quote and a signature. The resulting
//! payloads are returned to the client wallet; nothing is broadcast here.

use super::{
    emit, extract_params, resolve_state, Action, ActionExample, ActionResponse, HandlerCallback,
};
use crate::runtime::{AgentRuntime, Memory, State};
use crate::services::{
    calculate_icy_to_satoshi, estimate_net_satoshi, parse_token_amount, SwapBackend, SwapService,
    TokenService,
};
use crate::templates::SWAP_ICY_TO_BTC_TEMPLATE;
use crate::types::{CheckBalanceParams, SwapIcyToBtcParams, SwapTxParams, TokenBalance};
use crate::wallet::WalletProvider;
use crate::{Error, Result};
use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

const GENERIC_FAILURE: &str = "Sorry ser, I can't execute your query. Please try again";

pub struct SwapIcyToBtcAction {
    wallet: Arc<WalletProvider>,
    tokens: TokenService,
    swap: SwapService,
}

impl SwapIcyToBtcAction {
    pub fn new(swap: SwapService, wallet: Arc<WalletProvider>) -> Self {
        Self {
            tokens: TokenService::new(wallet.clone()),
            wallet,
            swap,
        }
    }

    /// Convenience constructor wiring a fresh [`SwapService`]
    pub fn with_backend(
        wallet: Arc<WalletProvider>,
        backend: Arc<dyn SwapBackend>,
        config: crate::config::SwapConfig,
    ) -> Self {
        Self::new(SwapService::new(wallet.clone(), backend, config), wallet)
    }

    async fn run(&self, runtime: &dyn AgentRuntime, state: &mut State) -> Result<ActionResponse> {
        let config = self.swap.config();
        let wallet_address = self.wallet.resolve_address(runtime)?;

        let balance = self
            .tokens
            .check_erc20_balance(&CheckBalanceParams {
                chain: config.chain.clone(),
                token_address: config.icy_token_address,
                wallet_address,
            })
            .await?;

        state.set("swapChain", config.chain.clone());
        let mut params: SwapIcyToBtcParams =
            extract_params(runtime, SWAP_ICY_TO_BTC_TEMPLATE, state).await?;
        params.btc_address = params.btc_address.trim().to_string();
        params.icy_amount = params.icy_amount.trim().to_string();

        tracing::info!(
            icy_amount = %params.icy_amount,
            btc_address = %params.btc_address,
            "Swap ICY to BTC requested"
        );

        if params.btc_address.is_empty() {
            return Err(Error::InvalidInput(
                "Invalid BTC address. Please provide a valid Bitcoin address.".to_string(),
            ));
        }

        let requested = parse_token_amount(&params.icy_amount, balance.decimals).map_err(|_| {
            Error::InvalidInput("Invalid ICY amount. Please provide a valid positive number.".to_string())
        })?;
        let minimum = parse_token_amount(&config.min_icy_amount, balance.decimals)?;

        if requested < minimum {
            return Ok(below_minimum(&config.min_icy_amount, &balance));
        }
        if requested > balance_base_units(&balance)? {
            return Ok(exceeds_balance(&params.icy_amount, &balance));
        }

        let info = self.swap.get_swap_info().await?;
        let satoshi = calculate_icy_to_satoshi(&params.icy_amount, &info.icy_satoshi_rate)?;
        params.satoshi_amount = Some(satoshi.clone());

        let signature = self
            .swap
            .generate_swap_signature(&params.btc_address, &params.icy_amount, &satoshi)
            .await?;

        let approve = self
            .swap
            .build_approve_token_tx(&signature.icy_amount, wallet_address)
            .await?;
        let swap = self
            .swap
            .build_swap_token_tx(
                &SwapTxParams::from_signature(&params.btc_address, &signature),
                wallet_address,
            )
            .await?;

        let estimate = estimate_net_satoshi(&satoshi, &info.min_satoshi_fee)?;

        Ok(ActionResponse {
            text: format!(
                "Prepared swap transaction of {} ICY tokens to approximately {} Satoshi. \
                 The BTC will be sent to {} after you approve and sign the transactions.",
                params.icy_amount, estimate, params.btc_address
            ),
            content: json!({
                "success": true,
                "transactions": [approve, swap],
                "type": "SWAP_ICY",
            }),
        })
    }
}

fn balance_base_units(balance: &TokenBalance) -> Result<U256> {
    match parse_units(&balance.balance, balance.decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Ok(U256::ZERO),
        Err(e) => Err(Error::ContractCall(format!(
            "Unreadable {} balance {}: {}",
            balance.symbol, balance.balance, e
        ))),
    }
}

/// Log a business-rule rejection and return its message
fn rejection(err: &Error) -> String {
    tracing::warn!(error = %err, code = err.code(), "Swap rejected");
    err.to_string()
}

fn below_minimum(minimum: &str, balance: &TokenBalance) -> ActionResponse {
    let err = Error::InsufficientBalance(format!(
        "Minimum ICY amount to swap is {} {}",
        minimum, balance.symbol
    ));

    ActionResponse {
        text: rejection(&err),
        content: json!({
            "success": false,
            "error": err.code(),
            "minimumRequired": minimum,
            "currentBalance": balance.balance,
            "tokenSymbol": balance.symbol,
            "tokenName": balance.token_name,
        }),
    }
}

fn exceeds_balance(requested: &str, balance: &TokenBalance) -> ActionResponse {
    let shown = Decimal::from_str(&balance.balance)
        .map(|d| format!("{:.2}", d))
        .unwrap_or_else(|_| balance.balance.clone());

    let err = Error::InsufficientBalance(format!(
        "You requested to swap {} {}, but you only have {} {} in your wallet. \
         Please adjust the amount.",
        requested, balance.symbol, shown, balance.symbol
    ));

    ActionResponse {
        text: rejection(&err),
        content: json!({
            "success": false,
            "error": "AMOUNT_EXCEEDS_BALANCE",
            "requestedAmount": requested,
            "currentBalance": balance.balance,
            "tokenSymbol": balance.symbol,
            "tokenName": balance.token_name,
        }),
    }
}

#[async_trait]
impl Action for SwapIcyToBtcAction {
    fn name(&self) -> &'static str {
        "swapIcyToBtc"
    }

    fn description(&self) -> &'static str {
        "Swap ICY tokens to BTC using the IcyBtcSwap contract"
    }

    fn similes(&self) -> &'static [&'static str] {
        &["SWAP_ICY", "EXCHANGE_ICY", "ICY_TO_BTC", "CONVERT_ICY"]
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        let turn = |user: &'static str, text: &'static str| ActionExample {
            user,
            text,
            action: "SWAP_ICY_TO_BTC",
        };
        vec![
            vec![
                turn("user", "I want to swap 10 ICY to BTC. My bitcoin address is bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"),
                turn("assistant", "I'll swap your ICY tokens to BTC"),
            ],
            vec![
                turn("user", "Can you swap 5.5 ICY to my Bitcoin address 3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy?"),
                turn("assistant", "I'll help you swap ICY tokens for Bitcoin"),
            ],
            vec![
                turn("user", "Please exchange my ICY tokens for Bitcoin. I need to swap 2.75 ICY to bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"),
                turn("assistant", "I'll initiate an ICY to BTC swap for you"),
            ],
            vec![
                turn("user", "swap 20 icy to btc address tb1qf06am7xd4tpmnuuw92rgtr48jzq84vr3ykp9hd"),
                turn("assistant", "I'll initiate an ICY to BTC swap for you"),
            ],
        ]
    }

    async fn validate(&self, _runtime: &dyn AgentRuntime) -> bool {
        true
    }

    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        _options: &Value,
        mut callback: Option<HandlerCallback<'_>>,
    ) -> bool {
        tracing::debug!(message_id = %message.id, "Swap ICY to BTC action handler called");

        let result = match resolve_state(runtime, message, state).await {
            Ok(mut state) => self.run(runtime, &mut state).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                let success = response.success();
                emit(&mut callback, response);
                success
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "Error preparing ICY to BTC swap");
                emit(&mut callback, ActionResponse::failure(GENERIC_FAILURE, &e));
                false
            }
        }
    }
}
