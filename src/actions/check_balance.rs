//! `checkBalance`: report the wallet's balance of an ERC-20 token

use super::{
    emit, extract_params, resolve_state, Action, ActionExample, ActionResponse, HandlerCallback,
};
use crate::config::PRIVATE_KEY_SETTING;
use crate::runtime::{AgentRuntime, Memory, State};
use crate::services::TokenService;
use crate::templates::CHECK_BALANCE_TEMPLATE;
use crate::tokens;
use crate::types::{CheckBalanceParams, ExtractedBalanceParams, TokenBalance};
use crate::wallet::WalletProvider;
use crate::{Error, Result};
use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

pub struct CheckBalanceAction {
    wallet: Arc<WalletProvider>,
    tokens: TokenService,
}

impl CheckBalanceAction {
    pub fn new(wallet: Arc<WalletProvider>) -> Self {
        let tokens = TokenService::new(wallet.clone());
        Self { wallet, tokens }
    }

    /// Extract chain and token, then validate both before touching the chain
    async fn build_params(
        &self,
        runtime: &dyn AgentRuntime,
        state: &mut State,
    ) -> Result<CheckBalanceParams> {
        let chains = self.wallet.chain_names();
        state.set(
            "supportedChains",
            chains
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join("|"),
        );
        state.set("defaultChain", self.wallet.current_chain().name.clone());
        state.set(
            "knownTokens",
            tokens::prompt_hints(chains.iter().map(String::as_str)),
        );

        let extracted: ExtractedBalanceParams =
            extract_params(runtime, CHECK_BALANCE_TEMPLATE, state).await?;

        tracing::info!(
            token = %extracted.token_address,
            chain = %extracted.chain,
            "Check balance requested"
        );

        let chain = self.wallet.chain(&extracted.chain)?;
        let token_address = Address::from_str(extracted.token_address.trim()).map_err(|e| {
            Error::InvalidInput(format!(
                "Invalid token address {}: {}",
                extracted.token_address, e
            ))
        })?;

        Ok(CheckBalanceParams {
            chain: chain.name.clone(),
            token_address,
            wallet_address: self.wallet.resolve_address(runtime)?,
        })
    }

    /// Balance plus the wallet it was read for
    async fn run(
        &self,
        runtime: &dyn AgentRuntime,
        state: &mut State,
    ) -> Result<(Address, TokenBalance)> {
        let params = self.build_params(runtime, state).await?;
        let balance = self.tokens.check_erc20_balance(&params).await?;
        Ok((params.wallet_address, balance))
    }
}

fn balance_response(wallet: Address, balance: &TokenBalance) -> ActionResponse {
    ActionResponse {
        text: format!(
            "Your wallet ({}) has a balance of {} {} ({}) on {}",
            wallet, balance.balance, balance.symbol, balance.token_name, balance.chain
        ),
        content: json!({
            "success": true,
            "address": wallet,
            "balance": balance.balance,
            "symbol": balance.symbol,
            "tokenName": balance.token_name,
            "chain": balance.chain,
            "chainId": balance.chain_id,
            "tokenAddress": balance.token_address,
        }),
    }
}

#[async_trait]
impl Action for CheckBalanceAction {
    fn name(&self) -> &'static str {
        "checkBalance"
    }

    fn description(&self) -> &'static str {
        "Check the balance of an token on a specific chain"
    }

    fn similes(&self) -> &'static [&'static str] {
        &["CHECK_TOKEN_BALANCE", "GET_BALANCE", "TOKEN_BALANCE", "BALANCE"]
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            vec![
                ActionExample {
                    user: "user",
                    text: "What's my USDC balance on baseSepolia?",
                    action: "CHECK_BALANCE",
                },
                ActionExample {
                    user: "assistant",
                    text: "I'll check your USDC balance on Base Sepolia",
                    action: "CHECK_BALANCE",
                },
            ],
            vec![
                ActionExample {
                    user: "user",
                    text: "Show me my DAI token balance on Ethereum",
                    action: "CHECK_BALANCE",
                },
                ActionExample {
                    user: "assistant",
                    text: "I'll check your token balance",
                    action: "CHECK_BALANCE",
                },
            ],
            vec![
                ActionExample {
                    user: "user",
                    text: "Can you check my balance for token 0x4200000000000000000000000000000000000006 on base-sepolia?",
                    action: "CHECK_BALANCE",
                },
                ActionExample {
                    user: "assistant",
                    text: "I'll check the balance of that token",
                    action: "CHECK_BALANCE",
                },
            ],
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime) -> bool {
        runtime
            .get_setting(PRIVATE_KEY_SETTING)
            .is_some_and(|key| key.starts_with("0x"))
    }

    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        _options: &Value,
        mut callback: Option<HandlerCallback<'_>>,
    ) -> bool {
        tracing::debug!(message_id = %message.id, "Check balance action handler called");

        let result = match resolve_state(runtime, message, state).await {
            Ok(mut state) => self.run(runtime, &mut state).await,
            Err(e) => Err(e),
        };

        match result {
            Ok((wallet, balance)) => {
                emit(&mut callback, balance_response(wallet, &balance));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.code(), "Error checking balance");
                emit(
                    &mut callback,
                    ActionResponse::failure(format!("Error checking token balance: {}", e), &e),
                );
                false
            }
        }
    }
}
