//! ERC-20 balance lookups
//!
//! Read-only: four `eth_call`s per lookup (decimals, balanceOf, symbol, name).

use super::abi::IERC20;
use crate::types::{CheckBalanceParams, TokenBalance};
use crate::wallet::{EvmClient, WalletProvider};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use std::sync::Arc;

/// Reads ERC-20 state through the wallet provider's clients
#[derive(Debug, Clone)]
pub struct TokenService {
    wallet: Arc<WalletProvider>,
}

impl TokenService {
    pub fn new(wallet: Arc<WalletProvider>) -> Self {
        Self { wallet }
    }

    /// Switch to `params.chain` and read the wallet's balance of `params.token_address`
    pub async fn check_erc20_balance(&self, params: &CheckBalanceParams) -> Result<TokenBalance> {
        let chain = self.wallet.switch_chain(&params.chain)?;

        tracing::info!(
            chain = %chain.name,
            token = %params.token_address,
            wallet = %params.wallet_address,
            "Checking ERC-20 balance"
        );

        let client = chain.client.as_ref();
        let token = params.token_address;
        let read = async {
            let decimals = read_contract(client, token, IERC20::decimalsCall {}).await?;
            let balance = read_contract(
                client,
                token,
                IERC20::balanceOfCall {
                    account: params.wallet_address,
                },
            )
            .await?;
            let symbol = read_contract(client, token, IERC20::symbolCall {}).await?;
            let name = read_contract(client, token, IERC20::nameCall {}).await?;
            Ok::<_, Error>((decimals, balance, symbol, name))
        };

        let (decimals, balance, symbol, name) = read
            .await
            .map_err(|e| Error::ContractCall(format!("balance check failed: {}", e)))?;

        Ok(TokenBalance {
            balance: format_units(balance, decimals as u32),
            symbol,
            token_name: name,
            chain: chain.name.clone(),
            chain_id: chain.id,
            token_address: token,
            decimals,
        })
    }
}

/// `eth_call` a view function and decode its single return value
pub(crate) async fn read_contract<C: SolCall>(
    client: &dyn EvmClient,
    to: Address,
    call: C,
) -> Result<C::Return> {
    let tx = TransactionRequest::default()
        .to(to)
        .input(Bytes::from(call.abi_encode()).into());

    let raw = client.call(tx).await?;

    C::abi_decode_returns(&raw)
        .map_err(|e| Error::ContractCall(format!("Failed to decode {}: {}", C::SIGNATURE, e)))
}

/// Format a base-unit amount with decimals, trimming trailing zeros
pub fn format_units(value: U256, decimals: u32) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = remainder_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}
