//! ICY swap agent CLI
//!
//! Hosts the plugin from the command line: direct service calls for balances,
//! quotes and swap payloads, plus `chat` for a full LLM-driven action run.

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use icy_swap_agent::actions::ActionResponse;
use icy_swap_agent::config::{Config, RpcConfig, PRIVATE_KEY_SETTING};
use icy_swap_agent::llm::LlmExtractor;
use icy_swap_agent::runtime::{AgentRuntime, Memory, ParamExtractor};
use icy_swap_agent::services::{
    calculate_icy_to_satoshi, estimate_net_satoshi, HttpSwapBackend, SwapService, TokenService,
};
use icy_swap_agent::types::{CheckBalanceParams, SwapTxParams};
use icy_swap_agent::wallet::{SecureWallet, WalletProvider};
use icy_swap_agent::{tokens, Error, Plugin, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "icy-agent")]
#[command(about = "ERC-20 balance checks and ICY to BTC swap preparation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an ERC-20 balance
    Balance {
        /// Token address or known symbol (ICY, USDC, ...)
        #[arg(short, long, default_value = "ICY")]
        token: String,

        /// Chain name (defaults to the swap chain)
        #[arg(short = 'n', long)]
        chain: Option<String>,

        /// Wallet to query (defaults to the EVM_PRIVATE_KEY account)
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Show the backend's current rate and fees
    SwapInfo,

    /// Quote an ICY amount in satoshi
    Quote {
        /// ICY amount (human-readable)
        #[arg(short, long)]
        amount: String,
    },

    /// Build the approve + swap payloads without the LLM
    PrepareSwap {
        /// ICY amount (human-readable)
        #[arg(short, long)]
        amount: String,

        /// Bitcoin address receiving the BTC
        #[arg(short, long)]
        btc_address: String,

        /// Sender wallet (defaults to the EVM_PRIVATE_KEY account)
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Run an action on a chat message
    Chat {
        /// The user's message
        message: String,

        /// Action name or simile
        #[arg(short, long)]
        action: String,

        /// Connected client wallet
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Balance {
            token,
            chain,
            wallet,
        } => run_balance(&config, token, chain, wallet).await?,
        Commands::SwapInfo => {
            let service = swap_service(&config, None)?;
            print_json(&service.get_swap_info().await?)?;
        }
        Commands::Quote { amount } => run_quote(&config, amount).await?,
        Commands::PrepareSwap {
            amount,
            btc_address,
            wallet,
        } => run_prepare_swap(&config, amount, btc_address, wallet).await?,
        Commands::Chat {
            message,
            action,
            wallet,
        } => run_chat(&config, message, action, wallet).await?,
        Commands::Config => print_json(&config)?,
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The agent's own account, when EVM_PRIVATE_KEY is set
fn load_signer() -> Option<SecureWallet> {
    let key = SecretString::from(std::env::var(PRIVATE_KEY_SETTING).ok()?);
    match SecureWallet::from_setting(&key) {
        Ok(wallet) => {
            tracing::info!(address = %wallet.address(), "Loaded wallet from {}", PRIVATE_KEY_SETTING);
            Some(wallet)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load wallet from {}", PRIVATE_KEY_SETTING);
            None
        }
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid address {}: {}", value, e)))
}

fn wallet_provider(config: &Config, signer: Option<&SecureWallet>) -> Result<Arc<WalletProvider>> {
    Ok(Arc::new(WalletProvider::from_config(
        config,
        &RpcConfig::from_env(),
        signer,
    )?))
}

fn swap_service(config: &Config, signer: Option<&SecureWallet>) -> Result<SwapService> {
    Ok(SwapService::new(
        wallet_provider(config, signer)?,
        Arc::new(HttpSwapBackend::new(config.backend.clone())),
        config.swap.clone(),
    ))
}

/// Explicit `--wallet` first, then the signer account
fn sender(wallet: Option<String>, signer: Option<&SecureWallet>) -> Result<Address> {
    match wallet {
        Some(wallet) => parse_address(&wallet),
        None => signer.map(SecureWallet::address).ok_or_else(|| {
            Error::InvalidInput(format!(
                "No wallet given. Pass --wallet or set {}",
                PRIVATE_KEY_SETTING
            ))
        }),
    }
}

async fn run_balance(
    config: &Config,
    token: String,
    chain: Option<String>,
    wallet: Option<String>,
) -> Result<()> {
    let signer = load_signer();
    let provider = wallet_provider(config, signer.as_ref())?;
    let chain = provider
        .chain(chain.as_deref().unwrap_or(&config.swap.chain))?
        .clone();

    let token_address = if token.starts_with("0x") {
        parse_address(&token)?
    } else {
        tokens::by_symbol(chain.id, &token)
            .map(|t| t.address)
            .ok_or_else(|| {
                Error::InvalidInput(format!("Unknown token {} on {}", token, chain.name))
            })?
    };

    let balance = TokenService::new(provider)
        .check_erc20_balance(&CheckBalanceParams {
            chain: chain.name,
            token_address,
            wallet_address: sender(wallet, signer.as_ref())?,
        })
        .await?;

    if let Some(known) = tokens::lookup(chain.id, &token_address) {
        if known.decimals != balance.decimals || known.symbol != balance.symbol {
            tracing::warn!(
                expected_symbol = known.symbol,
                expected_decimals = known.decimals,
                symbol = %balance.symbol,
                decimals = balance.decimals,
                "Token metadata differs from the known token registry"
            );
        }
    }

    print_json(&balance)
}

async fn run_quote(config: &Config, amount: String) -> Result<()> {
    let service = swap_service(config, None)?;
    let info = service.get_swap_info().await?;
    let satoshi = calculate_icy_to_satoshi(&amount, &info.icy_satoshi_rate)?;
    let estimate = estimate_net_satoshi(&satoshi, &info.min_satoshi_fee)?;

    print_json(&serde_json::json!({
        "icyAmount": amount,
        "icySatoshiRate": info.icy_satoshi_rate,
        "satoshiAmount": satoshi,
        "minSatoshiFee": info.min_satoshi_fee,
        "estimatedSatoshi": estimate,
    }))
}

async fn run_prepare_swap(
    config: &Config,
    amount: String,
    btc_address: String,
    wallet: Option<String>,
) -> Result<()> {
    let signer = load_signer();
    let service = swap_service(config, signer.as_ref())?;
    let from = sender(wallet, signer.as_ref())?;

    let info = service.get_swap_info().await?;
    let satoshi = calculate_icy_to_satoshi(&amount, &info.icy_satoshi_rate)?;
    let signature = service
        .generate_swap_signature(&btc_address, &amount, &satoshi)
        .await?;

    let allowance = service.current_allowance(from).await?;
    tracing::info!(allowance = %allowance, "Current ICY allowance for swap contract");

    let approve = service
        .build_approve_token_tx(&signature.icy_amount, from)
        .await?;
    let swap = service
        .build_swap_token_tx(&SwapTxParams::from_signature(&btc_address, &signature), from)
        .await?;

    print_json(&serde_json::json!({
        "satoshiAmount": satoshi,
        "estimatedSatoshi": estimate_net_satoshi(&satoshi, &info.min_satoshi_fee)?,
        "transactions": [approve, swap],
    }))
}

/// Runtime backed by process env and the OpenAI-compatible extractor
struct CliRuntime {
    wallet: Option<Address>,
    extractor: LlmExtractor,
}

impl AgentRuntime for CliRuntime {
    fn get_setting(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn wallet_address(&self) -> Option<Address> {
        self.wallet
    }

    fn extractor(&self) -> &dyn ParamExtractor {
        &self.extractor
    }
}

async fn run_chat(
    config: &Config,
    message: String,
    action: String,
    wallet: Option<String>,
) -> Result<()> {
    let signer = load_signer();
    let plugin = Plugin::from_config(config, &RpcConfig::from_env(), signer.as_ref())?;

    let runtime = CliRuntime {
        wallet: wallet.as_deref().map(parse_address).transpose()?,
        extractor: LlmExtractor::from_config(&config.llm)?,
    };

    let mut print = |response: ActionResponse| {
        println!("{}", response.text);
        match serde_json::to_string_pretty(&response.content) {
            Ok(content) => println!("{}", content),
            Err(e) => tracing::warn!(error = %e, "Failed to render action content"),
        }
    };

    let ok = plugin
        .dispatch(&action, &runtime, &Memory::new(message), None, Some(&mut print))
        .await?;

    if !ok {
        tracing::warn!(action = %action, "Action reported failure");
    }
    Ok(())
}
