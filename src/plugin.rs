//! Plugin registration
//!
//! Bundles the wallet provider and the two actions for the host, resolves
//! action names (including similes), and keeps an optional JSONL audit trail
//! of every dispatch.

use crate::actions::{Action, ActionResponse, CheckBalanceAction, HandlerCallback, SwapIcyToBtcAction};
use crate::config::{Config, RpcConfig, SwapConfig};
use crate::runtime::{AgentRuntime, ContextProvider, Memory, State};
use crate::services::{HttpSwapBackend, SwapBackend};
use crate::wallet::{SecureWallet, WalletProvider};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const PLUGIN_NAME: &str = "icy";

pub struct Plugin {
    wallet: Arc<WalletProvider>,
    providers: Vec<Arc<dyn ContextProvider>>,
    actions: Vec<Arc<dyn Action>>,
    audit: Option<AuditLog>,
}

impl Plugin {
    pub fn new(
        wallet: Arc<WalletProvider>,
        backend: Arc<dyn SwapBackend>,
        swap: SwapConfig,
    ) -> Self {
        let actions: Vec<Arc<dyn Action>> = vec![
            Arc::new(CheckBalanceAction::new(wallet.clone())),
            Arc::new(SwapIcyToBtcAction::with_backend(wallet.clone(), backend, swap)),
        ];
        let providers: Vec<Arc<dyn ContextProvider>> = vec![wallet.clone()];
        Self {
            providers,
            wallet,
            actions,
            audit: None,
        }
    }

    /// Wire RPC clients, the HTTP backend and the audit log from configuration
    pub fn from_config(
        config: &Config,
        rpc_config: &RpcConfig,
        signer: Option<&SecureWallet>,
    ) -> Result<Self> {
        let wallet = Arc::new(WalletProvider::from_config(config, rpc_config, signer)?);
        let backend = Arc::new(HttpSwapBackend::new(config.backend.clone()));
        let plugin = Self::new(wallet, backend, config.swap.clone());

        Ok(match &config.audit_log_path {
            Some(path) => plugin.with_audit_log(path),
            None => plugin,
        })
    }

    pub fn with_audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit = Some(AuditLog::new(path));
        self
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn description(&self) -> &'static str {
        "Check ERC-20 balances and swap ICY to BTC"
    }

    pub fn wallet(&self) -> &Arc<WalletProvider> {
        &self.wallet
    }

    pub fn providers(&self) -> &[Arc<dyn ContextProvider>] {
        &self.providers
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// Match an action by name or simile, ignoring case and `_`/`-`
    pub fn find_action(&self, name: &str) -> Option<&Arc<dyn Action>> {
        let wanted = normalize_action_name(name);
        self.actions.iter().find(|action| {
            normalize_action_name(action.name()) == wanted
                || action
                    .similes()
                    .iter()
                    .any(|simile| normalize_action_name(simile) == wanted)
        })
    }

    /// Text from every context provider, one block per provider
    pub async fn provider_context(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: &State,
    ) -> Result<String> {
        let mut blocks = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            blocks.push(provider.get(runtime, message, state).await?);
        }
        Ok(blocks.join("\n\n"))
    }

    /// Validate then run an action; `Ok(false)` means the handler reported a failure
    pub async fn dispatch(
        &self,
        action_name: &str,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        mut callback: Option<HandlerCallback<'_>>,
    ) -> Result<bool> {
        let action = self
            .find_action(action_name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown action: {}", action_name)))?;

        if !action.validate(runtime).await {
            return Err(Error::InvalidInput(format!(
                "Action {} is not available: validation failed",
                action.name()
            )));
        }

        tracing::info!(action = action.name(), message_id = %message.id, "Dispatching action");

        let started = Instant::now();
        let mut last: Option<ActionResponse> = None;
        let ok = {
            let mut forward = |response: ActionResponse| {
                last = Some(response.clone());
                if let Some(callback) = callback.as_mut() {
                    callback(response);
                }
            };
            action
                .handler(runtime, message, state, &Value::Null, Some(&mut forward))
                .await
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(action = action.name(), success = ok, duration_ms, "Action finished");

        if let Some(audit) = &self.audit {
            audit
                .record(&AuditEntry {
                    timestamp: Utc::now(),
                    entry_type: "action",
                    action: action.name(),
                    message_id: message.id,
                    status: if ok { "success" } else { "error" },
                    duration_ms,
                    text: last.as_ref().map(|r| r.text.clone()),
                    content: last.as_ref().map(|r| truncate_content(&r.content)),
                })
                .await;
        }

        Ok(ok)
    }
}

fn normalize_action_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry {
    timestamp: DateTime<Utc>,
    entry_type: &'static str,
    action: &'static str,
    message_id: Uuid,
    status: &'static str,
    duration_ms: u64,
    text: Option<String>,
    content: Option<Value>,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Append-only JSONL record of action outcomes
struct AuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLog {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter { path: path.into() })),
        }
    }

    async fn record(&self, entry: &AuditEntry) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(entry) {
            // Auditing never fails an action
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

/// Truncate callback content for logging
fn truncate_content(content: &Value) -> Value {
    let s = serde_json::to_string(content).unwrap_or_default();
    if s.len() > 2000 {
        let cut = (0..=2000).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
        serde_json::json!(format!("{}... [truncated]", &s[..cut]))
    } else {
        content.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRIVATE_KEY_SETTING;
    use crate::test_support::{wallet_provider, FakeBackend, FakeEvmClient, FakeRuntime, TEST_KEY};
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn plugin() -> Plugin {
        Plugin::new(
            wallet_provider(Arc::new(FakeEvmClient::icy(50))),
            Arc::new(FakeBackend::ok("1500", "2000")),
            SwapConfig::default(),
        )
    }

    #[test]
    fn registers_provider_and_actions() {
        let plugin = plugin();
        assert_eq!(plugin.name(), "icy");
        assert_eq!(plugin.providers().len(), 1);
        assert_eq!(plugin.providers()[0].name(), "evmWallet");

        let names: Vec<_> = plugin.actions().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["checkBalance", "swapIcyToBtc"]);
    }

    #[test]
    fn finds_actions_by_name_and_simile() {
        let plugin = plugin();
        assert_eq!(plugin.find_action("checkBalance").unwrap().name(), "checkBalance");
        assert_eq!(plugin.find_action("GET_BALANCE").unwrap().name(), "checkBalance");
        assert_eq!(plugin.find_action("CHECK_BALANCE").unwrap().name(), "checkBalance");
        assert_eq!(plugin.find_action("icy_to_btc").unwrap().name(), "swapIcyToBtc");
        assert_eq!(plugin.find_action("SWAP_ICY_TO_BTC").unwrap().name(), "swapIcyToBtc");
        assert!(plugin.find_action("transfer").is_none());
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_and_invalid() {
        let plugin = plugin();
        let runtime = FakeRuntime::new();
        let message = Memory::new("hi");

        let err = plugin
            .dispatch("transfer", &runtime, &message, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // No private key configured
        let err = plugin
            .dispatch("checkBalance", &runtime, &message, None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn dispatch_writes_audit_entries() {
        let temp_file = NamedTempFile::new().unwrap();
        let plugin = plugin().with_audit_log(temp_file.path());
        let runtime = FakeRuntime::new()
            .with_setting(PRIVATE_KEY_SETTING, TEST_KEY)
            .with_extraction(json!({
                "chain": "baseSepolia",
                "tokenAddress": "0x5233E10cc24736F107fEda42ff0157e91Cf1F8b6"
            }));

        let mut texts = Vec::new();
        let mut callback = |r: ActionResponse| texts.push(r.text);
        let ok = plugin
            .dispatch(
                "BALANCE",
                &runtime,
                &Memory::new("my ICY balance?"),
                None,
                Some(&mut callback),
            )
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(texts.len(), 1);

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let entry: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(entry["action"], "checkBalance");
        assert_eq!(entry["status"], "success");
        assert_eq!(entry["content"]["symbol"], "ICY");
    }

    #[tokio::test]
    async fn provider_context_includes_wallet() {
        let plugin = plugin();
        let text = plugin
            .provider_context(&FakeRuntime::new(), &Memory::new("hi"), &State::default())
            .await
            .unwrap();
        assert!(text.starts_with("EVM Wallet Address: "));
    }

    #[test]
    fn truncates_large_content() {
        let big = json!({"blob": "x".repeat(5000)});
        let truncated = truncate_content(&big);
        assert!(truncated.as_str().unwrap().ends_with("... [truncated]"));
        assert_eq!(truncate_content(&json!({"a": 1})), json!({"a": 1}));
    }
}
