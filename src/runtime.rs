//! Seams to the hosting agent runtime
//!
//! The host owns conversation memory, settings and the LLM. The plugin only
//! needs to read settings, build a prompt context from a message, and ask an
//! extractor to turn that context into JSON matching a schema.

use crate::Result;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single inbound chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub text: String,
}

impl Memory {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// Template variables for prompt composition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    values: BTreeMap<String, String>,
}

impl State {
    /// State seeded from a message, as used when the host provides none
    pub fn from_message(message: &Memory) -> Self {
        let mut state = Self::default();
        state.set("recentMessages", message.text.clone());
        state.set("userMessage", message.text.clone());
        state
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}

/// Replace `{{key}}` placeholders with state values; unknown keys render empty
pub fn compose_context(template: &str, state: &State) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                out.push_str(state.get(key).unwrap_or_default());
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// External capability that turns prompt context into structured parameters
#[async_trait]
pub trait ParamExtractor: Send + Sync {
    /// Return a JSON object conforming to `schema`
    async fn extract(&self, context: &str, schema: &Value) -> Result<Value>;
}

/// The hosting agent runtime
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Read a runtime setting (e.g. `EVM_PRIVATE_KEY`)
    fn get_setting(&self, key: &str) -> Option<String>;

    /// Address of the wallet the user connected in the client, if any
    fn wallet_address(&self) -> Option<Address> {
        None
    }

    /// Extractor backing parameter parsing
    fn extractor(&self) -> &dyn ParamExtractor;

    /// Build template state for a message
    async fn compose_state(&self, message: &Memory) -> Result<State> {
        Ok(State::from_message(message))
    }
}

/// Supplies contextual text to the host when it builds prompts
#[async_trait]
pub trait ContextProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: &State,
    ) -> Result<String>;
}
