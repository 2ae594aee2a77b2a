//! Agent actions
//!
//! An action is what the host invokes when it decides a message calls for it.
//! Handlers never return errors: every failure is turned into a callback
//! payload with `success: false` and the handler returns `false`.

mod check_balance;
mod swap;

use crate::runtime::{compose_context, AgentRuntime, Memory, State};
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

pub use check_balance::CheckBalanceAction;
pub use swap::SwapIcyToBtcAction;

/// Message handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    /// Human-readable reply
    pub text: String,
    /// Structured result for the client
    pub content: Value,
}

impl ActionResponse {
    /// Failure payload carrying the raw error and its code
    pub fn failure(text: impl Into<String>, error: &Error) -> Self {
        Self {
            text: text.into(),
            content: json!({
                "success": false,
                "error": error.to_string(),
                "code": error.code(),
            }),
        }
    }

    pub fn success(&self) -> bool {
        self.content
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Host callback receiving action output
pub type HandlerCallback<'a> = &'a mut (dyn FnMut(ActionResponse) + Send);

/// One turn of a sample conversation
#[derive(Debug, Clone, Serialize)]
pub struct ActionExample {
    pub user: &'static str,
    pub text: &'static str,
    pub action: &'static str,
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Alternative names the host may use to refer to this action
    fn similes(&self) -> &'static [&'static str];

    fn examples(&self) -> Vec<Vec<ActionExample>>;

    /// Whether the action may run for this runtime at all
    async fn validate(&self, runtime: &dyn AgentRuntime) -> bool;

    /// Run the action, reporting through `callback`; returns whether it succeeded
    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<State>,
        options: &Value,
        callback: Option<HandlerCallback<'_>>,
    ) -> bool;
}

pub(crate) fn emit(callback: &mut Option<HandlerCallback<'_>>, response: ActionResponse) {
    if let Some(callback) = callback.as_mut() {
        callback(response);
    }
}

/// Host-provided state, or one composed from the message
pub(crate) async fn resolve_state(
    runtime: &dyn AgentRuntime,
    message: &Memory,
    state: Option<State>,
) -> Result<State> {
    match state {
        Some(state) => Ok(state),
        None => runtime.compose_state(message).await,
    }
}

/// Render `template` against `state` and ask the runtime's extractor for a `T`
pub(crate) async fn extract_params<T>(
    runtime: &dyn AgentRuntime,
    template: &str,
    state: &State,
) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let context = compose_context(template, state);
    let schema: Value = schemars::schema_for!(T).into();

    let value = runtime.extractor().extract(&context, &schema).await?;
    serde_json::from_value(value)
        .map_err(|e| Error::Extraction(format!("unexpected parameters: {}", e)))
}
