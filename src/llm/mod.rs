//! One-shot LLM collaborator contract
//!
//! The processing engine needs exactly one capability from a language
//! model: send a set of system messages, get a single string back. No
//! streaming, no tool use, no conversation state. Concrete backends
//! (local model runner, hosted API) implement [`LlmService`] outside
//! this crate.

use crate::error::Result;
use async_trait::async_trait;

/// Model/prompt configuration used for an invocation.
///
/// Swapping the schema on a processor takes effect on the next call and
/// never invalidates cached results.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSchema {
    /// Model identifier understood by the backend
    pub model: String,

    /// Sampling temperature, backend default when `None`
    pub temperature: Option<f64>,

    /// Upper bound on generated tokens, backend default when `None`
    pub max_tokens: Option<u32>,
}

impl PromptSchema {
    /// Schema selecting a model with backend-default sampling
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Context for a single one-shot invocation
#[derive(Debug, Clone, Default)]
pub struct OneShotContext {
    /// System messages, in order (instruction prompt first, then data)
    pub system_messages: Vec<String>,
}

/// One-shot prompt execution service.
///
/// Failures (network, auth, rate limits) propagate unchanged to the
/// caller; retry policy lives outside this crate.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Execute a single prompt and return the model's reply text
    async fn one_shot(&self, schema: &PromptSchema, context: OneShotContext) -> Result<String>;
}
