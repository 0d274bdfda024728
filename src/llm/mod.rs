//! Language-model backends the agent can talk to.

pub mod inference;
pub mod mock;

pub use inference::InferenceClient;
pub use mock::ScriptedLlm;

use crate::tools::ToolDefinition;
use crate::types::{ChatMessage, InferenceResponse};
use anyhow::Result;
use async_trait::async_trait;

/// A chat model with tool calling.
///
/// One call is one model turn: given the conversation so far and the tools on
/// offer, the model either requests tool calls or answers in text.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<InferenceResponse>;
}
