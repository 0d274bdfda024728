//! Scripted backend for tests and offline runs.
//!
//! Replays a fixed queue of responses, one per model turn, and records every
//! request it was given so tests can inspect what the agent sent.

use crate::llm::LlmBackend;
use crate::tools::ToolDefinition;
use crate::types::{ChatMessage, InferenceResponse, ToolCall};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted turn: a response or a backend failure.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    Respond(InferenceResponse),
    Fail(String),
}

/// Backend that returns queued responses in order.
///
/// When the queue runs dry it keeps answering with the final text `"Done."`.
/// Clones share the same queue and request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLlm {
    turns: Arc<Mutex<VecDeque<ScriptedTurn>>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn requesting a single tool call.
    pub fn call_tool(self, name: &str, arguments: Value) -> Self {
        let id = format!("call_{}", self.queued() + 1);
        self.push(ScriptedTurn::Respond(InferenceResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id,
                name: name.to_string(),
                arguments,
            }],
            ..InferenceResponse::default()
        }))
    }

    /// Queue a turn requesting several tool calls at once.
    pub fn call_tools(self, calls: Vec<ToolCall>) -> Self {
        self.push(ScriptedTurn::Respond(InferenceResponse {
            content: None,
            tool_calls: calls,
            ..InferenceResponse::default()
        }))
    }

    /// Queue a final text answer.
    pub fn answer(self, text: impl Into<String>) -> Self {
        self.push(ScriptedTurn::Respond(InferenceResponse {
            content: Some(text.into()),
            ..InferenceResponse::default()
        }))
    }

    /// Queue a backend failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(ScriptedTurn::Fail(message.into()))
    }

    /// Messages sent on each call so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn queued(&self) -> usize {
        self.turns.lock().map(|t| t.len()).unwrap_or_default()
    }

    fn push(self, turn: ScriptedTurn) -> Self {
        if let Ok(mut turns) = self.turns.lock() {
            turns.push_back(turn);
        }
        self
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<InferenceResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        let next = self
            .turns
            .lock()
            .map_err(|_| anyhow!("scripted backend lock poisoned"))?
            .pop_front();
        match next {
            Some(ScriptedTurn::Respond(response)) => Ok(response),
            Some(ScriptedTurn::Fail(message)) => Err(anyhow!(message)),
            None => Ok(InferenceResponse {
                content: Some("Done.".into()),
                ..InferenceResponse::default()
            }),
        }
    }
}
