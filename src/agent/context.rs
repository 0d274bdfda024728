//! Message context builder for the dispatcher.
//!
//! Assembles the system prompt and the recent part of the conversation
//! memory for one inference call.

use crate::types::*;
use tracing::debug;

/// Messages of memory sent with each call, at most.
pub const HISTORY_WINDOW: usize = 40;

/// Build the full message list for an inference call.
///
/// The window always starts on a user message, so an assistant tool call is
/// never separated from its observations, and always includes the latest
/// user message.
pub fn build_messages(system_prompt: &str, memory: &[ChatMessage]) -> Vec<ChatMessage> {
    let start = window_start(memory, HISTORY_WINDOW);

    let mut messages = Vec::with_capacity(memory.len() - start + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(&memory[start..]);

    debug!(
        "Context: {} of {} memory messages",
        memory.len() - start,
        memory.len()
    );
    messages
}

fn window_start(memory: &[ChatMessage], window: usize) -> usize {
    let floor = memory.len().saturating_sub(window);
    let is_user = |m: &ChatMessage| m.role == ChatRole::User;

    memory[floor..]
        .iter()
        .position(is_user)
        .map(|i| floor + i)
        .or_else(|| memory.iter().rposition(is_user))
        .unwrap_or(0)
}
