//! Tool-use agent loop: Think → Act → Observe.
//!
//! Each model turn either requests tool calls, which run against the
//! session pipeline and are fed back as observations, or produces the final
//! answer. The loop is bounded by `max_turns`.

use crate::agent::{context, system_prompt};
use crate::config::LlmConfig;
use crate::llm::{InferenceClient, LlmBackend};
use crate::pipeline::MaterialPipeline;
use crate::tools::{self, ToolDefinition};
use crate::types::*;
use anyhow::{Context, Result};
use tracing::{error, info, warn, Instrument, Span};

/// A conversational agent bound to one pipeline session.
///
/// Memory lives in the instance and carries over between [`run`] calls.
///
/// [`run`]: MaterialAgent::run
pub struct MaterialAgent {
    backend: Box<dyn LlmBackend>,
    pipeline: MaterialPipeline,
    tools: Vec<ToolDefinition>,
    system_prompt: String,
    memory: Vec<ChatMessage>,
    max_turns: usize,
    state: AgentState,
    span: Span,
}

impl MaterialAgent {
    /// Create an agent with a fresh pipeline over the given backend.
    pub fn new(backend: Box<dyn LlmBackend>, max_turns: usize) -> Self {
        let span = crate::logging::session_span("agent");
        let tools = tools::tool_definitions();
        let system_prompt = system_prompt::build_system_prompt(&tools);
        Self {
            backend,
            pipeline: MaterialPipeline::with_span(span.clone()),
            tools,
            system_prompt,
            memory: Vec::new(),
            max_turns: max_turns.max(1),
            state: AgentState::default(),
            span,
        }
    }

    /// Create an agent talking to the configured chat-completions endpoint.
    pub fn from_config(config: &LlmConfig, api_key: &str) -> Self {
        info!("Initializing agent with model {}", config.model);
        Self::new(
            Box::new(InferenceClient::new(config, api_key)),
            config.max_turns,
        )
    }

    pub fn memory(&self) -> &[ChatMessage] {
        &self.memory
    }

    pub fn pipeline(&self) -> &MaterialPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Answer one query. Never fails: faults come back as text.
    pub async fn run(&mut self, query: &str) -> String {
        let span = self.span.clone();
        async move {
            info!("Executing query: {}", query);
            match self.dispatch(query).await {
                Ok(answer) => {
                    info!("Query execution successful");
                    answer
                }
                Err(e) => {
                    self.state = AgentState::Done;
                    let message = format!("Agent execution error: {:#}", e);
                    error!("{}", message);
                    message
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&mut self, query: &str) -> Result<String> {
        self.memory.push(ChatMessage::user(query));

        for turn in 1..=self.max_turns {
            self.state = AgentState::AwaitingDecision;
            let messages = context::build_messages(&self.system_prompt, &self.memory);
            let response = self.backend.chat(&messages, &self.tools).await?;

            if response.tool_calls.is_empty() {
                let answer = response.content.unwrap_or_default();
                info!("[Turn {}] Final answer: {} chars", turn, answer.len());
                self.memory.push(ChatMessage::assistant(answer.clone(), Vec::new()));
                self.state = AgentState::Done;
                return Ok(answer);
            }

            if let Some(thought) = response.content.as_deref().filter(|c| !c.is_empty()) {
                info!("[Turn {}] Agent: {}", turn, truncate(thought, 200));
            }
            self.memory.push(ChatMessage::assistant(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            self.state = AgentState::InvokingTool;
            // Pipeline stages do file and model work, so they run off the
            // async workers.
            let calls = response.tool_calls;
            let pipeline = std::mem::replace(
                &mut self.pipeline,
                MaterialPipeline::with_span(self.span.clone()),
            );
            let span = Span::current();
            let (pipeline, results) = tokio::task::spawn_blocking(move || {
                span.in_scope(|| invoke_tools(pipeline, &calls, turn))
            })
            .await
            .context("Tool execution task failed")?;
            self.pipeline = pipeline;

            self.memory.extend(
                results
                    .into_iter()
                    .map(|r| ChatMessage::tool(r.tool_call_id, r.output)),
            );
        }

        self.state = AgentState::Done;
        let message = format!(
            "Agent stopped after {} steps without reaching a final answer",
            self.max_turns
        );
        warn!("{}", message);
        Ok(message)
    }
}

/// Run one turn's tool calls in order against the pipeline.
fn invoke_tools(
    mut pipeline: MaterialPipeline,
    calls: &[ToolCall],
    turn: usize,
) -> (MaterialPipeline, Vec<ToolResult>) {
    let results = calls
        .iter()
        .map(|tc| {
            info!("[Turn {}] Tool: {}({})", turn, tc.name, tc.arguments);

            let mut result = tools::execute_tool(&mut pipeline, &tc.name, &tc.arguments);
            result.tool_call_id = tc.id.clone();

            if result.success {
                info!("[Turn {}] Tool result: {}", turn, result.output);
            } else {
                warn!("[Turn {}] Tool error: {}", turn, result.output);
            }
            result
        })
        .collect();
    (pipeline, results)
}

/// Longest prefix of at most `max_chars` characters.
pub(crate) fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
