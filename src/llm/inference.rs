//! Model inference over an OpenAI-compatible chat-completions API.
//!
//! Supports tool-use (function calling) in the OpenAI format.

use crate::config::LlmConfig;
use crate::llm::LlmBackend;
use crate::tools::ToolDefinition;
use crate::types::*;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Inference client for any OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: &'static str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallPayload {
    id: String,
    r#type: String,
    function: FunctionCallPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl InferenceClient {
    /// Create a new inference client from the `[llm]` settings.
    pub fn new(config: &LlmConfig, api_key: &str) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            http: reqwest::Client::new(),
        }
    }

    fn request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolDefinition],
    ) -> ChatRequest<'a> {
        let msg_payloads = messages.iter().map(message_payload).collect();

        let tool_payloads = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ToolPayload {
                        r#type: "function",
                        function: FunctionPayload {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.parameters,
                        },
                    })
                    .collect(),
            )
        };

        ChatRequest {
            model: &self.model,
            messages: msg_payloads,
            tools: tool_payloads,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn message_payload(m: &ChatMessage) -> MessagePayload<'_> {
    let tool_calls = (!m.tool_calls.is_empty()).then(|| {
        m.tool_calls
            .iter()
            .map(|tc| ToolCallPayload {
                id: tc.id.clone(),
                r#type: "function".into(),
                function: FunctionCallPayload {
                    name: tc.name.clone(),
                    arguments: tc.arguments.to_string(),
                },
            })
            .collect()
    });
    // An assistant turn that only calls tools carries null content.
    let content = if m.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(m.content.as_str())
    };
    MessagePayload {
        role: m.role.as_str(),
        content,
        tool_calls,
        tool_call_id: m.tool_call_id.as_deref(),
    }
}

/// Decode a tool call's argument string. Models sometimes send a bare value
/// instead of an object; keep it as a JSON string so the tool layer can
/// still use it.
fn parse_arguments(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| {
        warn!("Tool call arguments are not JSON: {}", raw);
        serde_json::Value::String(raw.to_string())
    })
}

#[async_trait]
impl LlmBackend for InferenceClient {
    /// Run inference with tool support. Returns a response with optional tool calls.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<InferenceResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.request(messages, tools);

        debug!("Inference request to model: {}", self.model);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Inference request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Inference failed ({}): {}", status, body);
        }

        let body: ChatResponse = resp.json().await.context("Failed to parse inference response")?;

        let Some(choice) = body.choices.into_iter().next() else {
            bail!("Inference response contained no choices");
        };

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| ToolCall {
                arguments: parse_arguments(&tc.function.arguments),
                id: tc.id,
                name: tc.function.name,
            })
            .collect();

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            "Inference returned {} tool calls, {} total tokens",
            tool_calls.len(),
            usage.total_tokens
        );

        Ok(InferenceResponse {
            content: choice.message.content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> InferenceClient {
        let config = LlmConfig {
            base_url: "http://localhost:9/v1/".into(),
            ..LlmConfig::default()
        };
        InferenceClient::new(&config, "sk-test")
    }

    #[test]
    fn request_carries_tool_calls_and_ids() {
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("load data.csv"),
            ChatMessage::assistant(
                "",
                vec![ToolCall {
                    id: "call_1".into(),
                    name: "read_data".into(),
                    arguments: json!({"file_path": "data.csv"}),
                }],
            ),
            ChatMessage::tool("call_1", "Successfully read material expressions, total 3 records"),
        ];
        let tools = crate::tools::tool_definitions();
        let c = client();
        let value = serde_json::to_value(c.request(&messages, &tools)).unwrap();

        assert_eq!(value["model"], json!("gpt-4o-mini-2024-07-18"));
        assert_eq!(value["tools"].as_array().unwrap().len(), 4);
        assert_eq!(value["tools"][0]["function"]["name"], json!("read_data"));

        let assistant = &value["messages"][2];
        assert_eq!(assistant["role"], json!("assistant"));
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["type"], json!("function"));
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            json!("{\"file_path\":\"data.csv\"}")
        );

        let tool = &value["messages"][3];
        assert_eq!(tool["role"], json!("tool"));
        assert_eq!(tool["tool_call_id"], json!("call_1"));
        assert!(value["messages"][1].get("tool_calls").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(client().base_url, "http://localhost:9/v1");
    }

    #[test]
    fn non_json_arguments_become_strings() {
        assert_eq!(parse_arguments("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_arguments("data.csv"), json!("data.csv"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let err = client()
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Inference request failed"));
    }
}
