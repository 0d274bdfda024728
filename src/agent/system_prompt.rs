//! System prompt builder.
//!
//! Layers (in order):
//! 1. Role (what the assistant is for)
//! 2. Tool catalogue, rendered from the tool definitions
//! 3. Working rules for the read → predict → match → save pipeline

use crate::tools::ToolDefinition;
use tracing::debug;

const ROLE: &str = r#"
# Role

You are a materials analysis assistant. You work on tabular datasets of
chemical compositions (one formula per row in a `Substance` column) using a
fixed set of data tools. You never invent data: every number you report must
come from a tool observation.
"#;

const WORKFLOW: &str = r#"
# Working Rules

- Tools share one working dataset. `read_data` must succeed before any other
  tool; it replaces whatever was loaded before.
- `model_predict` scores every material and sorts the dataset by score,
  highest first. Later tools see that order.
- `rule_match` keeps materials containing ANY of the given element symbols.
  Symbols are case-sensitive (`Fe`, not `fe`).
- `save_result` writes the materials kept by the last `rule_match`; run
  `rule_match` first.
- Call one tool at a time and read its observation before deciding the next
  step. If a tool reports an error, fix the argument or explain the problem.
- When the request is fulfilled, answer in plain text with a short summary of
  what was done and where results were written.
"#;

/// Build the complete system prompt for the given tools.
pub fn build_system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(ROLE);
    prompt.push('\n');

    prompt.push_str("# Tools\n\n");
    for tool in tools {
        prompt.push_str(&format!("- **{}**: {}", tool.name, tool.description));
        if let Some(props) = tool.parameters["properties"].as_object() {
            for (name, schema) in props {
                let description = schema["description"].as_str().unwrap_or_default();
                prompt.push_str(&format!(" Parameter: {} (str): {}.", name, description));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str(WORKFLOW);

    debug!("System prompt: {} chars", prompt.len());
    prompt
}
