pub mod traits;

pub use traits::{Tool, ToolDefinition};

use crate::pipeline::MaterialPipeline;
use crate::types::{ToolOutcome, ToolResult};
use tracing::warn;

/// The closed set of pipeline operations exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialTool {
    ReadData,
    ModelPredict,
    RuleMatch,
    SaveResult,
}

impl MaterialTool {
    /// Every tool, in pipeline order.
    pub const ALL: [MaterialTool; 4] = [
        Self::ReadData,
        Self::ModelPredict,
        Self::RuleMatch,
        Self::SaveResult,
    ];

    /// Static lookup by tool name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl Tool for MaterialTool {
    fn name(&self) -> &'static str {
        match self {
            Self::ReadData => "read_data",
            Self::ModelPredict => "model_predict",
            Self::RuleMatch => "rule_match",
            Self::SaveResult => "save_result",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::ReadData => "Read material expressions.",
            Self::ModelPredict => "Predict material properties.",
            Self::RuleMatch => "Match materials containing specific elements.",
            Self::SaveResult => "Save the matched materials to a CSV file.",
        }
    }

    fn argument(&self) -> &'static str {
        match self {
            Self::ReadData => "file_path",
            Self::ModelPredict => "model_path",
            Self::RuleMatch => "rule_elements",
            Self::SaveResult => "save_path",
        }
    }

    fn argument_description(&self) -> &'static str {
        match self {
            Self::ReadData => "Data file path",
            Self::ModelPredict => "Model file path",
            Self::RuleMatch => {
                "A comma-separated list of element symbols to match (e.g. 'Fe,Co,Ni' or 'Sc,Y,La,Ce')"
            }
            Self::SaveResult => "The file path to save the result",
        }
    }

    fn invoke(&self, pipeline: &mut MaterialPipeline, argument: &str) -> ToolOutcome {
        match self {
            Self::ReadData => pipeline.read_data(argument),
            Self::ModelPredict => pipeline.model_predict(argument),
            Self::RuleMatch => pipeline.rule_match(argument),
            Self::SaveResult => pipeline.save_result(argument),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool definitions for the inference API
// ---------------------------------------------------------------------------

/// Build the list of tool definitions exposed to the inference model.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    MaterialTool::ALL.iter().map(Tool::definition).collect()
}

// ---------------------------------------------------------------------------
// Tool execution engine
// ---------------------------------------------------------------------------

/// Execute a tool call by name against the session pipeline.
///
/// Unknown tools and malformed arguments come back as failed results so the
/// model can correct itself on the next turn.
pub fn execute_tool(
    pipeline: &mut MaterialPipeline,
    name: &str,
    args: &serde_json::Value,
) -> ToolResult {
    let Some(tool) = MaterialTool::from_name(name) else {
        warn!("Model requested unknown tool: {}", name);
        return ToolOutcome::fail(format!("Error: Unknown tool: {}", name)).into_result("");
    };

    match extract_argument(tool, args) {
        Some(argument) => tool.invoke(pipeline, &argument).into_result(""),
        None => ToolOutcome::fail(format!("Error: Missing '{}' argument", tool.argument()))
            .into_result(""),
    }
}

/// Pull the single string argument out of the call's JSON arguments.
///
/// Accepts `{"<argument>": "..."}`, a bare JSON string, or an object with
/// exactly one string field under some other name.
fn extract_argument(tool: MaterialTool, args: &serde_json::Value) -> Option<String> {
    match args {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => {
            if let Some(v) = map.get(tool.argument()) {
                return v.as_str().map(str::to_string);
            }
            let mut strings = map.values().filter_map(|v| v.as_str());
            match (strings.next(), strings.next()) {
                (Some(only), None) => Some(only.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}
