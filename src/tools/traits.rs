//! Tool capability interface.

use crate::pipeline::MaterialPipeline;
use crate::types::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A named operation the agent can invoke with one string argument.
pub trait Tool {
    /// Tool name (used in function calls).
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &'static str;

    /// Name of the single string argument.
    fn argument(&self) -> &'static str;

    /// Description of the argument.
    fn argument_description(&self) -> &'static str;

    /// Run the tool against a session's pipeline.
    fn invoke(&self, pipeline: &mut MaterialPipeline, argument: &str) -> ToolOutcome;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.argument().to_string(),
            json!({
                "type": "string",
                "description": self.argument_description()
            }),
        );
        json!({
            "type": "object",
            "properties": properties,
            "required": [self.argument()]
        })
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().into(),
            description: self.description().into(),
            parameters: self.parameters_schema(),
        }
    }
}
