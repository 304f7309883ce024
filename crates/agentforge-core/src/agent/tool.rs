//! Tool descriptors and the mock tool executor.
//!
//! Tools are advisory: the provider may call them, but execution only
//! echoes the call back with a fixed placeholder result.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use agentforge_types::agent::Tool;
use agentforge_types::llm::ToolDefinition;

/// Placeholder returned by every mock tool execution.
pub const MOCK_TOOL_RESULT: &str = "Tool executed (mock - implement real execution logic)";

/// Provider-facing descriptor of one agent tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    /// Build a descriptor. A tool without parameters gets an empty object schema.
    pub fn from_tool(tool: &Tool) -> Self {
        let parameters = match tool.parameters {
            Some(ref params) if !params.is_empty() => Value::Object(params.clone()),
            _ => json!({"type": "object", "properties": {}}),
        };
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Run the mock executor for a call to this tool.
    pub fn execute_mock(&self, args: Value, now: DateTime<Utc>) -> Value {
        json!({
            "tool": self.name,
            "args": args,
            "result": MOCK_TOOL_RESULT,
            "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}
