//! System prompt assembly for AgentForge agents.
//!
//! Turns an [`Agent`] into the system prompt sent upstream plus a
//! name-keyed map of tool descriptors. Assembly is pure: the same agent
//! always yields byte-identical output.

use std::collections::BTreeMap;

use agentforge_types::agent::Agent;
use agentforge_types::llm::ToolDefinition;

use super::tool::ToolSchema;

/// Output of [`PromptAssembler::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    pub tools: BTreeMap<String, ToolSchema>,
}

impl AssembledPrompt {
    /// Tool definitions in the shape the provider expects.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolSchema::definition).collect()
    }
}

/// Builds the system prompt for an agent.
///
/// Layout:
/// ```text
/// You are {name}, a {role}.
///
/// {system_prompt}
///
/// You have access to the following tools:
/// - {tool.name}: {tool.description}
///
/// Use these tools when appropriate to help the user.
/// ```
/// The custom prompt and tool sections are omitted when empty, and the
/// result is trimmed.
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn assemble(agent: &Agent) -> AssembledPrompt {
        AssembledPrompt {
            system_prompt: Self::system_prompt(agent),
            tools: agent
                .tools
                .iter()
                .map(|tool| (tool.name.clone(), ToolSchema::from_tool(tool)))
                .collect(),
        }
    }

    fn system_prompt(agent: &Agent) -> String {
        let mut prompt = format!("You are {}, a {}.\n\n", agent.name, agent.role);

        if !agent.system_prompt.is_empty() {
            prompt.push_str(&agent.system_prompt);
            prompt.push_str("\n\n");
        }

        if !agent.tools.is_empty() {
            prompt.push_str("You have access to the following tools:\n");
            for tool in &agent.tools {
                prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
            }
            prompt.push_str("\nUse these tools when appropriate to help the user.\n");
        }

        prompt.trim().to_string()
    }
}
