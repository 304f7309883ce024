//! Agent and tool definitions.
//!
//! An [`Agent`] is a named persona (name, role, system prompt) bound to an
//! upstream model, a sampling temperature and a list of advisory [`Tool`]s.
//! Defaults are filled explicitly by [`Agent::from_request`]; partial
//! updates go through [`Agent::apply_patch`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;

/// Model used when an agent is created without one.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Sampling temperature used when an agent is created without one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Inclusive bounds accepted for [`Agent::temperature`].
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// A configured agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub system_prompt: String,
    pub model: String,
    pub tools: Vec<Tool>,
    pub temperature: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tool metadata attached to an agent. Execution is mocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Open JSON schema describing the tool's arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Body of an agent create call. Every field is optional on the wire so
/// that missing name/role surface as a validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub tools: Option<Vec<Tool>>,
    pub temperature: Option<f64>,
}

/// Partial update of an agent. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub tools: Option<Vec<Tool>>,
    pub temperature: Option<f64>,
}

impl Agent {
    /// Build a new agent from a create request, filling every default.
    ///
    /// A caller-supplied non-empty id is kept; otherwise a UUID v7 is generated.
    pub fn from_request(req: CreateAgentRequest, now: DateTime<Utc>) -> Result<Self, AgentError> {
        let (name, role) = match (req.name, req.role) {
            (Some(name), Some(role)) if !name.is_empty() && !role.is_empty() => (name, role),
            _ => {
                return Err(AgentError::Validation(
                    "Name and role are required".to_string(),
                ));
            }
        };

        let temperature = req.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        validate_temperature(temperature)?;

        let tools = req.tools.unwrap_or_default();
        validate_tools(&tools)?;

        let id = req
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        Ok(Self {
            id,
            name,
            role,
            system_prompt: req.system_prompt.unwrap_or_default(),
            model: req
                .model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            tools,
            temperature,
            created_at: now,
            updated_at: now,
        })
    }

    /// Merge a patch into this agent and refresh `updated_at`.
    ///
    /// `updated_at` never moves backwards, even if the wall clock does.
    pub fn apply_patch(&mut self, patch: AgentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(system_prompt) = patch.system_prompt {
            self.system_prompt = system_prompt;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(tools) = patch.tools {
            self.tools = tools;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        self.updated_at = now.max(self.updated_at);
    }
}

impl AgentPatch {
    /// Check the fields present in the patch against the agent invariants.
    pub fn validate(&self) -> Result<(), AgentError> {
        if matches!(self.name.as_deref(), Some("")) {
            return Err(AgentError::Validation("Name is required".to_string()));
        }
        if matches!(self.role.as_deref(), Some("")) {
            return Err(AgentError::Validation("Role is required".to_string()));
        }
        if let Some(temperature) = self.temperature {
            validate_temperature(temperature)?;
        }
        if let Some(ref tools) = self.tools {
            validate_tools(tools)?;
        }
        Ok(())
    }
}

fn validate_temperature(temperature: f64) -> Result<(), AgentError> {
    let (min, max) = TEMPERATURE_RANGE;
    if !(min..=max).contains(&temperature) {
        return Err(AgentError::Validation(format!(
            "Temperature must be between {min} and {max}"
        )));
    }
    Ok(())
}

fn validate_tools(tools: &[Tool]) -> Result<(), AgentError> {
    let mut seen = HashSet::new();
    for tool in tools {
        if tool.name.is_empty() {
            return Err(AgentError::Validation("Tool name is required".to_string()));
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(AgentError::Validation(format!(
                "Duplicate tool name '{}'",
                tool.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn request(name: &str, role: &str) -> CreateAgentRequest {
        CreateAgentRequest {
            name: Some(name.to_string()),
            role: Some(role.to_string()),
            ..Default::default()
        }
    }

    fn tool(name: &str) -> Tool {
        Tool {
            id: format!("t-{name}"),
            name: name.to_string(),
            description: format!("{name} tool"),
            parameters: None,
        }
    }

    #[test]
    fn test_from_request_fills_defaults() {
        let now = crate::time::now();
        let agent = Agent::from_request(request("R", "Researcher"), now).unwrap();

        assert!(!agent.id.is_empty());
        assert_eq!(agent.model, DEFAULT_MODEL);
        assert_eq!(agent.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(agent.system_prompt, "");
        assert!(agent.tools.is_empty());
        assert_eq!(agent.created_at, agent.updated_at);
    }

    #[test]
    fn test_from_request_keeps_caller_id() {
        let mut req = request("R", "Researcher");
        req.id = Some("agent-1".to_string());
        let agent = Agent::from_request(req, crate::time::now()).unwrap();
        assert_eq!(agent.id, "agent-1");
    }

    #[test]
    fn test_from_request_requires_name_and_role() {
        let err = Agent::from_request(
            CreateAgentRequest {
                name: Some("R".to_string()),
                ..Default::default()
            },
            crate::time::now(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Name and role are required");

        assert!(Agent::from_request(request("", "Researcher"), crate::time::now()).is_err());
    }

    #[test]
    fn test_from_request_rejects_out_of_range_temperature() {
        let mut req = request("R", "Researcher");
        req.temperature = Some(2.5);
        assert!(matches!(
            Agent::from_request(req, crate::time::now()),
            Err(AgentError::Validation(_))
        ));
    }

    #[test]
    fn test_from_request_rejects_duplicate_tool_names() {
        let mut req = request("R", "Researcher");
        req.tools = Some(vec![tool("search"), tool("search")]);
        let err = Agent::from_request(req, crate::time::now()).unwrap_err();
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn test_apply_patch_leaves_absent_fields() {
        let created = crate::time::now();
        let mut agent = Agent::from_request(request("R", "Researcher"), created).unwrap();
        let before = agent.clone();

        agent.apply_patch(
            AgentPatch {
                temperature: Some(1.5),
                ..Default::default()
            },
            created + Duration::seconds(1),
        );

        assert_eq!(agent.temperature, 1.5);
        assert_eq!(agent.name, before.name);
        assert_eq!(agent.role, before.role);
        assert_eq!(agent.model, before.model);
        assert_eq!(agent.created_at, before.created_at);
        assert!(agent.updated_at > before.updated_at);
    }

    #[test]
    fn test_apply_patch_never_moves_updated_at_backwards() {
        let created = crate::time::now();
        let mut agent = Agent::from_request(request("R", "Researcher"), created).unwrap();
        agent.apply_patch(AgentPatch::default(), created - Duration::hours(1));
        assert_eq!(agent.updated_at, created);
    }

    #[test]
    fn test_patch_validation() {
        assert!(AgentPatch::default().validate().is_ok());
        assert!(
            AgentPatch {
                name: Some(String::new()),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            AgentPatch {
                temperature: Some(-0.1),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_agent_wire_format_is_camel_case() {
        let agent = Agent::from_request(request("R", "Researcher"), crate::time::now()).unwrap();
        let value = serde_json::to_value(&agent).unwrap();
        assert!(value.get("systemPrompt").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("system_prompt").is_none());
    }

    #[test]
    fn test_tool_parameters_optional_on_the_wire() {
        let tool: Tool = serde_json::from_value(json!({"name": "search"})).unwrap();
        assert_eq!(tool.id, "");
        assert!(tool.parameters.is_none());
        let encoded = serde_json::to_value(&tool).unwrap();
        assert!(encoded.get("parameters").is_none());
    }
}
