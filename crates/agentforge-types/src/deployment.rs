//! Deployment records: one authenticated public endpoint per agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every generated deployment API key.
pub const API_KEY_PREFIX: &str = "af_";

/// A deployed agent endpoint.
///
/// Lifecycle: absent -> active <-> inactive; deletion removes it from any state.
/// `api_key` is generated once and never rotated; `request_count` only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub agent_id: String,
    pub api_key: String,
    pub is_active: bool,
    pub request_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Deployment {
    /// A fresh active deployment with a zero request count.
    pub fn new(agent_id: impl Into<String>, api_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            agent_id: agent_id.into(),
            api_key: api_key.into(),
            is_active: true,
            request_count: 0,
            created_at: now,
        }
    }

    /// Public invocation path for the agent behind this deployment.
    pub fn endpoint(&self) -> String {
        endpoint_for(&self.agent_id)
    }
}

/// Public invocation path for an agent id.
pub fn endpoint_for(agent_id: &str) -> String {
    format!("/api/deploy/{agent_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deployment_defaults() {
        let dep = Deployment::new("agent-1", "af_key", crate::time::now());
        assert!(dep.is_active);
        assert_eq!(dep.request_count, 0);
        assert_eq!(dep.endpoint(), "/api/deploy/agent-1");
    }

    #[test]
    fn test_deployment_wire_format() {
        let dep = Deployment::new("agent-1", "af_key", crate::time::now());
        let value = serde_json::to_value(&dep).unwrap();
        assert_eq!(value["agentId"], "agent-1");
        assert_eq!(value["apiKey"], "af_key");
        assert_eq!(value["isActive"], true);
        assert_eq!(value["requestCount"], 0);
    }
}
