//! Chat proxy service.
//!
//! Two entry points share one streaming path:
//! - [`ChatService::chat`] serves the session-authenticated builder chat and
//!   advertises the agent's tools to the provider.
//! - [`ChatService::chat_deployment`] serves the public, API-key protected
//!   deployment route, counts usage, and never advertises tools.
//!
//! Both resolve the agent, assemble the prompt, open the provider stream and
//! wait for its first event before handing a [`TextStream`] to the caller, so
//! a provider that fails to connect surfaces as an error instead of an empty
//! response body.

use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, info, info_span};

use agentforge_types::agent::Agent;
use agentforge_types::error::{ChatError, RepositoryError};
use agentforge_types::llm::{ChatMessage, CompletionRequest, LlmError};

use crate::agent::prompt::{AssembledPrompt, PromptAssembler};
use crate::chat::relay::{DEFAULT_RELAY_CAPACITY, TextStream, spawn_relay};
use crate::llm::box_provider::BoxLlmProvider;
use crate::repository::{AgentRepository, DeploymentRepository};

/// Orchestrates chat requests against the configured provider.
pub struct ChatService<R: AgentRepository + DeploymentRepository> {
    repo: R,
    provider: BoxLlmProvider,
    relay_capacity: usize,
}

impl<R: AgentRepository + DeploymentRepository> ChatService<R> {
    pub fn new(repo: R, provider: BoxLlmProvider) -> Self {
        Self {
            repo,
            provider,
            relay_capacity: DEFAULT_RELAY_CAPACITY,
        }
    }

    /// Override the relay channel capacity.
    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        self.relay_capacity = capacity;
        self
    }

    /// Builder chat: `agentId` required, agent must exist, `messages` must be a list.
    pub async fn chat(
        &self,
        agent_id: Option<&str>,
        messages: Option<Value>,
    ) -> Result<TextStream, ChatError> {
        let agent_id = match agent_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(ChatError::Validation("Agent ID is required".to_string())),
        };

        let agent = self.load_agent(agent_id).await?;
        let messages = parse_messages(messages)?;

        let assembled = PromptAssembler::assemble(&agent);
        self.open_stream(&agent, assembled, messages, true).await
    }

    /// Deployment chat. Checks run strictly in this order: deployment exists,
    /// deployment active, API key matches, agent exists, body has a message
    /// list. Only then is the usage counter incremented.
    pub async fn chat_deployment(
        &self,
        agent_id: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> Result<TextStream, ChatError> {
        let deployment = self
            .repo
            .get_deployment_by_agent_id(agent_id)
            .await
            .map_err(storage_error)?
            .ok_or(ChatError::DeploymentNotFound)?;

        if !deployment.is_active {
            return Err(ChatError::DeploymentInactive);
        }

        if api_key != Some(deployment.api_key.as_str()) {
            return Err(ChatError::InvalidApiKey);
        }

        let agent = self.load_agent(agent_id).await?;
        let messages = parse_messages(body.and_then(|mut b| b.get_mut("messages").map(Value::take)))?;

        self.repo
            .increment_request_count(&deployment.id)
            .await
            .map_err(storage_error)?;
        debug!(deployment_id = %deployment.id, "deployment request counted");

        let assembled = PromptAssembler::assemble(&agent);
        self.open_stream(&agent, assembled, messages, false).await
    }

    async fn load_agent(&self, agent_id: &str) -> Result<Agent, ChatError> {
        self.repo
            .get_agent(agent_id)
            .await
            .map_err(storage_error)?
            .ok_or(ChatError::AgentNotFound)
    }

    async fn open_stream(
        &self,
        agent: &Agent,
        assembled: AssembledPrompt,
        messages: Vec<ChatMessage>,
        with_tools: bool,
    ) -> Result<TextStream, ChatError> {
        let request = CompletionRequest {
            model: agent.model.clone(),
            messages,
            system: Some(assembled.system_prompt),
            temperature: Some(agent.temperature),
            tools: if with_tools {
                assembled.tools.values().map(|t| t.definition()).collect()
            } else {
                Vec::new()
            },
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.provider.name(),
            gen_ai.agent.id = %agent.id,
            gen_ai.request.model = %request.model,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
        );

        info!(
            agent_id = %agent.id,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "opening provider stream"
        );

        let mut events = self.provider.stream(request);
        let first = match events.next().await {
            Some(Ok(event)) => event,
            Some(Err(e)) => return Err(ChatError::Provider(e)),
            None => {
                return Err(ChatError::Provider(LlmError::Stream(
                    "provider closed the stream before responding".to_string(),
                )));
            }
        };

        let tools = if with_tools {
            assembled.tools
        } else {
            Default::default()
        };

        Ok(spawn_relay(first, events, tools, self.relay_capacity, span))
    }
}

/// Validate the caller-supplied `messages` value.
fn parse_messages(messages: Option<Value>) -> Result<Vec<ChatMessage>, ChatError> {
    let Some(Value::Array(items)) = messages else {
        return Err(ChatError::Validation(
            "Messages array is required".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| ChatError::Validation(format!("Invalid message at index {i}: {e}")))
        })
        .collect()
}

fn storage_error(e: RepositoryError) -> ChatError {
    ChatError::StorageError(e.to_string())
}
