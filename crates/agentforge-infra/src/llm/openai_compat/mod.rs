//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] talks to any endpoint that speaks
//! the OpenAI chat completions protocol. OpenRouter is the default target.
//!
//! Uses [`async_openai`] for type-safe request/response handling and
//! built-in SSE streaming. OpenRouter's attribution headers ride on the
//! underlying `reqwest` client.

pub mod config;
pub mod streaming;

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionStreamOptions,
    CreateChatCompletionRequest,
};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use agentforge_core::llm::provider::{EventStream, LlmProvider};
use agentforge_types::llm::{ChatMessage, ChatRole, CompletionRequest, LlmError};

use self::config::OpenAiCompatConfig;
use self::streaming::map_openai_stream;

/// Unified provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// Does NOT derive Debug: the key lives inside the `async_openai::Client`.
pub struct OpenAiCompatibleProvider {
    /// `None` when no API key is configured.
    client: Option<Client<OpenAIConfig>>,
    provider_name: String,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider from a configuration.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = match config.api_key {
            Some(ref api_key) => {
                let http_client = reqwest::Client::builder()
                    .connect_timeout(Duration::from_secs(30))
                    .default_headers(attribution_headers(&config)?)
                    .build()
                    .map_err(|e| LlmError::Provider {
                        message: format!("failed to create HTTP client: {e}"),
                    })?;

                let openai_config = OpenAIConfig::new()
                    .with_api_key(api_key.expose_secret())
                    .with_api_base(config.base_url.trim_end_matches('/'));

                Some(Client::with_config(openai_config).with_http_client(http_client))
            }
            None => None,
        };

        Ok(Self {
            client,
            provider_name: config.provider_name,
        })
    }
}

/// `HTTP-Referer` and `X-Title`, sent with every request.
fn attribution_headers(config: &OpenAiCompatConfig) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("http-referer", &config.site_url),
        ("x-title", &config.site_name),
    ] {
        let value = HeaderValue::from_str(value).map_err(|e| LlmError::Provider {
            message: format!("invalid {name} header value: {e}"),
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}

fn to_openai_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
    let content = msg.content.clone();
    match msg.role {
        ChatRole::System => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(content),
                name: None,
            })
        }
        ChatRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(content),
            name: None,
        }),
        ChatRole::Assistant => {
            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(content)),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
        ChatRole::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(content),
            tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
        }),
    }
}

/// Build a streaming [`CreateChatCompletionRequest`] from a [`CompletionRequest`].
fn build_request(request: &CompletionRequest) -> Result<CreateChatCompletionRequest, LlmError> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(ref system) = request.system {
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                name: None,
            },
        ));
    }
    messages.extend(request.messages.iter().map(to_openai_message));

    let mut req = CreateChatCompletionRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature.map(|t| t as f32),
        stream: Some(true),
        stream_options: Some(ChatCompletionStreamOptions {
            include_usage: Some(true),
            include_obfuscation: None,
        }),
        ..Default::default()
    };

    if !request.tools.is_empty() {
        // Function tools in their wire shape; the request field types them.
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        req.tools = Some(
            serde_json::from_value(Value::Array(tools))
                .map_err(|e| LlmError::InvalidRequest(format!("tool definition: {e}")))?,
        );
    }

    Ok(req)
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let Some(client) = self.client.clone() else {
            let provider = self.provider_name.clone();
            return Box::pin(futures_util::stream::once(async move {
                Err(LlmError::NotConfigured(format!("{provider} API key is not set")))
            }));
        };

        let oai_request = match build_request(&request) {
            Ok(req) => req,
            Err(e) => return Box::pin(futures_util::stream::once(async move { Err(e) })),
        };

        tracing::debug!(
            provider = %self.provider_name,
            model = %request.model,
            tools = request.tools.len(),
            "opening chat completion stream"
        );

        Box::pin(async_stream::try_stream! {
            let oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            let mut inner = map_openai_stream(oai_stream);
            while let Some(event) = inner.next().await {
                yield event?;
            }
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
pub(crate) fn map_openai_error(err: OpenAIError) -> LlmError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Invalid API key")
                || api_err.message.contains("No auth credentials")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: api_err.message.clone(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(502 | 503 | 529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => LlmError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
