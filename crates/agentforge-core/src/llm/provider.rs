//! LlmProvider trait definition.
//!
//! This is the core abstraction that the upstream chat-completion backend
//! implements. `stream` returns `Pin<Box<dyn Stream>>` so that the trait
//! stays object-safe for the `BoxLlmProvider` wrapper.

use std::pin::Pin;

use futures_util::Stream;

use agentforge_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// Boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for LLM provider backends (OpenRouter and other OpenAI-compatible APIs).
///
/// Implementations live in agentforge-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events.
    ///
    /// The first item is `Connected` once the provider accepted the request,
    /// or an error if it did not.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
