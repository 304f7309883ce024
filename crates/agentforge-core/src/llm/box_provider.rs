//! BoxLlmProvider -- type-erased wrapper for runtime provider selection.
//!
//! `LlmProvider` is already object-safe, so the wrapper only pins the trait
//! object behind a stable concrete type shared by services and tests.

use std::sync::Arc;

use agentforge_types::llm::CompletionRequest;

use super::provider::{EventStream, LlmProvider};

/// Type-erased LLM provider. Cheap to clone.
#[derive(Clone)]
pub struct BoxLlmProvider {
    inner: Arc<dyn LlmProvider>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a streaming completion request. Returns a stream of events.
    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.stream(request)
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.inner.name())
            .finish()
    }
}
