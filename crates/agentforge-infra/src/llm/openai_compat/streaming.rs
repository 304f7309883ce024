//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s chat completion chunk stream to the
//! provider-agnostic [`StreamEvent`] enum defined in `agentforge-types`.
//!
//! Tool call arguments arrive as partial JSON fragments across multiple
//! streaming chunks (keyed by tool call index). These are accumulated and
//! emitted as [`StreamEvent::ToolUseComplete`] when a finish_reason is
//! received or the stream ends.

use std::collections::HashMap;

use async_openai::error::OpenAIError;
use async_openai::types::chat::{CreateChatCompletionStreamResponse, FinishReason};
use futures_util::{Stream, StreamExt};

use agentforge_core::llm::provider::EventStream;
use agentforge_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::map_openai_error;

/// Accumulates partial JSON fragments for a tool call during streaming.
struct ToolCallAccumulator {
    id: String,
    name: String,
    json_buffer: String,
}

/// Per-stream decoding state.
#[derive(Default)]
pub(crate) struct StreamState {
    tool_accumulators: HashMap<u32, ToolCallAccumulator>,
}

impl StreamState {
    /// Turn one chunk into zero or more events.
    pub(crate) fn handle_chunk(
        &mut self,
        chunk: CreateChatCompletionStreamResponse,
    ) -> Result<Vec<StreamEvent>, LlmError> {
        let mut events = Vec::new();

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content {
                if !text.is_empty() {
                    events.push(StreamEvent::TextDelta { index: 0, text });
                }
            }

            for tc in choice.delta.tool_calls.unwrap_or_default() {
                let acc = self
                    .tool_accumulators
                    .entry(tc.index)
                    .or_insert_with(|| ToolCallAccumulator {
                        id: String::new(),
                        name: String::new(),
                        json_buffer: String::new(),
                    });

                // The first fragment carries id and name.
                if let Some(id) = tc.id.filter(|id| !id.is_empty()) {
                    acc.id = id;
                }
                if let Some(function) = tc.function {
                    if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                        acc.name = name;
                    }
                    if let Some(arguments) = function.arguments {
                        acc.json_buffer.push_str(&arguments);
                    }
                }
            }

            if let Some(finish_reason) = choice.finish_reason {
                events.extend(self.drain_tool_calls()?);
                events.push(StreamEvent::MessageDelta {
                    stop_reason: map_finish_reason(&finish_reason),
                });
            }
        }

        // Usage arrives on the final chunk (with an empty choices array).
        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::Usage(Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }));
        }

        Ok(events)
    }

    /// Emit every accumulated tool call in index order.
    pub(crate) fn drain_tool_calls(&mut self) -> Result<Vec<StreamEvent>, LlmError> {
        let mut indices: Vec<u32> = self.tool_accumulators.keys().copied().collect();
        indices.sort_unstable();

        let mut events = Vec::with_capacity(indices.len());
        for idx in indices {
            if let Some(acc) = self.tool_accumulators.remove(&idx) {
                let input: serde_json::Value = if acc.json_buffer.is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(&acc.json_buffer).map_err(|e| {
                        LlmError::Deserialization(format!(
                            "tool call JSON for '{}': {e}",
                            acc.name
                        ))
                    })?
                };
                events.push(StreamEvent::ToolUseComplete {
                    id: acc.id,
                    name: acc.name,
                    input,
                });
            }
        }
        Ok(events)
    }
}

pub(crate) fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Stop => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::ToolUse,
        FinishReason::ContentFilter => StopReason::ContentFilter,
    }
}

/// Map an async-openai chunk stream to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` once the first chunk arrived
/// 2. `TextDelta` for each text content chunk
/// 3. `ToolUseComplete` when tool call JSON is fully assembled
/// 4. `MessageDelta` with the stop reason when finish_reason appears
/// 5. `Usage` when the endpoint reports token usage
/// 6. `Done` at the end of the stream
///
/// A request the endpoint rejects (bad key, unknown model) fails before
/// `Connected`, so callers waiting on the first event see the error.
pub fn map_openai_stream<S>(stream: S) -> EventStream
where
    S: Stream<Item = Result<CreateChatCompletionStreamResponse, OpenAIError>> + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        let mut stream = Box::pin(stream);
        let mut state = StreamState::default();
        let mut connected = false;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(map_openai_error)?;
            if !connected {
                connected = true;
                yield StreamEvent::Connected;
            }
            for event in state.handle_chunk(chunk)? {
                yield event;
            }
        }

        if !connected {
            yield StreamEvent::Connected;
        }

        // Tool calls left open by a stream without finish_reason.
        for event in state.drain_tool_calls()? {
            yield event;
        }

        yield StreamEvent::Done;
    })
}
