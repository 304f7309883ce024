//! Provider stream to client text stream relay.
//!
//! A producer task pulls events from the provider and pushes text deltas into
//! a bounded channel; the HTTP body drains the receiving end. When the client
//! goes away the channel closes, the producer returns, and dropping the
//! provider stream cancels the upstream request.

use std::collections::BTreeMap;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, Span, debug, warn};

use agentforge_types::llm::{LlmError, StreamEvent};

use crate::agent::tool::ToolSchema;
use crate::llm::provider::EventStream;

/// Incrementally produced response text.
pub type TextStream = ReceiverStream<Result<String, LlmError>>;

/// Default channel capacity between the producer task and the response body.
pub const DEFAULT_RELAY_CAPACITY: usize = 32;

/// Spawn the producer task and return the consuming end.
///
/// `first` is the event already pulled from `events` by the caller.
/// Tool calls are routed to the mock executor in `tools` and never reach the
/// text stream. A provider error is forwarded once and ends the relay.
pub fn spawn_relay(
    first: StreamEvent,
    mut events: EventStream,
    tools: BTreeMap<String, ToolSchema>,
    capacity: usize,
    span: Span,
) -> TextStream {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(
        async move {
            let mut pending = Some(first);
            loop {
                let event = match pending.take() {
                    Some(event) => Ok(event),
                    None => tokio::select! {
                        _ = tx.closed() => {
                            debug!("client disconnected, dropping upstream stream");
                            return;
                        }
                        next = events.next() => match next {
                            Some(event) => event,
                            None => return,
                        },
                    },
                };

                match event {
                    Ok(StreamEvent::TextDelta { text, .. }) => {
                        if tx.send(Ok(text)).await.is_err() {
                            debug!("client disconnected mid-send");
                            return;
                        }
                    }
                    Ok(StreamEvent::ToolUseComplete { id, name, input }) => match tools.get(&name) {
                        Some(schema) => {
                            let output = schema.execute_mock(input, agentforge_types::time::now());
                            debug!(tool_call_id = %id, tool = %name, %output, "mock tool executed");
                        }
                        None => warn!(tool_call_id = %id, tool = %name, "provider called an unknown tool"),
                    },
                    Ok(StreamEvent::MessageDelta { stop_reason }) => {
                        debug!(%stop_reason, "provider finished message");
                    }
                    Ok(StreamEvent::Usage(usage)) => {
                        debug!(
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "provider usage"
                        );
                    }
                    Ok(StreamEvent::Done) => return,
                    Ok(StreamEvent::Connected) => {}
                    Err(e) => {
                        warn!(error = %e, "provider stream failed");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
        .instrument(span),
    );

    ReceiverStream::new(rx)
}
