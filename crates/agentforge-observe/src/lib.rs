//! Observability setup for AgentForge: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
