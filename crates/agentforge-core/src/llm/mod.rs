//! LLM provider abstractions for AgentForge.
//!
//! - `LlmProvider`: trait for concrete streaming provider implementations
//! - `BoxLlmProvider`: type-erased wrapper shared across services

pub mod box_provider;
pub mod provider;
