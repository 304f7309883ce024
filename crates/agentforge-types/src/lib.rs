//! Shared domain types for AgentForge.
//!
//! This crate contains the core domain types used across the AgentForge platform:
//! Agent, Tool, Conversation, Deployment, User, the LLM streaming vocabulary,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod auth;
pub mod conversation;
pub mod deployment;
pub mod error;
pub mod llm;
pub mod time;
