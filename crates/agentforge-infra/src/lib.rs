//! Infrastructure layer for AgentForge.
//!
//! Contains implementations of the repository and provider traits defined in
//! `agentforge-core`: SQLite, in-memory and key-value storage, the
//! OpenAI-compatible streaming client, credential/session handling and the
//! configuration loader that selects between them at startup.

pub mod auth;
pub mod backend;
pub mod config;
pub mod kv;
pub mod llm;
pub mod memory;
pub mod sqlite;

#[cfg(test)]
mod store_contract;
