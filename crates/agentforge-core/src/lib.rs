//! Business logic and repository trait definitions for AgentForge.
//!
//! This crate defines the "ports" (repository traits, `LlmProvider`) that the
//! infrastructure layer implements, plus the services built on them. It
//! depends only on `agentforge-types` -- never on `agentforge-infra` or any
//! database/IO crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod repository;
pub mod service;
