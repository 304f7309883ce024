//! HTTP/REST API layer for AgentForge.
//!
//! Axum-based JSON API under `/api/` with cookie sessions for the builder
//! routes and per-deployment API keys for the public chat route.

pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
