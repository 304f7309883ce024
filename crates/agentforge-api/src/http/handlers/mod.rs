//! HTTP request handlers for the REST API.

pub mod agents;
pub mod auth;
pub mod chat;
pub mod deploy;
