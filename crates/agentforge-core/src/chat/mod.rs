//! Streaming chat proxy: request validation, deployment authorization and
//! the provider-to-client relay.

pub mod relay;
pub mod service;
