//! Redis-over-REST client.
//!
//! Commands are sent as a JSON array (`["SET", "key", "value"]`) in the body
//! of a `POST` to the endpoint, authenticated with a bearer token, which is
//! the wire format of Upstash-compatible Redis REST services. Replies are
//! `{"result": ...}` or `{"error": "..."}`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use agentforge_types::error::RepositoryError;

/// Errors from the REST key-value endpoint.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("kv request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("kv endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("kv command failed: {0}")]
    Command(String),

    #[error("unexpected kv reply: {0}")]
    Decode(String),
}

impl From<KvError> for RepositoryError {
    fn from(e: KvError) -> Self {
        match e {
            KvError::Http(_) => RepositoryError::Connection,
            other => RepositoryError::Query(other.to_string()),
        }
    }
}

/// The subset of Redis commands the key-value store needs.
pub trait KvClient: Send + Sync {
    /// `GET key`
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, KvError>> + Send;

    /// `SET key value`
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// `SET key value NX`. Returns `false` when the key already existed.
    fn set_nx(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<bool, KvError>> + Send;

    /// `DEL key`. Returns whether the key existed.
    fn del(&self, key: &str) -> impl std::future::Future<Output = Result<bool, KvError>> + Send;

    /// `SADD key member`
    fn sadd(
        &self,
        key: &str,
        member: &str,
    ) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// `SREM key member`
    fn srem(
        &self,
        key: &str,
        member: &str,
    ) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// `SMEMBERS key`
    fn smembers(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, KvError>> + Send;
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one REST reply into its `result` value.
fn decode_reply(status: u16, body: &str) -> Result<Value, KvError> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<RestReply>(body) {
        Ok(RestReply {
            error: Some(message),
            ..
        }) => Err(KvError::Command(message)),
        Ok(reply) if success => Ok(reply.result.unwrap_or(Value::Null)),
        Err(e) if success => Err(KvError::Decode(e.to_string())),
        _ => Err(KvError::Status {
            status,
            body: body.to_string(),
        }),
    }
}

fn as_optional_string(value: Value) -> Result<Option<String>, KvError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(KvError::Decode(format!("expected string, got {other}"))),
    }
}

fn as_count(value: Value) -> Result<i64, KvError> {
    value
        .as_i64()
        .ok_or_else(|| KvError::Decode(format!("expected integer, got {value}")))
}

/// HTTP client for an Upstash-compatible Redis REST endpoint.
///
/// The token is only exposed when building the `Authorization` header.
pub struct UpstashClient {
    http: reqwest::Client,
    url: String,
    token: SecretString,
}

impl UpstashClient {
    pub fn new(url: impl Into<String>, token: SecretString) -> Result<Self, KvError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            url: url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn command(&self, args: &[&str]) -> Result<Value, KvError> {
        tracing::trace!(command = args.first().copied().unwrap_or_default(), "kv command");

        let response = self
            .http
            .post(&self.url)
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .json(args)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        decode_reply(status, &body)
    }
}

impl KvClient for UpstashClient {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        as_optional_string(self.command(&["GET", key]).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.command(&["SET", key, value]).await?;
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, KvError> {
        let reply = self.command(&["SET", key, value, "NX"]).await?;
        Ok(!reply.is_null())
    }

    async fn del(&self, key: &str) -> Result<bool, KvError> {
        Ok(as_count(self.command(&["DEL", key]).await?)? > 0)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), KvError> {
        self.command(&["SADD", key, member]).await?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), KvError> {
        self.command(&["SREM", key, member]).await?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        match self.command(&["SMEMBERS", key]).await? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(KvError::Decode(format!("expected set member, got {other}"))),
                })
                .collect(),
            other => Err(KvError::Decode(format!("expected array, got {other}"))),
        }
    }
}
