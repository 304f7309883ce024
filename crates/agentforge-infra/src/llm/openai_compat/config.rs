//! Connection settings for OpenAI-compatible chat completion endpoints.

use secrecy::SecretString;

/// Default OpenRouter API base.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Sent as `HTTP-Referer` when no site URL is configured.
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Sent as `X-Title` when no site name is configured.
pub const DEFAULT_SITE_NAME: &str = "AgentForge";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
///
/// Intentionally not `Debug`: it carries the API key.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openrouter").
    pub provider_name: String,
    /// Base URL for the API, without the `/chat/completions` suffix.
    pub base_url: String,
    /// API key. `None` leaves the provider unconfigured: every stream fails.
    pub api_key: Option<SecretString>,
    /// Value of the `HTTP-Referer` attribution header.
    pub site_url: String,
    /// Value of the `X-Title` attribution header.
    pub site_name: String,
}

/// OpenRouter configuration with the default attribution headers.
pub fn openrouter_defaults(api_key: Option<SecretString>) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openrouter".into(),
        base_url: OPENROUTER_BASE_URL.into(),
        api_key,
        site_url: DEFAULT_SITE_URL.into(),
        site_name: DEFAULT_SITE_NAME.into(),
    }
}
