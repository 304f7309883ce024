//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `agentforge-core` and a factory ([`create_provider`])
//! that wraps it for runtime use.
//!
//! [`LlmProvider`]: agentforge_core::llm::provider::LlmProvider

pub mod openai_compat;

use agentforge_core::llm::box_provider::BoxLlmProvider;
use agentforge_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from an [`OpenAiCompatConfig`].
///
/// A missing API key is not an error here: the server still starts and chat
/// requests fail with a provider error until a key is configured.
pub fn create_provider(config: OpenAiCompatConfig) -> Result<BoxLlmProvider, LlmError> {
    if config.api_key.is_none() {
        tracing::warn!(
            provider = %config.provider_name,
            "no provider API key configured; chat requests will fail"
        );
    }
    let provider = OpenAiCompatibleProvider::new(config)?;
    Ok(BoxLlmProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    use super::openai_compat::config::openrouter_defaults;

    #[test]
    fn test_create_provider_openrouter() {
        let config = openrouter_defaults(Some(SecretString::from("sk-or-test".to_string())));
        let provider = create_provider(config).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn test_create_provider_without_key() {
        let provider = create_provider(openrouter_defaults(None)).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }
}
