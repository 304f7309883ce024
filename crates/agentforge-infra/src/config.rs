//! Configuration loader for AgentForge.
//!
//! Settings are layered: built-in defaults, then `{data_dir}/config.toml`,
//! then environment variables, then command-line overrides. A missing
//! `config.toml` is normal. A malformed one is ignored and reported through
//! [`AppConfig::warnings`], since loading happens before tracing is up.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::auth::{DEFAULT_SECRET, DEFAULT_USERS};
use crate::llm::openai_compat::config::{DEFAULT_SITE_NAME, DEFAULT_SITE_URL, OPENROUTER_BASE_URL};
use crate::sqlite::pool::database_url_for;

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Capacity of the per-request relay channel when none is configured.
pub const DEFAULT_RELAY_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown storage backend '{0}' (expected sqlite, memory or kv)")]
    UnknownBackend(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("the kv backend needs KV_REST_API_URL and KV_REST_API_TOKEN")]
    MissingKvCredentials,
}

/// Which storage implementation backs the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
    Kv,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Kv => write!(f, "kv"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            "kv" => Ok(StorageBackend::Kv),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub production: Option<bool>,
    pub otel: Option<bool>,
    pub auth: AuthSection,
    pub provider: ProviderSection,
    pub storage: StorageSection,
    pub chat: ChatSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub users: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub site_url: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: Option<StorageBackend>,
    pub database_url: Option<String>,
    pub kv_url: Option<String>,
    pub kv_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    pub relay_capacity: Option<usize>,
}

/// Load `{data_dir}/config.toml`.
///
/// A missing file yields the defaults with no warning. A file that cannot
/// be read or parsed also yields the defaults, together with a message for
/// the caller to log.
pub async fn load_file_config(data_dir: &Path) -> (FileConfig, Option<String>) {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (FileConfig::default(), None);
        }
        Err(err) => {
            let warning = format!("failed to read {}: {err}, using defaults", config_path.display());
            return (FileConfig::default(), Some(warning));
        }
    };

    match toml::from_str::<FileConfig>(&content) {
        Ok(config) => (config, None),
        Err(err) => {
            let warning = format!("failed to parse {}: {err}, using defaults", config_path.display());
            (FileConfig::default(), Some(warning))
        }
    }
}

/// Values given on the command line. They win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<StorageBackend>,
}

/// Fully resolved process configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub production: bool,
    pub otel: bool,
    pub auth_users: SecretString,
    pub auth_secret: SecretString,
    /// True when the built-in signing secret is in use.
    pub default_secret: bool,
    pub provider_api_key: Option<SecretString>,
    pub provider_base_url: String,
    pub site_url: String,
    pub site_name: String,
    pub backend: StorageBackend,
    pub database_url: String,
    pub kv_url: Option<String>,
    pub kv_token: Option<SecretString>,
    pub relay_capacity: usize,
    /// Problems found while loading, to be logged once tracing is running.
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub async fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| non_empty(env("AGENTFORGE_DATA_DIR")).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let (file, warning) = load_file_config(&data_dir).await;
        let mut config = Self::resolve(data_dir, file, &env, &overrides)?;
        config.warnings.extend(warning);
        Ok(config)
    }

    /// Merge the file layer, an environment lookup and overrides.
    pub fn resolve(
        data_dir: PathBuf,
        file: FileConfig,
        env: &dyn Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| non_empty(env(key));

        let production = match var("AGENTFORGE_ENV") {
            Some(mode) => mode.eq_ignore_ascii_case("production"),
            None => file.production.unwrap_or(false),
        };

        let otel = match var("AGENTFORGE_OTEL") {
            Some(v) => parse_flag("AGENTFORGE_OTEL", &v)?,
            None => file.otel.unwrap_or(false),
        };

        let auth_users = var("AUTH_USERS")
            .or(file.auth.users)
            .unwrap_or_else(|| DEFAULT_USERS.to_string());
        let secret = var("AUTH_SECRET").or(file.auth.secret);
        let default_secret = secret.is_none();
        let auth_secret = secret.unwrap_or_else(|| DEFAULT_SECRET.to_string());

        let kv_url = var("KV_REST_API_URL").or(file.storage.kv_url);
        let kv_token = var("KV_REST_API_TOKEN").or(file.storage.kv_token);

        let backend = match (overrides.backend, var("STORAGE_BACKEND")) {
            (Some(backend), _) => backend,
            (None, Some(name)) => name.parse()?,
            (None, None) => match file.storage.backend {
                Some(backend) => backend,
                None if kv_url.is_some() && kv_token.is_some() => StorageBackend::Kv,
                None => StorageBackend::Sqlite,
            },
        };
        if backend == StorageBackend::Kv && (kv_url.is_none() || kv_token.is_none()) {
            return Err(ConfigError::MissingKvCredentials);
        }

        let database_url = var("DATABASE_URL")
            .or(file.storage.database_url)
            .unwrap_or_else(|| database_url_for(&data_dir));

        let relay_capacity = match var("AGENTFORGE_RELAY_CAPACITY") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "AGENTFORGE_RELAY_CAPACITY",
                    value: v,
                })?,
            None => file
                .chat
                .relay_capacity
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_RELAY_CAPACITY),
        };

        Ok(Self {
            data_dir,
            production,
            otel,
            auth_users: SecretString::from(auth_users),
            auth_secret: SecretString::from(auth_secret),
            default_secret,
            provider_api_key: var("OPENROUTER_API_KEY")
                .or(file.provider.api_key)
                .map(SecretString::from),
            provider_base_url: var("OPENROUTER_BASE_URL")
                .or(file.provider.base_url)
                .unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
            site_url: var("SITE_URL")
                .or(file.provider.site_url)
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            site_name: var("SITE_NAME")
                .or(file.provider.site_name)
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            backend,
            database_url,
            kv_url,
            kv_token: kv_token.map(SecretString::from),
            relay_capacity,
            warnings: Vec::new(),
        })
    }
}

/// Human-readable dump with every secret replaced by a marker.
impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn secret(set: bool) -> &'static str {
            if set { "<redacted>" } else { "<unset>" }
        }

        writeln!(f, "data_dir          = {}", self.data_dir.display())?;
        writeln!(f, "production        = {}", self.production)?;
        writeln!(f, "otel              = {}", self.otel)?;
        writeln!(f, "auth.users        = {}", secret(true))?;
        writeln!(
            f,
            "auth.secret       = {}",
            if self.default_secret { "<default>" } else { secret(true) }
        )?;
        writeln!(f, "provider.api_key  = {}", secret(self.provider_api_key.is_some()))?;
        writeln!(f, "provider.base_url = {}", self.provider_base_url)?;
        writeln!(f, "provider.site_url = {}", self.site_url)?;
        writeln!(f, "provider.site_name= {}", self.site_name)?;
        writeln!(f, "storage.backend   = {}", self.backend)?;
        writeln!(f, "storage.database  = {}", self.database_url)?;
        writeln!(
            f,
            "storage.kv_url    = {}",
            self.kv_url.as_deref().unwrap_or("<unset>")
        )?;
        writeln!(f, "storage.kv_token  = {}", secret(self.kv_token.is_some()))?;
        write!(f, "chat.relay_capacity = {}", self.relay_capacity)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    fn resolve_with(
        vars: &[(&str, &str)],
        file: FileConfig,
        overrides: Overrides,
    ) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let env = move |key: &str| vars.get(key).cloned();
        AppConfig::resolve(PathBuf::from("/srv/af"), file, &env, &overrides)
    }

    #[test]
    fn test_defaults() {
        let config = resolve_with(&[], FileConfig::default(), Overrides::default()).unwrap();

        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert_eq!(config.database_url, "sqlite:///srv/af/agentforge.db?mode=rwc");
        assert_eq!(config.auth_users.expose_secret(), DEFAULT_USERS);
        assert_eq!(config.auth_secret.expose_secret(), DEFAULT_SECRET);
        assert!(config.default_secret);
        assert!(!config.production);
        assert!(!config.otel);
        assert!(config.provider_api_key.is_none());
        assert_eq!(config.provider_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.site_url, "http://localhost:3000");
        assert_eq!(config.site_name, "AgentForge");
        assert_eq!(config.relay_capacity, 32);
    }

    #[test]
    fn test_env_overrides() {
        let config = resolve_with(
            &[
                ("AUTH_SECRET", "s3cret"),
                ("AGENTFORGE_ENV", "production"),
                ("OPENROUTER_API_KEY", "sk-or-1"),
                ("SITE_NAME", "Forge"),
                ("STORAGE_BACKEND", "memory"),
                ("AGENTFORGE_RELAY_CAPACITY", "8"),
                ("AGENTFORGE_OTEL", "1"),
            ],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.auth_secret.expose_secret(), "s3cret");
        assert!(!config.default_secret);
        assert!(config.production);
        assert!(config.otel);
        assert_eq!(
            config.provider_api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-or-1".to_string())
        );
        assert_eq!(config.site_name, "Forge");
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.relay_capacity, 8);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = resolve_with(
            &[("AUTH_SECRET", ""), ("STORAGE_BACKEND", "  ")],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap();
        assert!(config.default_secret);
        assert_eq!(config.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_kv_backend_auto_selected() {
        let config = resolve_with(
            &[
                ("KV_REST_API_URL", "https://kv.example"),
                ("KV_REST_API_TOKEN", "tok"),
            ],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.backend, StorageBackend::Kv);

        // The command line still wins.
        let config = resolve_with(
            &[
                ("KV_REST_API_URL", "https://kv.example"),
                ("KV_REST_API_TOKEN", "tok"),
            ],
            FileConfig::default(),
            Overrides {
                backend: Some(StorageBackend::Memory),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_kv_backend_requires_credentials() {
        let err = resolve_with(
            &[("STORAGE_BACKEND", "kv"), ("KV_REST_API_URL", "https://kv.example")],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKvCredentials));
    }

    #[test]
    fn test_invalid_values() {
        let err = resolve_with(
            &[("STORAGE_BACKEND", "postgres")],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "postgres"));

        let err = resolve_with(
            &[("AGENTFORGE_RELAY_CAPACITY", "0")],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "AGENTFORGE_RELAY_CAPACITY",
                ..
            }
        ));
    }

    #[test]
    fn test_env_wins_over_file() {
        let file: FileConfig = toml::from_str(
            r#"
production = true

[auth]
secret = "from-file"

[provider]
site_url = "https://file.example"

[storage]
backend = "memory"

[chat]
relay_capacity = 4
"#,
        )
        .unwrap();

        let config = resolve_with(&[("AUTH_SECRET", "from-env")], file, Overrides::default())
            .unwrap();
        assert_eq!(config.auth_secret.expose_secret(), "from-env");
        assert_eq!(config.site_url, "https://file.example");
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.relay_capacity, 4);
        assert!(config.production);
    }

    #[test]
    fn test_display_redacts_secrets() {
        let config = resolve_with(
            &[
                ("AUTH_SECRET", "very-secret"),
                ("OPENROUTER_API_KEY", "sk-or-secret"),
            ],
            FileConfig::default(),
            Overrides::default(),
        )
        .unwrap();

        let rendered = config.to_string();
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("sk-or-secret"));
        assert!(!rendered.contains("admin123"));
        assert!(rendered.contains("storage.backend   = sqlite"));

        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
    }

    #[tokio::test]
    async fn test_load_file_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let (config, warning) = load_file_config(tmp.path()).await;
        assert!(config.auth.secret.is_none());
        assert!(config.storage.backend.is_none());
        assert!(warning.is_none());
    }

    #[tokio::test]
    async fn test_load_file_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "[storage]\nbackend = \"sqlite\"\n\n[chat]\nrelay_capacity = 64\n",
        )
        .await
        .unwrap();

        let (config, warning) = load_file_config(tmp.path()).await;
        assert!(warning.is_none());
        assert_eq!(config.storage.backend, Some(StorageBackend::Sqlite));
        assert_eq!(config.chat.relay_capacity, Some(64));
    }

    #[tokio::test]
    async fn test_load_file_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let (config, warning) = load_file_config(tmp.path()).await;
        assert!(config.storage.backend.is_none());
        let warning = warning.unwrap();
        assert!(warning.contains("failed to parse"));
        assert!(warning.contains("config.toml"));
    }

    #[tokio::test]
    async fn test_load_carries_malformed_file_warning() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "[storage\nbackend = ")
            .await
            .unwrap();

        let config = AppConfig::load(Overrides {
            data_dir: Some(tmp.path().to_path_buf()),
            backend: Some(StorageBackend::Memory),
        })
        .await
        .unwrap();

        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("failed to parse"));
    }
}
