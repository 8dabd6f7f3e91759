use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the chat-completions API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file holding the `users` table.
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "users.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub referer: String,
    pub title: String,
    pub normal_latency_ms: u64,
    pub deep_search_latency_ms: u64,
    /// Only for non-versioned local config files; the env var wins when both are set.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "deepseek/deepseek-r1:free".to_string(),
            timeout_seconds: 30,
            referer: "http://localhost:8501".to_string(),
            title: "Sustainable Fashion Advisor".to_string(),
            normal_latency_ms: 1000,
            deep_search_latency_ms: 2000,
            api_key: None,
        }
    }
}

/// Argon2id cost parameters for new password hashes.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Sessions unused for this long are dropped from memory.
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_idle_secs: 3600,
            session_sweep_secs: 60,
        }
    }
}

/// Fatal conditions that stop the process before any session begins.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("API key not found. Please set OPENROUTER_API_KEY or model.api_key in your local config")]
    MissingApiKey,
}

impl AdvisorConfig {
    /// Load the TOML file at `path`, layered with `ADVISOR__SECTION__KEY` env overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix("ADVISOR").separator("__"))
    }

    fn load_with_env(path: &str, env: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?;
        s.try_deserialize()
    }

    /// Resolve the API key once at startup: env var first, then the config file.
    pub fn resolve_api_key(&self) -> Result<String, StartupError> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(from_env, self.model.api_key.clone())
    }
}

fn pick_api_key(
    from_env: Option<String>,
    from_file: Option<String>,
) -> Result<String, StartupError> {
    [from_env, from_file]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .ok_or(StartupError::MissingApiKey)
}
