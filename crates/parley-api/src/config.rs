use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use parley_persist::{RetryPolicy, StorageBackend};
use parley_types::{AppSettings, PipelineConfig, SessionPolicy};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineSection,
    pub generator: GeneratorConfig,
    pub title: TitleConfig,
    pub settings: SettingsSection,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: "parley".to_string(),
            retry_attempts: 3,
            retry_backoff_ms: 100,
        }
    }
}

impl StorageConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub max_concurrency: usize,
    pub queue_depth: usize,
    pub settle_delay_ms: u64,
    pub session_policy: SessionPolicy,
    pub listing_limit: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            max_concurrency: defaults.max_concurrency,
            queue_depth: defaults.queue_depth,
            settle_delay_ms: defaults.settle_delay.as_millis() as u64,
            session_policy: defaults.session_policy,
            listing_limit: defaults.listing_limit,
        }
    }
}

impl From<PipelineSection> for PipelineConfig {
    fn from(section: PipelineSection) -> Self {
        PipelineConfig::new()
            .with_max_concurrency(section.max_concurrency)
            .with_queue_depth(section.queue_depth)
            .with_settle_delay(Duration::from_millis(section.settle_delay_ms))
            .with_session_policy(section.session_policy)
            .with_listing_limit(section.listing_limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub fragment_delay_ms: u64,
    /// Replaces the bundled demo script when set
    pub fragments: Option<Vec<String>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fragment_delay_ms: 250,
            fragments: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleStrategy {
    #[default]
    Heuristic,
    Generated,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub strategy: TitleStrategy,
    pub max_chars: usize,
    pub timeout_ms: u64,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            strategy: TitleStrategy::Heuristic,
            max_chars: parley_llm::DEFAULT_TITLE_MAX_CHARS,
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsSection {
    pub show_thread_sidebar: bool,
    pub show_threads_tab: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        let defaults = AppSettings::default();
        Self {
            show_thread_sidebar: defaults.show_thread_sidebar,
            show_threads_tab: defaults.show_threads_tab,
        }
    }
}

impl From<SettingsSection> for AppSettings {
    fn from(section: SettingsSection) -> Self {
        Self {
            show_thread_sidebar: section.show_thread_sidebar,
            show_threads_tab: section.show_threads_tab,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to `dev`)
    /// 3. Environment variables, e.g. `PARLEY_PIPELINE__MAX_CONCURRENCY=8`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets come from ENV only, and only the mongodb backend needs one
        cfg.mongodb_uri = std::env::var("MONGODB_URI").unwrap_or_default();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Mongodb && self.mongodb_uri.is_empty() {
            return Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        self.pipeline.clone().into()
    }
}
