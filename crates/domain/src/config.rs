//! Environment-driven configuration (§6.5).
//!
//! Everything is sourced from a key-value environment map. There is no
//! config file in this system — the gateway reads `std::env` once at
//! startup and builds a `Config`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    Off,
    Vector,
    Hybrid,
}

impl Default for MemoryMode {
    fn default() -> Self {
        MemoryMode::Off
    }
}

impl std::str::FromStr for MemoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(MemoryMode::Off),
            "vector" => Ok(MemoryMode::Vector),
            "hybrid" => Ok(MemoryMode::Hybrid),
            other => Err(format!("unknown MEMORY_MODE: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDefaults {
    pub openai_base_url: String,
    pub deepseek_base_url: String,
    pub ollama_base_url: String,
    pub gemini_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDiceConfig {
    pub enabled: bool,
    pub good_prob: f64,
    pub bad_prob: f64,
    pub rebel_prob: f64,
    pub min_events: u32,
    pub max_events: u32,
    pub hemisphere: String,
}

impl Default for EventDiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            good_prob: 0.5,
            bad_prob: 0.3,
            rebel_prob: 0.1,
            min_events: 1,
            max_events: 3,
            hemisphere: "northern".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub mode: MemoryMode,
    pub embed_provider: Option<String>,
    pub embed_dim: Option<u32>,
}

#[derive(Clone)]
pub struct Config {
    pub app_env: String,
    pub server: ServerConfig,
    pub db_url: String,
    /// The operator-supplied secret `APP_SECRET_KEY` is wrapped so it never
    /// participates in `{:?}`/`{}` formatting (see [`crate::secret::PlainSecret`]).
    pub app_secret_key: crate::secret::PlainSecret,
    pub default_post_gen_delay_sec: u32,
    pub default_tick_label: String,
    pub provider_defaults: ProviderDefaults,
    pub memory: MemoryConfig,
    pub event_dice: EventDiceConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("server", &self.server)
            .field("db_url", &self.db_url)
            .field("app_secret_key", &self.app_secret_key)
            .field(
                "default_post_gen_delay_sec",
                &self.default_post_gen_delay_sec,
            )
            .field("default_tick_label", &self.default_tick_label)
            .field("provider_defaults", &self.provider_defaults)
            .field("memory", &self.memory)
            .field("event_dice", &self.event_dice)
            .finish()
    }
}

/// Severity level for a configuration issue (mirrors the teacher's
/// `ConfigError`/`ConfigSeverity` validation pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Build configuration from `std::env`. Does not validate — call
    /// [`Config::validate`] and fail startup on any `Error`-severity issue
    /// (§7 `ConfigError` → fatal on startup).
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["http://localhost:*".to_string()]);

        let memory_mode = std::env::var("MEMORY_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            app_env: env_or("APP_ENV", "development"),
            server: ServerConfig {
                host: env_or("APP_HOST", "127.0.0.1"),
                port,
                cors_origins,
            },
            db_url: env_or("DB_URL", "sqlite://./worldline.db?mode=rwc"),
            app_secret_key: crate::secret::PlainSecret::new(
                std::env::var("APP_SECRET_KEY").unwrap_or_default(),
            ),
            default_post_gen_delay_sec: std::env::var("DEFAULT_POST_GEN_DELAY_SEC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            default_tick_label: env_or("DEFAULT_TICK_LABEL", "1 month"),
            provider_defaults: ProviderDefaults {
                openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
                deepseek_base_url: env_or("DEEPSEEK_BASE_URL", "https://api.deepseek.com"),
                ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
                gemini_base_url: env_or(
                    "GEMINI_BASE_URL",
                    "https://generativelanguage.googleapis.com",
                ),
            },
            memory: MemoryConfig {
                mode: memory_mode,
                embed_provider: std::env::var("EMBED_PROVIDER").ok(),
                embed_dim: std::env::var("EMBED_DIM").ok().and_then(|v| v.parse().ok()),
            },
            event_dice: EventDiceConfig {
                enabled: std::env::var("EVENT_DICE_ENABLED")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
                good_prob: env_f64("EVENT_DICE_GOOD_PROB", 0.5),
                bad_prob: env_f64("EVENT_DICE_BAD_PROB", 0.3),
                rebel_prob: env_f64("EVENT_DICE_REBEL_PROB", 0.1),
                min_events: env_u32("EVENT_DICE_MIN_EVENTS", 1),
                max_events: env_u32("EVENT_DICE_MAX_EVENTS", 3),
                hemisphere: env_or("EVENT_DICE_HEMISPHERE", "northern"),
            },
        }
    }

    /// Validate the configuration and return a list of issues (§7 `ConfigError`).
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.app_secret_key.expose().is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "APP_SECRET_KEY".into(),
                message: "APP_SECRET_KEY is required and must be non-empty (I5 / §6.5)".into(),
            });
        }

        if self.server.port == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "APP_PORT".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.event_dice.min_events > self.event_dice.max_events {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "EVENT_DICE_MIN_EVENTS".into(),
                message: "min_events is greater than max_events".into(),
            });
        }

        issues
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_key_is_error() {
        let cfg = Config {
            app_secret_key: crate::secret::PlainSecret::new(""),
            ..Config::from_env()
        };
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.severity == ConfigSeverity::Error && i.field == "APP_SECRET_KEY"));
    }

    #[test]
    fn event_dice_default_disabled() {
        let cfg = Config::from_env();
        assert!(!cfg.event_dice.enabled);
    }
}
