//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `afolu.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use afolu_adapter_earth_engine::EarthEngineConfig;
use afolu_domain::service::ServiceKind;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Which analysis this process serves.
    pub service: ServiceConfig,
    /// Imagery platform settings.
    pub platform: PlatformConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub kind: ServiceKind,
}

/// Imagery platform backing the analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    EarthEngine,
    /// Simulated imagery; needs no credentials.
    Virtual,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub backend: Backend,
    /// Upper bound on one analysis, in seconds.
    pub deadline_secs: u64,
    pub earth_engine: EarthEngineConfig,
}

impl Config {
    /// Load configuration from `afolu.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("afolu.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = var("AFOLU_HOST") {
            self.server.host = val;
        }
        // Cloud Run injects PORT; AFOLU_PORT wins when both are set.
        for key in ["PORT", "AFOLU_PORT"] {
            if let Some(port) = var(key).and_then(|val| val.parse().ok()) {
                self.server.port = port;
            }
        }
        if let Some(val) = var("AFOLU_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("AFOLU_SERVICE") {
            self.service.kind = val
                .parse()
                .map_err(|err| ConfigError::Validation(format!("AFOLU_SERVICE: {err}")))?;
        }
        if let Some(val) = var("AFOLU_BACKEND") {
            self.platform.backend = match val.trim().to_ascii_lowercase().as_str() {
                "earth_engine" | "earth-engine" => Backend::EarthEngine,
                "virtual" => Backend::Virtual,
                other => {
                    return Err(ConfigError::Validation(format!(
                        "AFOLU_BACKEND: unknown backend '{other}' (expected earth_engine or virtual)"
                    )));
                }
            };
        }
        for key in ["GCP_PROJECT", "AFOLU_PROJECT"] {
            if let Some(val) = var(key) {
                self.platform.earth_engine.project = val;
            }
        }
        if let Some(val) = var("AFOLU_SECRET_NAME") {
            self.platform.earth_engine.secret_name = val;
        }
        if let Some(secs) = var("AFOLU_DEADLINE_SECS").and_then(|val| val.parse().ok()) {
            self.platform.deadline_secs = secs;
        }
        if let Some(val) = var("AFOLU_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.platform.deadline_secs == 0 {
            return Err(ConfigError::Validation(
                "deadline_secs must be non-zero".to_string(),
            ));
        }
        if self.platform.backend == Backend::EarthEngine
            && self.platform.earth_engine.project.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "platform.earth_engine.project is required (set GCP_PROJECT)".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PlatformConfig {
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "afolud=info,afolu=info,tower_http=info".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kind: ServiceKind::Biomass,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: Backend::EarthEngine,
            deadline_secs: 300,
            earth_engine: EarthEngineConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
