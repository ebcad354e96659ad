use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_MAX_ELEMENTS;
use crate::error::CoreError;
use crate::transport::Endpoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Max log lines kept on screen.
    pub max_elements: usize,
    pub new_log_timeout_ms: u64,
    pub error_timeout_ms: u64,
    pub tick_rate_ms: u64,
    /// Budget for TCP connect plus the WebSocket upgrade.
    pub connect_timeout_ms: u64,
}

impl ViewConfig {
    pub fn new_log_timeout(&self) -> Duration {
        Duration::from_millis(self.new_log_timeout_ms)
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_millis(self.error_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            new_log_timeout_ms: 500,
            error_timeout_ms: 5000,
            tick_rate_ms: 100,
            connect_timeout_ms: 15_000,
        }
    }
}

fn default_rule() -> String {
    "!level@debug".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Rule pre-filled into the input on startup.
    #[serde(default = "default_rule")]
    pub default_rule: String,
    #[serde(default)]
    pub endpoint: Endpoint,
    #[serde(default)]
    pub view: ViewConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_rule: default_rule(),
            endpoint: Endpoint::default(),
            view: ViewConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.view.max_elements == 0 {
            return Err(CoreError::Config(
                "view.max_elements must be at least 1".into(),
            ));
        }
        if self.view.tick_rate_ms == 0 {
            return Err(CoreError::Config("view.tick_rate_ms must be positive".into()));
        }
        if self.view.connect_timeout_ms == 0 {
            return Err(CoreError::Config(
                "view.connect_timeout_ms must be positive".into(),
            ));
        }
        if self.endpoint.host.trim().is_empty() {
            return Err(CoreError::Config("endpoint.host is empty".into()));
        }
        Ok(())
    }
}

const CONFIG_FILE: &str = "config.toml";

/// `$XDG_CONFIG_HOME/loghell`, falling back to `~/.config/loghell`
/// (`%APPDATA%\loghell` on Windows).
pub fn config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    };
    base.unwrap_or_else(|| PathBuf::from(".")).join("loghell")
}

/// Rolling client logs live next to the config file.
pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Load configuration from the platform-specific path.
/// Creates the config file with defaults on first run.
pub fn load_or_create_config() -> ViewerConfig {
    let path = config_dir().join(CONFIG_FILE);

    if path.exists() {
        load_config(&path.to_string_lossy())
    } else {
        let config = ViewerConfig::default();

        if let Err(e) = save_config(&config, &path.to_string_lossy()) {
            tracing::warn!("Could not create default config at {:?}: {}", path, e);
        } else {
            tracing::info!("Created default config at {:?}", path);
        }

        config
    }
}

/// Load configuration from a TOML file.
/// Falls back to defaults if the file is missing or malformed.
pub fn load_config(path: &str) -> ViewerConfig {
    match try_load_config(path) {
        Ok(config) => {
            tracing::info!("Loaded config from {}", path);
            config
        }
        Err(CoreError::Io(_)) => {
            tracing::debug!("Config file {} not found, using defaults", path);
            ViewerConfig::default()
        }
        Err(e) => {
            tracing::warn!("Failed to load config {}: {}, using defaults", path, e);
            ViewerConfig::default()
        }
    }
}

pub fn try_load_config(path: &str) -> Result<ViewerConfig, CoreError> {
    let contents = std::fs::read_to_string(path)?;
    let config: ViewerConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file.
/// Creates parent directories if they don't exist.
pub fn save_config(config: &ViewerConfig, path: &str) -> Result<(), CoreError> {
    let path = std::path::Path::new(path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    tracing::info!("Config saved to {:?}", path);
    Ok(())
}
