//! Configuration loading for sqlite-index.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives in the platform config dir
//! (e.g. ~/.config/sqlite-index/config.toml).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TypesError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database DSN or URI (`:memory:`, `sqlite://mem`, a file path)
    #[serde(default = "default_dsn")]
    pub dsn: String,

    /// Record source URI (`directory://`, `repo://`, `file://`, `filelist://`)
    #[serde(default = "default_source_uri")]
    pub source_uri: String,

    /// Periodically report per-table timings while indexing
    #[serde(default)]
    pub timings: bool,

    /// Seconds between timing reports
    #[serde(default = "default_timings_interval_secs")]
    pub timings_interval_secs: u64,

    /// Concurrent record workers (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,

    /// Apply performance pragmas at the expense of durability
    #[serde(default = "default_live_hard_die_fast")]
    pub live_hard_die_fast: bool,

    /// Enable the post-index hook
    #[serde(default)]
    pub post_index: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dsn() -> String {
    ":memory:".to_string()
}

fn default_source_uri() -> String {
    "repo://".to_string()
}

fn default_timings_interval_secs() -> u64 {
    60
}

fn default_live_hard_die_fast() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            source_uri: default_source_uri(),
            timings: false,
            timings_interval_secs: default_timings_interval_secs(),
            workers: 0,
            live_hard_die_fast: default_live_hard_die_fast(),
            post_index: false,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (platform config dir, `config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SQLITE_INDEX_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "sqlite-index")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("dsn", default_dsn())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("source_uri", default_source_uri())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("timings", false)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default(
                "timings_interval_secs",
                default_timings_interval_secs() as i64,
            )
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("workers", 0i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("live_hard_die_fast", default_live_hard_die_fast())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("post_index", false)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SQLITE_INDEX_DSN, SQLITE_INDEX_TIMINGS_INTERVAL_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("SQLITE_INDEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.timings_interval_secs == 0 {
            return Err(TypesError::InvalidInput(
                "timings_interval_secs must be > 0".to_string(),
            ));
        }
        if self.dsn.trim().is_empty() {
            return Err(TypesError::InvalidInput("dsn must not be empty".to_string()));
        }
        Ok(())
    }

    /// The timing report interval as a `Duration`.
    pub fn timings_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timings_interval_secs)
    }
}
