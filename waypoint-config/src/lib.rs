// Configuration loading for the Waypoint route table

pub mod env;
pub mod error;
pub mod loader;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use waypoint_core::RouterConfig;
use waypoint_core::logging::{LogConfig, LogFormat, LogLevel, LogOutput};

/// Logging section of a configuration file.
///
/// Values are kept as text so files and environment overrides share one
/// parser. `output` is `stdout`, `stderr` or `file`; `file` needs `file_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
    pub output: String,
    pub file_path: Option<String>,
    pub thread_ids: bool,
    pub targets: bool,
    pub file_line: bool,
    pub colors: bool,
    /// Filter directives such as `waypoint_core=trace`
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            output: "stdout".to_string(),
            file_path: None,
            thread_ids: false,
            targets: true,
            file_line: false,
            colors: false,
            filter: None,
        }
    }
}

impl LoggingSettings {
    /// Build the core subscriber settings.
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let level: LogLevel = self.level.parse().map_err(|_| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            value: self.level.clone(),
        })?;
        let format: LogFormat = self.format.parse().map_err(|_| ConfigError::InvalidValue {
            key: "logging.format".to_string(),
            value: self.format.clone(),
        })?;
        let output = match self.output.trim().to_ascii_lowercase().as_str() {
            "stdout" => LogOutput::Stdout,
            "stderr" => LogOutput::Stderr,
            "file" => match self.file_path.as_deref() {
                Some(path) if !path.trim().is_empty() => LogOutput::File(path.to_string()),
                _ => {
                    return Err(ConfigError::ValidationError(
                        "logging.output is 'file' but logging.file_path is not set".to_string(),
                    ));
                }
            },
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "logging.output".to_string(),
                    value: self.output.clone(),
                });
            }
        };

        let mut config = LogConfig::new()
            .level(level)
            .format(format)
            .output(output)
            .with_thread_ids(self.thread_ids)
            .with_targets(self.targets)
            .with_file_line(self.file_line)
            .with_colors(self.colors);
        if let Some(filter) = &self.filter {
            config = config.with_env_filter(filter.clone());
        }
        Ok(config)
    }
}

/// Everything a Waypoint deployment reads at startup.
///
/// ```
/// use waypoint_config::{FileFormat, WaypointConfig};
///
/// let config = WaypointConfig::from_str(
///     r#"
///     [router]
///     prefer_exact_match = false
///
///     [logging]
///     level = "debug"
///     "#,
///     FileFormat::Toml,
/// )
/// .unwrap();
/// assert!(!config.router.prefer_exact_match);
/// assert!(config.router.emit_vary_header);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointConfig {
    pub router: RouterConfig,
    pub logging: LoggingSettings,
}

impl WaypointConfig {
    /// Parse a document; sections and fields left out keep their defaults.
    pub fn from_str(content: &str, format: FileFormat) -> Result<Self> {
        let value = ConfigLoader::new(format).parse(content)?;
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a JSON or TOML file, choosing the parser by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        let config = serde_json::from_value(value)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Defaults, then the file if given, then the process environment under
    /// the `WAYPOINT` prefix. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(&EnvLoader::default().load())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides keyed like [`EnvLoader`] output (`router_*`, `log_*`).
    /// Unknown keys are ignored.
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        let mut keys: Vec<&String> = vars.keys().collect();
        keys.sort();

        for key in keys {
            let value = &vars[key];
            match key.as_str() {
                "router_prefer_exact_match" => {
                    self.router.prefer_exact_match = parse_flag(key, value)?
                }
                "router_emit_vary_header" => self.router.emit_vary_header = parse_flag(key, value)?,
                "router_set_produced_content_type" => {
                    self.router.set_produced_content_type = parse_flag(key, value)?
                }
                "log_level" => self.logging.level = value.clone(),
                "log_format" => self.logging.format = value.clone(),
                "log_output" => self.logging.output = value.clone(),
                "log_file" | "log_file_path" => self.logging.file_path = Some(value.clone()),
                "log_thread_ids" => self.logging.thread_ids = parse_flag(key, value)?,
                "log_targets" => self.logging.targets = parse_flag(key, value)?,
                "log_file_line" => self.logging.file_line = parse_flag(key, value)?,
                "log_colors" => self.logging.colors = parse_flag(key, value)?,
                "log_filter" => self.logging.filter = Some(value.clone()),
                _ => {
                    tracing::trace!(key = key.as_str(), "ignoring unknown configuration override");
                    continue;
                }
            }
            tracing::debug!(key = key.as_str(), "applied configuration override");
        }
        Ok(())
    }

    /// Check that every textual setting parses
    pub fn validate(&self) -> Result<()> {
        self.logging.to_log_config().map(|_| ())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    waypoint_core::parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Load a `.env` file into the process environment.
///
/// Without a path, `.env` is searched for from the current directory up and
/// a missing file is not an error. Variables already set are kept.
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                tracing::trace!(error = %e, "no .env file loaded");
            }
        }
    }
    Ok(())
}

/// Read the `WAYPOINT_*` pairs of a `.env` file without touching the
/// process environment.
pub fn dotenv_overrides(path: impl AsRef<Path>, loader: &EnvLoader) -> Result<HashMap<String, String>> {
    let pairs = dotenvy::from_path_iter(path.as_ref())
        .map_err(|e| ConfigError::LoadError(e.to_string()))?
        .collect::<std::result::Result<Vec<(String, String)>, _>>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    Ok(loader.from_vars(pairs))
}
