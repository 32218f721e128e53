//! Configuration for the plancc driver
//!
//! Loads settings from a YAML file (or defaults when none is given);
//! environment variables always override file values.

use plancc_codegen::CodegenConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// Input files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Catalog describing the relations (YAML or JSON)
    pub catalog: PathBuf,

    /// Operator tree in plan JSON form
    pub plan: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalog.yaml"),
            plan: PathBuf::from("plan.json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the generated code goes; stdout when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("PLANCC_CATALOG") {
            self.input.catalog = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("PLANCC_PLAN") {
            self.input.plan = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("PLANCC_OUTPUT") {
            self.output.path = Some(PathBuf::from(path));
        }

        if let Ok(width) = std::env::var("PLANCC_INDENT_WIDTH") {
            self.codegen.indent_width = width.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PLANCC_INDENT_WIDTH".to_string(),
                value: width.clone(),
            })?;
        }
        if let Ok(handle) = std::env::var("PLANCC_DB_HANDLE") {
            self.codegen.db_handle = handle;
        }
        if let Ok(separator) = std::env::var("PLANCC_PRINT_SEPARATOR") {
            self.codegen.print_separator = separator;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }

        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.plan, PathBuf::from("plan.json"));
        assert_eq!(config.output.path, None);
        assert_eq!(config.codegen.indent_width, 4);
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            r#"
input:
  catalog: "tpch/catalog.yaml"
  plan: "tpch/q5.json"
codegen:
  indent_width: 2
"#,
        )
        .unwrap();

        assert_eq!(config.input.catalog, PathBuf::from("tpch/catalog.yaml"));
        assert_eq!(config.codegen.indent_width, 2);
        assert_eq!(config.codegen.db_handle, "db");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("PLANCC_DB_HANDLE", "database");
        std::env::set_var("PLANCC_OUTPUT", "/tmp/q5.rs");

        let config_yaml = r#"
input:
  catalog: "catalog.yaml"
  plan: "plan.json"
codegen:
  db_handle: "db"
"#;
        let temp_file = std::env::temp_dir().join("plancc_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.codegen.db_handle, "database"); // Overridden
        assert_eq!(config.output.path, Some(PathBuf::from("/tmp/q5.rs"))); // Overridden

        std::env::remove_var("PLANCC_DB_HANDLE");
        std::env::remove_var("PLANCC_OUTPUT");
        std::fs::remove_file(temp_file).ok();
    }
}
