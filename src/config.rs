//! Runtime configuration
//!
//! Settings come from the environment (after `.env` is loaded by the binary)
//! and can be overridden per invocation from the command line. The database
//! path and schema text travel with the config rather than living in globals.

use crate::error::{Nl2SqlError, Result};
use crate::seed::PRODUCTS_DDL;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DB_FILE: &str = "products.db";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen3:8b";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite file queried by every question
    pub db_path: PathBuf,

    /// Base URL of the Ollama server
    pub ollama_url: String,

    /// Model identifier sent with each chat request
    pub model: String,

    /// Upper bound on a single model call
    pub llm_timeout: Duration,

    /// Schema description embedded in every prompt
    pub schema: String,
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub ollama_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub schema_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            schema: PRODUCTS_DDL.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the config from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// Recognized keys: `NL2SQL_DB_PATH`, `OLLAMA_HOST`, `OLLAMA_MODEL`,
    /// `NL2SQL_LLM_TIMEOUT_SECS`, `NL2SQL_SCHEMA_FILE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("NL2SQL_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("OLLAMA_HOST") {
            config.ollama_url = normalize_base_url(&url);
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("NL2SQL_LLM_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                Nl2SqlError::Config(format!("Invalid NL2SQL_LLM_TIMEOUT_SECS '{}': {}", raw, e))
            })?;
            config.llm_timeout = Duration::from_secs(secs);
        }
        if let Some(schema_file) = lookup("NL2SQL_SCHEMA_FILE") {
            config.schema = read_schema_file(Path::new(&schema_file))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this config
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(path) = overrides.db_path {
            self.db_path = path;
        }
        if let Some(url) = overrides.ollama_url {
            self.ollama_url = normalize_base_url(&url);
        }
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.llm_timeout = Duration::from_secs(secs);
        }
        if let Some(schema_file) = overrides.schema_file {
            self.schema = read_schema_file(&schema_file)?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Nl2SqlError::Config("Model name must not be empty".to_string()));
        }
        if self.llm_timeout.is_zero() {
            return Err(Nl2SqlError::Config("LLM timeout must be at least one second".to_string()));
        }
        if self.schema.trim().is_empty() {
            return Err(Nl2SqlError::Config("Schema description must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `OLLAMA_HOST` is often given without a scheme (e.g. `127.0.0.1:11434`)
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn read_schema_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Nl2SqlError::Config(format!("Failed to read schema file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("products.db"));
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.model, "qwen3:8b");
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert!(config.schema.contains("CREATE TABLE products"));
    }

    #[test]
    fn test_environment_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("NL2SQL_DB_PATH", "/tmp/other.db"),
            ("OLLAMA_HOST", "127.0.0.1:9999/"),
            ("OLLAMA_MODEL", "llama3"),
            ("NL2SQL_LLM_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.ollama_url, "http://127.0.0.1:9999");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.llm_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_timeout_is_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("NL2SQL_LLM_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Nl2SqlError::Config(_)));

        let err = AppConfig::from_lookup(lookup_from(&[("NL2SQL_LLM_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Nl2SqlError::Config(_)));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let base = AppConfig::from_lookup(lookup_from(&[("OLLAMA_MODEL", "llama3")])).unwrap();
        let config = base
            .with_overrides(ConfigOverrides {
                model: Some("qwen3:8b".to_string()),
                timeout_secs: Some(5),
                ollama_url: Some("https://ollama.internal:443".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.model, "qwen3:8b");
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
        assert_eq!(config.ollama_url, "https://ollama.internal:443");
    }

    #[test]
    fn test_schema_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, "CREATE TABLE widgets (id INTEGER);").unwrap();

        let config = AppConfig::default()
            .with_overrides(ConfigOverrides {
                schema_file: Some(path),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.schema, "CREATE TABLE widgets (id INTEGER);");

        let missing = AppConfig::default().with_overrides(ConfigOverrides {
            schema_file: Some(dir.path().join("missing.sql")),
            ..Default::default()
        });
        assert!(matches!(missing, Err(Nl2SqlError::Config(_))));
    }
}
