//! Client configuration: defaults, YAML file, environment.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const ENV_BASE_URL: &str = "FORMFLOW_BASE_URL";
pub const ENV_TIMEOUT: &str = "FORMFLOW_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "FORMFLOW_MAX_RETRIES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the form server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures of idempotent requests.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `FORMFLOW_BASE_URL` | Form server base URL |
    /// | `FORMFLOW_TIMEOUT` | Request timeout in seconds |
    /// | `FORMFLOW_MAX_RETRIES` | Retries for transient failures |
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Read a YAML config file. Keys left out take their defaults; unknown
    /// keys are an error.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ClientError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ClientError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// File (when given), then environment on top.
    pub fn load(file: Option<&Path>) -> ClientResult<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.apply_env())
    }

    /// Override fields with any `FORMFLOW_*` variables that are set and parse.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(timeout) = std::env::var(ENV_TIMEOUT).ok().and_then(|v| v.parse().ok()) {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = std::env::var(ENV_MAX_RETRIES)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.max_retries = retries;
        }
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Parsed base URL, without a trailing slash in its path.
    pub fn parsed_base_url(&self) -> ClientResult<Url> {
        let trimmed = self.base_url.trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| ClientError::Config {
            message: format!("invalid base URL {:?}: {}", self.base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config {
                message: format!("unsupported URL scheme: {}", url.scheme()),
            });
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var(ENV_BASE_URL);
        std::env::remove_var(ENV_TIMEOUT);
        std::env::remove_var(ENV_MAX_RETRIES);
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ClientConfig::from_env();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var(ENV_BASE_URL, "https://forms.example.com");
        std::env::set_var(ENV_TIMEOUT, "5");
        std::env::set_var(ENV_MAX_RETRIES, "not-a-number");

        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, "https://forms.example.com");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_retries, 3);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_beats_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formflow.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "base_url: http://file.example:8080\nmax_retries: 0").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://file.example:8080");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.timeout_secs, 30);

        std::env::set_var(ENV_BASE_URL, "http://env.example");
        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "http://env.example");
        assert_eq!(config.max_retries, 0);
        clear_env();
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formflow.yaml");
        std::fs::write(&path, "base_url: http://x\ntoken: secret\n").unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config { .. }));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_parsed_base_url() {
        let config = ClientConfig::default().with_base_url("http://localhost:3000/");
        assert_eq!(
            config.parsed_base_url().unwrap().as_str(),
            "http://localhost:3000/"
        );

        let bad = ClientConfig::default().with_base_url("ftp://example.com");
        assert!(bad.parsed_base_url().is_err());
        let bad = ClientConfig::default().with_base_url("not a url");
        assert!(bad.parsed_base_url().is_err());
    }
}
