//! CLI configuration
//!
//! Layered, lowest precedence first:
//! 1. built-in defaults
//! 2. `~/.defai/config.toml` (optional)
//! 3. `--config <path>` (optional)
//! 4. `DEFAI__*` environment variables, e.g. `DEFAI__API__BASE_URL`
//!
//! `DEFAI_API_URL` / `--api-url` override the backend URL on top of that.

use defai_sdk::DEFAULT_API_URL;
use defai_session::{default_data_dir, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub api: ApiSettings,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    /// Directory of wallet key files; `~/.defai/keys` when unset
    pub keystore_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder().add_source(
            config::File::from(default_data_dir().join("config.toml")).required(false),
        );

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DEFAI")
                .separator("__")
                .try_parsing(true),
        );

        let config: CliConfig = builder.build()?.try_deserialize()?;
        config.session.validate()?;
        Ok(config)
    }

    pub fn keystore_dir(&self) -> PathBuf {
        self.keystore_dir
            .clone()
            .unwrap_or_else(|| default_data_dir().join("keys"))
    }

    pub fn sdk_config(&self) -> defai_sdk::Config {
        defai_sdk::Config {
            base_url: self.api.base_url.clone(),
            timeout: self.api.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CliConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8002");
        assert_eq!(config.session.ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert!(config.keystore_dir().ends_with(".defai/keys"));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defai.toml");
        std::fs::write(
            &path,
            r#"
keystore_dir = "/tmp/defai-keys"

[api]
base_url = "http://agents.internal:9000"
timeout = "5s"

[session]
balance_interval = "1m"
default_chain = "ethereum"
"#,
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "http://agents.internal:9000");
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.session.balance_interval, Duration::from_secs(60));
        assert_eq!(config.session.default_chain, defai_types::Chain::Ethereum);
        assert_eq!(config.keystore_dir(), PathBuf::from("/tmp/defai-keys"));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn zero_balance_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defai.toml");
        std::fs::write(&path, "[session]\nbalance_interval = \"0s\"\n").unwrap();

        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("balance_interval"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
