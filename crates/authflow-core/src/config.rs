use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::MockProfile;

pub const ENV_APP_ID: &str = "AUTHFLOW_APP_ID";
pub const ENV_LATENCY_MS: &str = "AUTHFLOW_LATENCY_MS";
pub const ENV_CODE_LENGTH: &str = "AUTHFLOW_CODE_LENGTH";

/// Application-specific configuration helpers.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    root: PathBuf,
}

impl ConfigLocator {
    /// Attempt to discover the persistent configuration directory, creating it if needed.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("app", "authflow", "authflow")
            .ok_or(ConfigError::MissingProjectDirs)?;
        let config_dir = dirs.config_dir();
        fs::create_dir_all(config_dir).map_err(ConfigError::CreateDir)?;
        set_user_only_permissions(config_dir)?;
        Ok(Self {
            root: config_dir.to_path_buf(),
        })
    }

    /// Locator rooted at an explicit directory.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }
}

fn set_user_only_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o700);
        fs::set_permissions(path, permissions)?;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

/// Tunables for the simulated flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Application id shown on the dashboard.
    pub app_id: String,
    /// Simulated identity provider delay in milliseconds.
    pub latency_ms: u64,
    /// Exact length of a second-factor code.
    pub code_length: usize,
    pub mock: MockProfile,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            app_id: "auth-suite-default-mock".into(),
            latency_ms: 1500,
            code_length: Self::DEFAULT_CODE_LENGTH,
            mock: MockProfile::default(),
        }
    }
}

impl FlowConfig {
    pub const DEFAULT_CODE_LENGTH: usize = 6;

    /// Defaults, then `config.toml` under the locator if present, then environment overrides.
    pub fn load(locator: &ConfigLocator) -> Result<Self, ConfigError> {
        let path = locator.config_file();
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `AUTHFLOW_*` variable names.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(app_id) = lookup(ENV_APP_ID) {
            self.app_id = app_id;
        }
        if let Some(raw) = lookup(ENV_LATENCY_MS) {
            self.latency_ms = parse_value(ENV_LATENCY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CODE_LENGTH) {
            self.code_length = parse_value(ENV_CODE_LENGTH, &raw)?;
        }
        self.validate()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.code_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "code_length",
                value: "0".into(),
            });
        }
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
    })
}

/// Errors that can occur when locating or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine configuration directory for authflow")]
    MissingProjectDirs,
    #[error("failed to create configuration directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("filesystem error: {0}")]
    Io(#[source] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn config_file_lives_under_root() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::from_root(temp_dir.path());
        assert!(locator.config_file().ends_with("config.toml"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::from_root(temp_dir.path());
        let config = FlowConfig::load(&locator).unwrap();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.mock.identity, "usr-ab1c2d-34ef-56gh-78ij-90klmnopq");
    }

    #[test]
    fn file_values_override_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::from_root(temp_dir.path());
        fs::write(
            locator.config_file(),
            "latency_ms = 10\n\n[mock]\nemail = \"qa@example.com\"\n",
        )
        .unwrap();
        let config = FlowConfig::from_file(&locator.config_file()).unwrap();
        assert_eq!(config.latency(), Duration::from_millis(10));
        assert_eq!(config.mock.email, "qa@example.com");
        assert_eq!(config.mock.status, "Active (Simulated Session)");
        assert_eq!(config.app_id, "auth-suite-default-mock");
    }

    #[test]
    fn overrides_apply_and_validate() {
        let vars: HashMap<&str, &str> = [(ENV_LATENCY_MS, "25"), (ENV_APP_ID, "qa-suite")]
            .into_iter()
            .collect();
        let config = FlowConfig::default()
            .with_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.latency_ms, 25);
        assert_eq!(config.app_id, "qa-suite");

        let err = FlowConfig::default()
            .with_overrides(|key| (key == ENV_CODE_LENGTH).then(|| "six".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_CODE_LENGTH, .. }));
    }

    #[test]
    fn zero_code_length_is_rejected() {
        let err = FlowConfig::from_toml_str("code_length = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "code_length", .. }));
    }

    #[test]
    fn rendered_config_parses_back() {
        let rendered = FlowConfig::default().to_toml_string().unwrap();
        assert!(rendered.contains("app_id = \"auth-suite-default-mock\""));
        assert_eq!(
            FlowConfig::from_toml_str(&rendered).unwrap(),
            FlowConfig::default()
        );
    }
}
