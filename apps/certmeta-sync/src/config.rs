//! Configuration loading: YAML file, environment overrides and the fields file.

use std::path::{Path, PathBuf};

use certmeta_client::{RetryPolicy, SyncSettings, DEFAULT_CA_BASE_URL};
use certmeta_core::FieldsFile;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "./config/certmeta.yaml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ca: CaConfig,
    #[serde(default)]
    pub clm: ClmConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// CA API connection.
#[derive(Debug, Clone, Deserialize)]
pub struct CaConfig {
    #[serde(default = "default_ca_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ca_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// CLM API connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ClmConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Files read and written by a run.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_fields_file")]
    pub fields_file: PathBuf,
    #[serde(default = "default_banned_characters_file")]
    pub banned_characters_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            fields_file: default_fields_file(),
            banned_characters_file: default_banned_characters_file(),
        }
    }
}

fn default_ca_base_url() -> String {
    DEFAULT_CA_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fields_file() -> PathBuf {
    PathBuf::from("./config/fields.yaml")
}

fn default_banned_characters_file() -> PathBuf {
    PathBuf::from("./config/banned_characters.json")
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> CliResult<Self> {
        serde_yaml::from_str(content).map_err(|e| CliError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("CERTMETA_CA_API_KEY") {
            self.ca.api_key = key;
        }
        if let Some(url) = get("CERTMETA_CLM_URL") {
            self.clm.base_url = url;
        }
        if let Some(username) = get("CERTMETA_CLM_USERNAME") {
            self.clm.username = username;
        }
        if let Some(password) = get("CERTMETA_CLM_PASSWORD") {
            self.clm.password = password;
        }
    }

    /// Check everything that can be checked without a remote call.
    pub fn validate(&self) -> CliResult<()> {
        if self.ca.base_url.trim().is_empty() {
            return Err(CliError::Config("ca.base_url is empty".to_string()));
        }
        if self.ca.api_key.trim().is_empty() {
            return Err(CliError::Config(
                "ca.api_key is not set (config file or CERTMETA_CA_API_KEY)".to_string(),
            ));
        }
        if self.clm.base_url.trim().is_empty() {
            return Err(CliError::Config(
                "clm.base_url is not set (config file or CERTMETA_CLM_URL)".to_string(),
            ));
        }
        if self.clm.username.trim().is_empty() {
            return Err(CliError::Config(
                "clm.username is not set (config file or CERTMETA_CLM_USERNAME)".to_string(),
            ));
        }
        if self.ca.timeout_secs == 0 || self.clm.timeout_secs == 0 {
            return Err(CliError::Config("timeout_secs must be greater than zero".to_string()));
        }
        self.sync.validate()?;
        Ok(())
    }
}

/// Load and validate the fields file. YAML is a superset of JSON, so both work.
pub fn load_fields_file(path: &Path) -> CliResult<FieldsFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("Failed to read fields file {}: {}", path.display(), e)))?;
    let fields: FieldsFile = serde_yaml::from_str(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse fields file {}: {e}", path.display())))?;

    // Reject bad definitions and unknown dotted paths before any remote call.
    fields
        .clone()
        .into_unified()
        .map_err(|e| CliError::Config(format!("Invalid fields file {}: {e}", path.display())))?;
    Ok(fields)
}
