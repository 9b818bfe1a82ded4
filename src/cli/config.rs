use crate::error::{NetworkingError, Result};
use crate::network::Networking;
use crate::request::Headers;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Client configuration persisted as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL every request path is joined to
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP transport, in seconds
    pub timeout_secs: u64,
    /// Block the caller until live requests complete. Off unless set here
    pub testing_mode: bool,
    /// Headers sent with every live request
    pub default_headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            base_url: "http://httpbin.org".to_string(),
            timeout_secs: 30,
            testing_mode: false,
            default_headers,
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        ProjectDirs::from("dev", "networking", "networking")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or_else(|| NetworkingError::Config("Could not determine config directory".to_string()))
    }

    /// Get the default config file path
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default file, creating it if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        let config_file = Self::default_config_file()?;
        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Config::default();
            config.save_to(&config_file)?;
            info!("Wrote default configuration to {}", config_file.display());
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn headers(&self) -> Headers {
        self.default_headers.clone().into()
    }

    /// Build an HTTP-backed client on `runtime` from this configuration.
    pub fn build_client(&self, runtime: Handle) -> Result<Networking> {
        let networking = Networking::with_http(self.base_url.clone(), runtime, self.timeout())?;
        networking.set_testing_mode(self.testing_mode);
        for (name, value) in &self.default_headers {
            networking.set_header_field(name.as_str(), value.as_str());
        }
        Ok(networking)
    }
}
