//! Client configuration, a TOML file under the user config directory
//! (e.g. `~/.config/jumon/client.toml`).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "nats://localhost:4222";
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL of the broker.
    pub server_url: String,
    /// Timeout for the run command in seconds.
    pub run_timeout_seconds: u64,
    pub disable_telemetry: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            run_timeout_seconds: DEFAULT_RUN_TIMEOUT_SECS,
            disable_telemetry: false,
        }
    }
}

impl ClientConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jumon")
        .join("client.toml")
}
