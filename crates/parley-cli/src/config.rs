//! `parley.toml` loading and environment overrides.

use parley_agent::{AgentConfig, AgentProvider};
use parley_core::{ParleyError, ParleyResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./conversations")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

impl ParleyConfig {
    /// Reads the config file; a missing file means all defaults.
    pub async fn load(path: &Path) -> ParleyResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = tokio::fs::read_to_string(path).await?;
        toml::from_str(&raw).map_err(|e| {
            ParleyError::Config(format!(
                "Failed to parse config file '{}': {e}",
                path.display()
            ))
        })
    }

    /// Overlays environment variables on top of the file values.
    ///
    /// Empty variables are ignored. `PARLEY_AGENT_URL` also switches the
    /// provider to `http`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = get("AWS_REGION") {
            self.agent.region = region;
        }
        if let Some(id) = get("BEDROCK_AGENT_ID") {
            self.agent.agent_id = Some(id);
        }
        if let Some(id) = get("BEDROCK_AGENT_ALIAS_ID") {
            self.agent.agent_alias_id = Some(id);
        }
        if let Some(profile) = get("AWS_PROFILE") {
            self.agent.profile = Some(profile);
        }
        if let Some(key) = get("AWS_ACCESS_KEY_ID") {
            self.agent.access_key_id = Some(key);
        }
        if let Some(secret) = get("AWS_SECRET_ACCESS_KEY") {
            self.agent.secret_access_key = Some(secret);
        }
        if let Some(token) = get("AWS_SESSION_TOKEN") {
            self.agent.session_token = Some(token);
        }
        if let Some(url) = get("PARLEY_AGENT_URL") {
            self.agent.url = Some(url);
            self.agent.provider = AgentProvider::Http;
        }
        if let Some(dir) = get("PARLEY_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }
}
