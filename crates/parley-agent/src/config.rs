use parley_core::{ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which agent service implementation handles invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentProvider {
    /// Amazon Bedrock Agents `InvokeAgent` through the AWS SDK.
    #[default]
    Bedrock,
    /// An HTTP endpoint that takes the invoke payload as JSON and answers
    /// with the same two reply envelopes.
    Http,
}

/// Settings for reaching the conversational agent.
///
/// Secrets are redacted from the `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Which backend handles invocations.
    #[serde(default)]
    pub provider: AgentProvider,
    /// AWS region of the agent.
    #[serde(default = "default_region")]
    pub region: String,
    /// Agent identifier.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Agent alias identifier.
    #[serde(default)]
    pub agent_alias_id: Option<String>,
    /// Named profile from the shared AWS config files.
    #[serde(default)]
    pub profile: Option<String>,
    /// Explicit access key, used only together with the secret key.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Explicit secret key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Optional session token for temporary credentials.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Endpoint for [`AgentProvider::Http`].
    #[serde(default)]
    pub url: Option<String>,
    /// Ask the agent service to include trace events.
    #[serde(default)]
    pub enable_trace: bool,
    /// Total attempts (first try included) for transient failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds between attempts of the HTTP backend.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_attempts() -> u32 {
    8
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: AgentProvider::default(),
            region: default_region(),
            agent_id: None,
            agent_alias_id: None,
            profile: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            url: None,
            enable_trace: false,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Where the AWS credentials come from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource<'a> {
    /// An explicit key pair from configuration.
    Explicit {
        /// Access key id.
        access_key_id: &'a str,
        /// Secret access key.
        secret_access_key: &'a str,
        /// Session token, for temporary credentials.
        session_token: Option<&'a str>,
    },
    /// A named profile from `~/.aws/config` / `~/.aws/credentials`.
    Profile(&'a str),
    /// The SDK's default provider chain (environment, SSO, IMDS, ...).
    Default,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AgentConfig {
    /// Agent id, ignoring blank values.
    pub fn agent_id(&self) -> Option<&str> {
        non_empty(&self.agent_id)
    }

    /// Agent alias id, ignoring blank values.
    pub fn agent_alias_id(&self) -> Option<&str> {
        non_empty(&self.agent_alias_id)
    }

    /// HTTP endpoint, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    /// Explicit keys win when both halves are present, then a named
    /// profile, then the default chain.
    pub fn credential_source(&self) -> CredentialSource<'_> {
        match (non_empty(&self.access_key_id), non_empty(&self.secret_access_key)) {
            (Some(access_key_id), Some(secret_access_key)) => CredentialSource::Explicit {
                access_key_id,
                secret_access_key,
                session_token: non_empty(&self.session_token),
            },
            _ => match non_empty(&self.profile) {
                Some(profile) => CredentialSource::Profile(profile),
                None => CredentialSource::Default,
            },
        }
    }

    /// Checks that the selected provider has everything it needs.
    pub fn validate(&self) -> ParleyResult<()> {
        if self.max_attempts == 0 {
            return Err(ParleyError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        match self.provider {
            AgentProvider::Bedrock => {
                if self.agent_id().is_none() || self.agent_alias_id().is_none() {
                    return Err(ParleyError::Config(
                        "Missing BEDROCK_AGENT_ID or BEDROCK_AGENT_ALIAS_ID".to_string(),
                    ));
                }
            }
            AgentProvider::Http => {
                if self.url().is_none() {
                    return Err(ParleyError::Config(
                        "Missing agent url for the http provider (PARLEY_AGENT_URL)".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("region", &self.region)
            .field("agent_id", &self.agent_id)
            .field("agent_alias_id", &self.agent_alias_id)
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("url", &self.url)
            .field("enable_trace", &self.enable_trace)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}
