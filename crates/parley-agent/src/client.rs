use crate::backends::{build_backend, AgentBackend, AgentRequest};
use crate::config::AgentConfig;
use parley_core::{ParleyResult, SessionId};
use std::sync::Arc;
use tracing::{error, info};

/// Agent client that dispatches to the configured backend and normalizes
/// its reply envelope to plain text.
///
/// Built once at startup and shared by all requests.
pub struct AgentClient {
    backend: Arc<dyn AgentBackend>,
}

impl AgentClient {
    /// Validates the configuration and builds the selected backend.
    pub async fn new(config: &AgentConfig) -> ParleyResult<Self> {
        config.validate()?;
        Ok(Self {
            backend: build_backend(config).await?,
        })
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Arc<dyn AgentBackend>) -> Self {
        Self { backend }
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Sends `text` to the agent under `session_id` and returns its reply.
    ///
    /// Transport and service failures are returned as errors; turning them
    /// into a user-visible reply is the caller's job.
    pub async fn invoke(&self, text: &str, session_id: &SessionId) -> ParleyResult<String> {
        let request = AgentRequest {
            session_id: session_id.clone(),
            input_text: text.to_string(),
        };

        info!(
            session_id = %session_id,
            backend = self.backend.name(),
            chars = text.chars().count(),
            "Invoking agent"
        );

        let reply = self.backend.invoke(&request).await.map_err(|e| {
            error!(session_id = %session_id, error = %e, "Agent invocation failed");
            e
        })?;

        Ok(reply.into_text())
    }
}
