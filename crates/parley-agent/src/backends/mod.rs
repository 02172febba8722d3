/// Amazon Bedrock Agents through the AWS SDK.
#[cfg(feature = "bedrock")]
pub mod bedrock;
/// Generic JSON-over-HTTP agent endpoint.
pub mod http;

use crate::config::{AgentConfig, AgentProvider};
use crate::reply::AgentReply;
use async_trait::async_trait;
use parley_core::{ParleyResult, SessionId};
use std::sync::Arc;

/// One turn to send to the agent service.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Conversation key, passed through verbatim.
    pub session_id: SessionId,
    /// The user's (already trimmed, non-empty) message.
    pub input_text: String,
}

/// Trait for agent service backends.
///
/// A backend performs exactly one outbound call per [`invoke`](Self::invoke)
/// and reports the raw reply envelope; normalization to text happens in
/// [`AgentClient`](crate::AgentClient). Retries belong to the backend's own
/// transport client.
///
/// To add a new backend:
/// 1. Create a new module in `backends/`
/// 2. Implement `AgentBackend` for your struct
/// 3. Add the variant to `AgentProvider` in `config.rs`
/// 4. Wire it up in [`build_backend`]
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Sends one message to the agent service.
    async fn invoke(&self, request: &AgentRequest) -> ParleyResult<AgentReply>;
}

/// Builds the backend selected by `config.provider`.
///
/// Called once at startup; the returned handle is shared by every request.
pub async fn build_backend(config: &AgentConfig) -> ParleyResult<Arc<dyn AgentBackend>> {
    let backend: Arc<dyn AgentBackend> = match config.provider {
        AgentProvider::Bedrock => bedrock_backend(config).await?,
        AgentProvider::Http => Arc::new(http::HttpAgentBackend::new(config)?),
    };
    Ok(backend)
}

#[cfg(feature = "bedrock")]
async fn bedrock_backend(config: &AgentConfig) -> ParleyResult<Arc<dyn AgentBackend>> {
    Ok(Arc::new(bedrock::BedrockAgentBackend::new(config).await?))
}

#[cfg(not(feature = "bedrock"))]
async fn bedrock_backend(_config: &AgentConfig) -> ParleyResult<Arc<dyn AgentBackend>> {
    Err(parley_core::ParleyError::Config(
        "parley was built without the `bedrock` feature".to_string(),
    ))
}
