use crate::error::ApiError;
use parley_agent::AgentClient;
use parley_core::{Role, SessionId};
use parley_session::TranscriptStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Rejection text for an empty or missing message.
pub const MESSAGE_REQUIRED: &str = "message is required";
/// Rejection text for a caller-supplied session id outside the accepted format.
pub const INVALID_SESSION_ID: &str = "invalid sessionId";
/// Prefix of the reply that stands in for a failed agent call.
pub const ERROR_REPLY_PREFIX: &str = "[error] ";
/// Reply used when the agent answers with nothing.
pub const NO_RESPONSE_REPLY: &str =
    "[The agent returned no response. Check the agent configuration in AWS Bedrock.]";

/// Body of `POST /api/message`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// The user's message; blank or missing is rejected.
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation to continue; missing or empty starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Successful answer of `POST /api/message`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Conversation the turn belongs to.
    pub session_id: String,
    /// The agent's reply, or a placeholder standing in for it.
    pub reply: String,
}

/// Runs one chat turn: record the user message, ask the agent, record and
/// return the reply.
///
/// Agent failures never fail the turn; they become an `[error] ...` reply
/// that is logged and returned like any other. Transcript write failures do
/// fail it.
pub struct MessageRouter {
    agent: Arc<AgentClient>,
    transcripts: Arc<dyn TranscriptStore>,
}

impl MessageRouter {
    /// Creates a router over one agent client and one transcript store.
    pub fn new(agent: Arc<AgentClient>, transcripts: Arc<dyn TranscriptStore>) -> Self {
        Self { agent, transcripts }
    }

    /// Runs one turn. Fails only on invalid input or a transcript write error.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<OutboundMessage, ApiError> {
        let text = msg.message.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(ApiError::BadRequest(MESSAGE_REQUIRED.to_string()));
        }

        let session_id = match msg.session_id.filter(|s| !s.is_empty()) {
            Some(raw) => SessionId::parse(raw).map_err(|e| {
                warn!(error = %e, "Rejected message: bad session id");
                ApiError::BadRequest(INVALID_SESSION_ID.to_string())
            })?,
            None => {
                let sid = SessionId::generate();
                info!(session_id = %sid, "Started new session");
                sid
            }
        };

        self.transcripts
            .append(&session_id, Role::User, text)
            .await?;

        let mut reply = match self.agent.invoke(text, &session_id).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Agent error");
                format!("{ERROR_REPLY_PREFIX}{e}")
            }
        };
        if reply.is_empty() {
            reply = NO_RESPONSE_REPLY.to_string();
        }

        self.transcripts
            .append(&session_id, Role::Agent, &reply)
            .await?;

        Ok(OutboundMessage {
            session_id: session_id.into(),
            reply,
        })
    }
}
