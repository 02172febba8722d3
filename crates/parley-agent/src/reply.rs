use tracing::warn;

/// Reply returned when the agent service answers with a shape we do not know.
pub const UNPARSEABLE_REPLY: &str = "[Could not process the agent response]";

/// The agent service's reply envelope, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// A single pre-assembled text field.
    Direct(String),
    /// Incremental byte chunks in arrival order.
    Streaming(Vec<Vec<u8>>),
    /// Anything else, kept verbatim for diagnostics.
    Unrecognized(serde_json::Value),
}

impl AgentReply {
    /// Collapses the envelope into the text shown to the user.
    ///
    /// `Direct` text is returned untouched. `Streaming` chunks are joined
    /// byte-wise, decoded as UTF-8 (lossy) and trimmed. `Unrecognized`
    /// envelopes are logged and replaced by [`UNPARSEABLE_REPLY`].
    pub fn into_text(self) -> String {
        match self {
            AgentReply::Direct(text) => text,
            AgentReply::Streaming(chunks) => {
                let bytes = chunks.concat();
                String::from_utf8_lossy(&bytes).trim().to_string()
            }
            AgentReply::Unrecognized(raw) => {
                warn!(envelope = %raw, "Unrecognized agent response shape");
                UNPARSEABLE_REPLY.to_string()
            }
        }
    }
}
