use super::{AgentBackend, AgentRequest};
use crate::config::AgentConfig;
use crate::reply::AgentReply;
use crate::retry::{is_retryable_status, is_retryable_transport, RetryPolicy};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parley_core::{ParleyError, ParleyResult};
use serde_json::Value;
use tracing::warn;

/// Agent backend for any HTTP endpoint speaking the invoke-agent contract.
///
/// The request is a JSON object with `agentId`, `agentAliasId`, `sessionId`,
/// `inputText` and `enableTrace`. The reply is either
/// `{"output": "..."}` or `{"completion": [{"chunk": {"bytes": ...}}, ...]}`
/// where `bytes` is base64 text or an array of byte values.
///
/// Connection failures, timeouts, 429 and 5xx answers are retried with
/// exponential backoff up to `max_attempts` tries in total.
pub struct HttpAgentBackend {
    url: String,
    agent_id: Option<String>,
    agent_alias_id: Option<String>,
    enable_trace: bool,
    policy: RetryPolicy,
    http: reqwest::Client,
}

/// A failed attempt and whether it is worth repeating.
struct AttemptError {
    error: ParleyError,
    retryable: bool,
}

impl AttemptError {
    fn transient(error: ParleyError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }

    fn permanent(error: ParleyError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

impl HttpAgentBackend {
    /// Builds the backend; fails when no endpoint URL is configured.
    pub fn new(config: &AgentConfig) -> ParleyResult<Self> {
        let url = config.url().ok_or_else(|| {
            ParleyError::Config("Missing agent url for the http provider".to_string())
        })?;
        Ok(Self {
            url: url.to_string(),
            agent_id: config.agent_id().map(str::to_string),
            agent_alias_id: config.agent_alias_id().map(str::to_string),
            enable_trace: config.enable_trace,
            policy: RetryPolicy::from_config(config),
            http: reqwest::Client::new(),
        })
    }

    fn build_body(&self, request: &AgentRequest) -> Value {
        serde_json::json!({
            "agentId": self.agent_id,
            "agentAliasId": self.agent_alias_id,
            "sessionId": request.session_id.as_str(),
            "inputText": request.input_text,
            "enableTrace": self.enable_trace,
        })
    }

    async fn send_once(&self, body: &Value) -> Result<AgentReply, AttemptError> {
        let resp = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let error = ParleyError::Http(e.to_string());
                if is_retryable_transport(&e) {
                    AttemptError::transient(error)
                } else {
                    AttemptError::permanent(error)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let error = ParleyError::Http(format!("Agent API error {status}: {error_body}"));
            return Err(if is_retryable_status(status) {
                AttemptError::transient(error)
            } else {
                AttemptError::permanent(error)
            });
        }

        let resp_body: Value = resp
            .json()
            .await
            .map_err(|e| AttemptError::permanent(ParleyError::Http(e.to_string())))?;

        Ok(parse_envelope(resp_body))
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(&self, request: &AgentRequest) -> ParleyResult<AgentReply> {
        let body = self.build_body(request);

        let mut attempt = 1;
        loop {
            match self.send_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(failed) if failed.retryable && self.policy.allows_retry_after(attempt) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        session_id = %request.session_id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay = ?delay,
                        error = %failed.error,
                        "Transient agent API error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }
}

/// Classifies a JSON reply body into one of the [`AgentReply`] shapes.
///
/// Completion events without a `chunk` key (trace, files, ...) are skipped.
/// A `chunk` whose bytes cannot be decoded makes the whole envelope
/// unrecognized.
pub fn parse_envelope(body: Value) -> AgentReply {
    if let Some(text) = body.get("output").and_then(Value::as_str) {
        return AgentReply::Direct(text.to_string());
    }

    let chunks = body
        .get("completion")
        .and_then(Value::as_array)
        .and_then(|events| collect_chunks(events));

    match chunks {
        Some(chunks) => AgentReply::Streaming(chunks),
        None => AgentReply::Unrecognized(body),
    }
}

fn collect_chunks(events: &[Value]) -> Option<Vec<Vec<u8>>> {
    events
        .iter()
        .filter_map(|event| event.get("chunk"))
        .map(|chunk| decode_bytes(chunk.get("bytes")?))
        .collect()
}

fn decode_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(encoded) => STANDARD.decode(encoded).ok(),
        Value::Array(items) => items
            .iter()
            .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}
