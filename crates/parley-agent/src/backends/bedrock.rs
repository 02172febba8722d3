use super::{AgentBackend, AgentRequest};
use crate::config::{AgentConfig, CredentialSource};
use crate::reply::AgentReply;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockagentruntime::config::Credentials;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::operation::invoke_agent::InvokeAgentOutput;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use aws_sdk_bedrockagentruntime::Client;
use parley_core::{ParleyError, ParleyResult};
use tracing::{debug, info};

/// Amazon Bedrock Agents backend (`bedrock-agent-runtime:InvokeAgent`).
///
/// The SDK client is built once with the configured region, credentials and
/// a standard retry policy of `max_attempts` tries, then reused.
pub struct BedrockAgentBackend {
    client: Client,
    agent_id: String,
    agent_alias_id: String,
    enable_trace: bool,
}

impl BedrockAgentBackend {
    /// Loads the AWS SDK configuration and builds the client.
    pub async fn new(config: &AgentConfig) -> ParleyResult<Self> {
        let (Some(agent_id), Some(agent_alias_id)) = (config.agent_id(), config.agent_alias_id())
        else {
            return Err(ParleyError::Config(
                "Missing BEDROCK_AGENT_ID or BEDROCK_AGENT_ALIAS_ID".to_string(),
            ));
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts));

        let source = config.credential_source();
        match source {
            CredentialSource::Explicit {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id,
                    secret_access_key,
                    session_token.map(str::to_string),
                    None,
                    "parley-config",
                ));
            }
            CredentialSource::Profile(name) => {
                loader = loader.profile_name(name);
            }
            CredentialSource::Default => {}
        }

        let sdk_config = loader.load().await;
        info!(
            region = %config.region,
            credentials = credential_label(&source),
            max_attempts = config.max_attempts,
            "Bedrock agent client initialized"
        );

        Ok(Self {
            client: Client::new(&sdk_config),
            agent_id: agent_id.to_string(),
            agent_alias_id: agent_alias_id.to_string(),
            enable_trace: config.enable_trace,
        })
    }
}

fn credential_label(source: &CredentialSource<'_>) -> &'static str {
    match source {
        CredentialSource::Explicit { .. } => "explicit",
        CredentialSource::Profile(_) => "profile",
        CredentialSource::Default => "default-chain",
    }
}

/// A source of `InvokeAgent` response events, drained in arrival order.
#[async_trait]
pub trait EventSource: Send {
    /// The next event, `None` once the stream has ended.
    async fn next_event(&mut self) -> ParleyResult<Option<ResponseStream>>;
}

/// The completion stream of a live `InvokeAgent` call.
struct CompletionStream(InvokeAgentOutput);

#[async_trait]
impl EventSource for CompletionStream {
    async fn next_event(&mut self) -> ParleyResult<Option<ResponseStream>> {
        self.0.completion.recv().await.map_err(|e| {
            ParleyError::Agent(format!("event stream failed: {}", DisplayErrorContext(&e)))
        })
    }
}

/// Collects the reply text chunks of an event stream.
///
/// Only chunk events carry reply text; trace, file and return-control
/// events are skipped. An error anywhere in the stream fails the whole
/// reply, chunks already received are discarded.
pub async fn collect_chunks<S: EventSource>(events: &mut S) -> ParleyResult<AgentReply> {
    let mut chunks = Vec::new();
    while let Some(event) = events.next_event().await? {
        match event {
            ResponseStream::Chunk(part) => {
                if let Some(blob) = part.bytes {
                    chunks.push(blob.into_inner());
                }
            }
            _ => debug!("Skipping non-chunk agent event"),
        }
    }
    Ok(AgentReply::Streaming(chunks))
}

#[async_trait]
impl AgentBackend for BedrockAgentBackend {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn invoke(&self, request: &AgentRequest) -> ParleyResult<AgentReply> {
        let output = self
            .client
            .invoke_agent()
            .agent_id(&self.agent_id)
            .agent_alias_id(&self.agent_alias_id)
            .session_id(request.session_id.as_str())
            .input_text(&request.input_text)
            .enable_trace(self.enable_trace)
            .send()
            .await
            .map_err(|e| ParleyError::Agent(DisplayErrorContext(&e).to_string()))?;

        collect_chunks(&mut CompletionStream(output)).await
    }
}
