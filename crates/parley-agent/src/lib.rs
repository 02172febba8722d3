//! Agent service access for Parley.
//!
//! [`AgentClient`] sends one user message to the external conversational
//! agent and returns its reply as plain text, whatever envelope the service
//! answered with (see [`AgentReply`]).

/// Agent service backends.
pub mod backends;
/// Backend-agnostic agent client.
pub mod client;
/// Agent configuration.
pub mod config;
/// Reply envelopes and normalization.
pub mod reply;
/// Retry policy for transient failures.
pub mod retry;

pub use backends::{AgentBackend, AgentRequest};
pub use client::AgentClient;
pub use config::{AgentConfig, AgentProvider, CredentialSource};
pub use reply::{AgentReply, UNPARSEABLE_REPLY};
pub use retry::RetryPolicy;
