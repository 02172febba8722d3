//! HTTP gateway for Parley.
//!
//! Serves the chat page at `/`, the message endpoint at `/api/message` and a
//! liveness probe at `/health`.

/// HTTP error responses.
pub mod error;
/// Chat turn orchestration.
pub mod router;
/// Axum application and handlers.
pub mod server;

pub use error::ApiError;
pub use router::{InboundMessage, MessageRouter, OutboundMessage};
pub use server::GatewayServer;
