//! Core types and error definitions for Parley.
//!
//! This crate provides the foundational types shared across all Parley crates.
//!
//! # Main types
//!
//! - [`ParleyError`]: Unified error enum for all Parley subsystems.
//! - [`ParleyResult`]: Convenience alias for `Result<T, ParleyError>`.
//! - [`Role`]: Author of a transcript record (user or agent).
//! - [`SessionId`]: Validated conversation identifier.

/// Error types.
pub mod error;
/// Transcript roles.
pub mod role;
/// Session identifiers.
pub mod session_id;

pub use error::{ParleyError, ParleyResult};
pub use role::Role;
pub use session_id::SessionId;
