use crate::error::{ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Shortest accepted session identifier.
pub const MIN_LEN: usize = 2;
/// Longest accepted session identifier.
pub const MAX_LEN: usize = 100;

/// Identifier of a conversation.
///
/// Used verbatim as the agent service's session key and as the stem of the
/// transcript file name. Accepts `MIN_LEN..=MAX_LEN` characters from
/// `[0-9A-Za-z._:-]`, so an identifier can never contain a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Creates a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates a caller-supplied identifier.
    pub fn parse(raw: impl Into<String>) -> ParleyResult<Self> {
        let raw = raw.into();
        let len = raw.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(ParleyError::Session(format!(
                "session id must be {MIN_LEN}-{MAX_LEN} characters, got {len}"
            )));
        }
        if let Some(bad) = raw.chars().find(|c| !is_allowed(*c)) {
            return Err(ParleyError::Session(format!(
                "session id contains invalid character {bad:?}"
            )));
        }
        Ok(Self(raw))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')
}

impl FromStr for SessionId {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ParleyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
