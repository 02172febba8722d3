use serde::{Deserialize, Serialize};
use std::fmt;

/// The participant that authored a transcript record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human typing into the chat pane.
    User,
    /// The external conversational agent (including error replies).
    Agent,
}

impl Role {
    /// The wire name of the role, as written to transcript files.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
