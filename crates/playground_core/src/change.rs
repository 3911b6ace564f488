use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of change carried by a stream record (`eventName` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown change kind '{0}', expected INSERT, MODIFY or REMOVE")]
pub struct ParseChangeKindError(pub String);

impl ChangeKind {
    pub const fn all() -> [ChangeKind; 3] {
        [Self::Insert, Self::Modify, Self::Remove]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
        }
    }

    /// Construct id of the function reacting to this kind.
    pub const fn function_id(self) -> &'static str {
        match self {
            Self::Insert => "insert-function",
            Self::Modify => "update-function",
            Self::Remove => "delete-function",
        }
    }

    /// Name of the handler binary packaged for this kind.
    pub const fn handler_binary(self) -> &'static str {
        match self {
            Self::Insert => "insert_lambda",
            Self::Modify => "update_lambda",
            Self::Remove => "delete_lambda",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ParseChangeKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INSERT" => Ok(Self::Insert),
            "MODIFY" => Ok(Self::Modify),
            "REMOVE" => Ok(Self::Remove),
            other => Err(ParseChangeKindError(other.to_string())),
        }
    }
}
