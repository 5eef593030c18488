use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerNameError {
    #[error("please enter your name")]
    Empty,
}

/// Trimmed, non-empty player display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// # Errors
    ///
    /// Returns `PlayerNameError::Empty` when the trimmed input is empty.
    pub fn parse(raw: &str) -> Result<Self, PlayerNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PlayerNameError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = PlayerNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(value: PlayerName) -> Self {
        value.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
