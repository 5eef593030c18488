use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("total_sublevels must be at least 1")]
    NoSublevels,
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("dictionary_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Where the leftover sublevels go when the total does not divide evenly
/// across topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemainderPolicy {
    /// The final topic absorbs the whole remainder.
    #[default]
    LastTopic,
    /// The first `remainder` topics get one extra sublevel each.
    Spread,
}

/// What a blank submission to an open question costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlankAnswerPolicy {
    /// Report "enter an answer" and keep the attempt.
    #[default]
    Ignore,
    ConsumeAttempt,
}

/// Run-wide policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    total_sublevels: u32,
    max_attempts: u32,
    points_per_correct: u32,
    remainder: RemainderPolicy,
    blank_open_answer: BlankAnswerPolicy,
    dictionary_timeout_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            total_sublevels: 500,
            max_attempts: 3,
            points_per_correct: 10,
            remainder: RemainderPolicy::LastTopic,
            blank_open_answer: BlankAnswerPolicy::Ignore,
            dictionary_timeout_ms: 5_000,
        }
    }
}

impl GameSettings {
    /// Build settings with the given core numbers and default policies.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any count is zero.
    pub fn new(
        total_sublevels: u32,
        max_attempts: u32,
        points_per_correct: u32,
    ) -> Result<Self, SettingsError> {
        let settings = Self {
            total_sublevels,
            max_attempts,
            points_per_correct,
            ..Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants, e.g. after deserializing.
    ///
    /// # Errors
    ///
    /// Returns the first violated `SettingsError`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.total_sublevels == 0 {
            return Err(SettingsError::NoSublevels);
        }
        if self.max_attempts == 0 {
            return Err(SettingsError::NoAttempts);
        }
        if self.dictionary_timeout_ms == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        Ok(())
    }

    #[must_use]
    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    #[must_use]
    pub fn with_blank_open_answer(mut self, policy: BlankAnswerPolicy) -> Self {
        self.blank_open_answer = policy;
        self
    }

    /// # Errors
    ///
    /// Returns `SettingsError::ZeroTimeout` for a zero timeout.
    pub fn with_dictionary_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, SettingsError> {
        if timeout_ms == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        self.dictionary_timeout_ms = timeout_ms;
        Ok(self)
    }

    #[must_use]
    pub fn total_sublevels(&self) -> u32 {
        self.total_sublevels
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    #[must_use]
    pub fn remainder(&self) -> RemainderPolicy {
        self.remainder
    }

    #[must_use]
    pub fn blank_open_answer(&self) -> BlankAnswerPolicy {
        self.blank_open_answer
    }

    #[must_use]
    pub fn dictionary_timeout_ms(&self) -> u64 {
        self.dictionary_timeout_ms
    }
}
