use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::PlayerName;

/// One finished run, as handed to the high-score sink. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    player: PlayerName,
    score: u32,
    recorded_at: DateTime<Utc>,
}

impl HighScoreEntry {
    #[must_use]
    pub fn new(player: PlayerName, score: u32, recorded_at: DateTime<Utc>) -> Self {
        Self {
            player,
            score,
            recorded_at,
        }
    }

    #[must_use]
    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
