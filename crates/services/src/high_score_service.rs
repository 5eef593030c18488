use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::repository::{HighScoreRepository, StorageError};

/// Rows shown on the leaderboard when no limit is given.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 5;

/// One leaderboard line, ready for any presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardItem {
    /// 1-based.
    pub rank: u32,
    pub id: i64,
    pub player: String,
    pub score: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Read side of the high-score sink.
#[derive(Clone)]
pub struct HighScoreService {
    scores: Arc<dyn HighScoreRepository>,
}

impl HighScoreService {
    #[must_use]
    pub fn new(scores: Arc<dyn HighScoreRepository>) -> Self {
        Self { scores }
    }

    /// Best scores first; `None` uses [`DEFAULT_LEADERBOARD_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if scores cannot be read.
    pub async fn leaderboard(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardItem>, StorageError> {
        let rows = self
            .scores
            .list_scores(limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT))
            .await?;
        Ok((1_u32..)
            .zip(rows)
            .map(|(rank, row)| LeaderboardItem {
                rank,
                id: row.id,
                player: row.entry.player().as_str().to_owned(),
                score: row.entry.score(),
                recorded_at: row.entry.recorded_at(),
            })
            .collect())
    }

    /// Whether `score` would beat every stored score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if scores cannot be read.
    pub async fn is_new_high_score(&self, score: u32) -> Result<bool, StorageError> {
        let best = self.scores.best_score().await?;
        Ok(best.is_none_or(|best| score > best))
    }
}
