use async_trait::async_trait;
use lingua_core::model::HighScoreEntry;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored high-score entry with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScoreRow {
    pub id: i64,
    pub entry: HighScoreEntry,
}

impl HighScoreRow {
    #[must_use]
    pub fn new(id: i64, entry: HighScoreEntry) -> Self {
        Self { id, entry }
    }
}

/// Append-only sink for finished runs.
#[async_trait]
pub trait HighScoreRepository: Send + Sync {
    /// Store a finished run and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_score(&self, entry: &HighScoreEntry) -> Result<i64, StorageError>;

    /// Highest scores first; equal scores keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failures.
    async fn list_scores(&self, limit: u32) -> Result<Vec<HighScoreRow>, StorageError>;

    /// Best score recorded so far, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn best_score(&self) -> Result<Option<u32>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    scores: Arc<Mutex<Vec<HighScoreRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HighScoreRepository for InMemoryRepository {
    async fn append_score(&self, entry: &HighScoreEntry) -> Result<i64, StorageError> {
        let mut guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(HighScoreRow::new(id, entry.clone()));
        Ok(id)
    }

    async fn list_scores(&self, limit: u32) -> Result<Vec<HighScoreRow>, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows = guard.clone();
        rows.sort_by(|a, b| {
            b.entry
                .score()
                .cmp(&a.entry.score())
                .then(a.id.cmp(&b.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn best_score(&self) -> Result<Option<u32>, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().map(|row| row.entry.score()).max())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub high_scores: Arc<dyn HighScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let high_scores: Arc<dyn HighScoreRepository> = Arc::new(InMemoryRepository::new());
        Self { high_scores }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_core::model::PlayerName;
    use lingua_core::time::fixed_now;

    fn entry(name: &str, score: u32) -> HighScoreEntry {
        HighScoreEntry::new(PlayerName::parse(name).unwrap(), score, fixed_now())
    }

    #[tokio::test]
    async fn lists_highest_first_and_keeps_ties_in_order() {
        let repo = InMemoryRepository::new();
        repo.append_score(&entry("Ada", 30)).await.unwrap();
        repo.append_score(&entry("Bo", 50)).await.unwrap();
        repo.append_score(&entry("Cy", 30)).await.unwrap();

        let rows = repo.list_scores(10).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.entry.player().as_str()).collect();
        assert_eq!(names, vec!["Bo", "Ada", "Cy"]);
        assert_eq!(repo.best_score().await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn limit_truncates_and_empty_has_no_best() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.best_score().await.unwrap(), None);
        for score in [10, 20, 30] {
            repo.append_score(&entry("Ada", score)).await.unwrap();
        }
        let rows = repo.list_scores(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entry.score(), 30);
    }

    #[tokio::test]
    async fn storage_bundle_shares_one_backend() {
        let storage = Storage::in_memory();
        let id = storage.high_scores.append_score(&entry("Ada", 5)).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(storage.high_scores.list_scores(5).await.unwrap().len(), 1);
    }
}
