use async_trait::async_trait;
use lingua_core::model::{HighScoreEntry, PlayerName};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{HighScoreRepository, HighScoreRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn score_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid score: {v}")))
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<HighScoreRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let player = row.try_get::<String, _>("player").map_err(ser)?;
    let player = PlayerName::parse(&player).map_err(ser)?;
    let score = score_from_i64(row.try_get::<i64, _>("score").map_err(ser)?)?;
    let recorded_at = row.try_get("recorded_at").map_err(ser)?;

    Ok(HighScoreRow::new(
        id,
        HighScoreEntry::new(player, score, recorded_at),
    ))
}

#[async_trait]
impl HighScoreRepository for SqliteRepository {
    async fn append_score(&self, entry: &HighScoreEntry) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO high_scores (player, score, recorded_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(entry.player().as_str())
        .bind(i64::from(entry.score()))
        .bind(entry.recorded_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_scores(&self, limit: u32) -> Result<Vec<HighScoreRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, player, score, recorded_at
                FROM high_scores
                ORDER BY score DESC, id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }

    async fn best_score(&self) -> Result<Option<u32>, StorageError> {
        let row = sqlx::query("SELECT MAX(score) AS best FROM high_scores")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        let best: Option<i64> = row.try_get("best").map_err(ser)?;
        best.map(score_from_i64).transpose()
    }
}
