mod controller;
mod handle;

pub use controller::ProgressionController;
pub use handle::RunHandle;

use lingua_core::model::{HighScoreEntry, QuestionView};
use serde::Serialize;

/// What the player is told after submitting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

/// How a finished run was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub entry: HighScoreEntry,
    /// Strictly above every score stored before this run.
    pub is_new_high_score: bool,
    /// `None` while the entry is still waiting to be stored.
    pub high_score_id: Option<i64>,
}

impl RunSummary {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.high_score_id.is_some()
    }
}

/// State change caused by one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Transition {
    /// Same question again.
    Retry { attempts_remaining: u32 },
    /// Sublevel cleared; call `advance` for `next`.
    Advancing { next: u32 },
    GameOver(RunSummary),
    Completed(RunSummary),
    /// Blank open answer; nothing consumed.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub outcome: AnswerOutcome,
    pub message: &'static str,
    pub transition: Transition,
}

impl AnswerResult {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.outcome == AnswerOutcome::Correct
    }

    /// The run summary when this answer ended the run.
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        match &self.transition {
            Transition::GameOver(summary) | Transition::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Result of `ProgressionController::advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advanced {
    Next(QuestionView),
    Completed(RunSummary),
}
