use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use lingua_core::model::{Progress, ProgressionState, QuestionView};

use super::{Advanced, AnswerResult, ProgressionController, RunSummary};
use crate::error::RunError;

/// Shareable handle to one run.
///
/// Each call holds the lock until it returns, including while a dictionary
/// lookup is in flight, so a second submission waits for the first.
#[derive(Clone)]
pub struct RunHandle {
    inner: Arc<Mutex<ProgressionController>>,
}

impl RunHandle {
    #[must_use]
    pub fn new(controller: ProgressionController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Exclusive access for several calls in a row.
    pub async fn lock(&self) -> MutexGuard<'_, ProgressionController> {
        self.inner.lock().await
    }

    /// # Errors
    ///
    /// See [`ProgressionController::start_run`].
    pub async fn start_run(&self, player_name: &str) -> Result<QuestionView, RunError> {
        self.inner.lock().await.start_run(player_name).await
    }

    /// # Errors
    ///
    /// See [`ProgressionController::start_sublevel`].
    pub async fn start_sublevel(&self, n: u32) -> Result<QuestionView, RunError> {
        self.inner.lock().await.start_sublevel(n)
    }

    /// # Errors
    ///
    /// See [`ProgressionController::submit_answer`].
    pub async fn submit_answer(&self, raw: &str) -> Result<AnswerResult, RunError> {
        self.inner.lock().await.submit_answer(raw).await
    }

    /// # Errors
    ///
    /// See [`ProgressionController::advance`].
    pub async fn advance(&self) -> Result<Advanced, RunError> {
        self.inner.lock().await.advance().await
    }

    /// # Errors
    ///
    /// See [`ProgressionController::restart`].
    pub async fn restart(&self) -> Result<QuestionView, RunError> {
        self.inner.lock().await.restart().await
    }

    /// # Errors
    ///
    /// See [`ProgressionController::finalize_high_score`].
    pub async fn finalize_high_score(&self) -> Result<Option<RunSummary>, RunError> {
        self.inner.lock().await.finalize_high_score().await
    }

    pub async fn prompt(&self) -> Option<QuestionView> {
        self.inner.lock().await.prompt()
    }

    pub async fn progress(&self) -> Progress {
        self.inner.lock().await.progress()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> ProgressionState {
        self.inner.lock().await.state().clone()
    }
}
