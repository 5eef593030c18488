use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use storage::repository::{HighScoreRepository, StorageError};

use lingua_core::Clock;
use lingua_core::model::{
    Advance, GameSettings, HighScoreEntry, PlayerName, Progress, ProgressionError, ProgressionState,
    Question, QuestionView, RunPhase,
};
use lingua_core::topics::TopicRegistry;
use lingua_core::validation::{self, BLANK_MESSAGE, CORRECT_MESSAGE, IncorrectReason, Verdict};

use super::{Advanced, AnswerOutcome, AnswerResult, RunSummary, Transition};
use crate::dictionary::WordLookup;
use crate::error::RunError;

/// Owns one run: its state, the question on screen, and the collaborators
/// needed to check answers and record the final score.
///
/// Every mutating call takes `&mut self`, so answers for one run are
/// processed one at a time. Share a run between tasks through
/// [`RunHandle`](super::RunHandle).
pub struct ProgressionController {
    state: ProgressionState,
    question: Option<Question>,
    registry: Arc<TopicRegistry>,
    dictionary: Option<Arc<dyn WordLookup>>,
    high_scores: Arc<dyn HighScoreRepository>,
    clock: Clock,
    rng: Box<dyn RngCore + Send + Sync>,
    pending: Option<HighScoreEntry>,
}

impl ProgressionController {
    /// # Errors
    ///
    /// Returns `RunError::RegistryMismatch` when the registry does not cover
    /// exactly `settings.total_sublevels()`.
    pub fn new(
        settings: GameSettings,
        registry: Arc<TopicRegistry>,
        high_scores: Arc<dyn HighScoreRepository>,
        clock: Clock,
    ) -> Result<Self, RunError> {
        if registry.total_sublevels() != settings.total_sublevels() {
            return Err(RunError::RegistryMismatch {
                registry: registry.total_sublevels(),
                settings: settings.total_sublevels(),
            });
        }
        Ok(Self {
            state: ProgressionState::new(settings),
            question: None,
            registry,
            dictionary: None,
            high_scores,
            clock,
            rng: Box::new(StdRng::from_os_rng()),
            pending: None,
        })
    }

    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Arc<dyn WordLookup>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Make question generation reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Box::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// The question awaiting an answer, without its expected answer.
    #[must_use]
    pub fn prompt(&self) -> Option<QuestionView> {
        self.question.as_ref().map(Question::view)
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    #[must_use]
    pub fn has_pending_high_score(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a fresh run for `player_name` at sublevel 1.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Name` for a blank name, or
    /// `RunError::Storage` when the previous run's score still cannot be
    /// stored.
    pub async fn start_run(&mut self, player_name: &str) -> Result<QuestionView, RunError> {
        let player = PlayerName::parse(player_name)?;
        self.finalize_high_score().await?;

        if matches!(
            self.state.phase(),
            RunPhase::InSublevel | RunPhase::Advancing
        ) {
            tracing::info!(run_id = %self.run_label(), "abandoning run");
        }
        self.state.start_run(player, self.clock.now());
        self.question = None;
        tracing::info!(
            run_id = %self.run_label(),
            player = %player_name.trim(),
            total = self.state.settings().total_sublevels(),
            "run started"
        );
        self.start_sublevel(1)
    }

    /// Generate a fresh question for sublevel `n` and reset attempts.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Progression` before a run, after it ended, for
    /// `n` outside the run or for a sublevel already behind the player.
    pub fn start_sublevel(&mut self, n: u32) -> Result<QuestionView, RunError> {
        self.state.check_enter(n)?;
        let question = self.registry.generate(n, self.rng.as_mut())?;
        self.state.enter_sublevel(n)?;
        tracing::debug!(
            run_id = %self.run_label(),
            sublevel = n,
            topic = question.topic(),
            policy = %question.policy(),
            "sublevel started"
        );
        let view = question.view();
        self.question = Some(question);
        Ok(view)
    }

    /// Check `raw` against the current question and update the run.
    ///
    /// Dictionary-backed answers are looked up before this returns; a
    /// missing, failing or slow dictionary counts as a wrong answer.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Progression` when no question is awaiting an
    /// answer.
    pub async fn submit_answer(&mut self, raw: &str) -> Result<AnswerResult, RunError> {
        match self.state.phase() {
            RunPhase::InSublevel => {}
            RunPhase::AwaitingStart => return Err(ProgressionError::NotStarted.into()),
            RunPhase::Advancing => return Err(ProgressionError::NoActiveQuestion.into()),
            phase => return Err(ProgressionError::RunFinished { phase }.into()),
        }
        let question = self
            .question
            .as_ref()
            .ok_or(ProgressionError::NoActiveQuestion)?;

        let verdict = validation::validate(question, raw, self.state.settings().blank_open_answer());
        let verdict = match verdict {
            Verdict::NeedsExternalCheck { word } => self.check_word(&word).await,
            other => other,
        };

        match verdict {
            Verdict::Correct => self.on_correct().await,
            Verdict::Incorrect(reason) => self.on_incorrect(reason).await,
            Verdict::NeedsExternalCheck { .. } => {
                self.on_incorrect(IncorrectReason::LookupFailed).await
            }
            Verdict::Blank => Ok(AnswerResult {
                outcome: AnswerOutcome::Incorrect,
                message: BLANK_MESSAGE,
                transition: Transition::Unchanged,
            }),
        }
    }

    /// Move past a cleared sublevel.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Progression` unless the current sublevel was just
    /// answered correctly.
    pub async fn advance(&mut self) -> Result<Advanced, RunError> {
        match self.state.advance()? {
            Advance::Next(n) => Ok(Advanced::Next(self.start_sublevel(n)?)),
            Advance::Completed => {
                Ok(Advanced::Completed(self.close_run().await?))
            }
        }
    }

    /// Play again with the same player after `GameOver` or `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Storage` while the last score cannot be stored
    /// (the run stays finished), and `RunError::Progression` when the run
    /// has not ended.
    pub async fn restart(&mut self) -> Result<QuestionView, RunError> {
        if !self.state.phase().is_terminal() {
            return Err(match self.state.phase() {
                RunPhase::AwaitingStart => ProgressionError::NotStarted,
                _ => ProgressionError::RunInProgress,
            }
            .into());
        }
        self.finalize_high_score().await?;
        self.state.restart(self.clock.now())?;
        tracing::info!(run_id = %self.run_label(), "run restarted");
        self.start_sublevel(1)
    }

    /// Retry storing a score whose first append failed.
    ///
    /// Returns `Ok(None)` when nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Storage` if the append fails again; the entry
    /// stays pending.
    pub async fn finalize_high_score(&mut self) -> Result<Option<RunSummary>, RunError> {
        let Some(entry) = self.pending.take() else {
            return Ok(None);
        };
        match self.persist(entry.clone()).await {
            Ok(summary) => {
                tracing::info!(score = entry.score(), "pending high score stored");
                Ok(Some(summary))
            }
            Err(err) => {
                self.pending = Some(entry);
                Err(err.into())
            }
        }
    }

    async fn on_correct(&mut self) -> Result<AnswerResult, RunError> {
        let phase = self.state.record_correct()?;
        self.question = None;
        let transition = if phase == RunPhase::Completed {
            tracing::info!(
                run_id = %self.run_label(),
                score = self.state.score(),
                "run completed"
            );
            Transition::Completed(self.close_run().await?)
        } else {
            Transition::Advancing {
                next: self.state.current_sublevel() + 1,
            }
        };
        Ok(AnswerResult {
            outcome: AnswerOutcome::Correct,
            message: CORRECT_MESSAGE,
            transition,
        })
    }

    async fn on_incorrect(&mut self, reason: IncorrectReason) -> Result<AnswerResult, RunError> {
        let phase = self.state.record_incorrect()?;
        let transition = if phase == RunPhase::GameOver {
            self.question = None;
            tracing::info!(
                run_id = %self.run_label(),
                sublevel = self.state.current_sublevel(),
                score = self.state.score(),
                "game over"
            );
            Transition::GameOver(self.close_run().await?)
        } else {
            Transition::Retry {
                attempts_remaining: self.state.attempts_remaining(),
            }
        };
        Ok(AnswerResult {
            outcome: AnswerOutcome::Incorrect,
            message: reason.message(),
            transition,
        })
    }

    async fn check_word(&self, word: &str) -> Verdict {
        let Some(dictionary) = self.dictionary.as_ref() else {
            tracing::warn!(word, "no dictionary configured; rejecting word");
            return Verdict::from_lookup(None);
        };

        let timeout_ms = self.state.settings().dictionary_timeout_ms();
        let lookup = dictionary.word_exists(word);
        let exists = match tokio::time::timeout(Duration::from_millis(timeout_ms), lookup).await {
            Ok(Ok(exists)) => Some(exists),
            Ok(Err(err)) => {
                tracing::warn!(%err, word, "dictionary lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(timeout_ms, word, "dictionary lookup timed out");
                None
            }
        };
        Verdict::from_lookup(exists)
    }

    async fn close_run(&mut self) -> Result<RunSummary, RunError> {
        let entry = self
            .state
            .high_score_entry(self.clock.now())
            .ok_or(ProgressionError::NotStarted)?;

        match self.persist(entry.clone()).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                tracing::warn!(
                    run_id = %self.run_label(),
                    %err,
                    "could not store high score; keeping it for retry"
                );
                self.pending = Some(entry.clone());
                Ok(RunSummary {
                    entry,
                    is_new_high_score: false,
                    high_score_id: None,
                })
            }
        }
    }

    async fn persist(&self, entry: HighScoreEntry) -> Result<RunSummary, StorageError> {
        let best = self.high_scores.best_score().await?;
        let id = self.high_scores.append_score(&entry).await?;
        Ok(RunSummary {
            is_new_high_score: best.is_none_or(|best| entry.score() > best),
            high_score_id: Some(id),
            entry,
        })
    }

    fn run_label(&self) -> String {
        self.state
            .run_id()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_core::model::Answer;
    use lingua_core::time::fixed_clock;
    use lingua_core::topics::Topic;
    use storage::repository::InMemoryRepository;

    #[derive(Debug)]
    struct Fixed(Answer);

    impl Topic for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, local_index: u32, _rng: &mut dyn RngCore) -> Question {
            Question::new("fixed", format!("q{local_index}"), self.0.clone())
        }
    }

    fn controller(total: u32, answer: Answer) -> ProgressionController {
        let settings = GameSettings::new(total, 3, 10).unwrap();
        let registry = TopicRegistry::partitioned(
            vec![Arc::new(Fixed(answer)) as Arc<dyn Topic>],
            total,
            settings.remainder(),
        )
        .unwrap();
        ProgressionController::new(
            settings,
            Arc::new(registry),
            Arc::new(InMemoryRepository::new()),
            fixed_clock(),
        )
        .unwrap()
        .with_seed(7)
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_starting() {
        let mut ctl = controller(3, Answer::Open);
        let err = ctl.start_run("   ").await.unwrap_err();
        assert!(matches!(err, RunError::Name(_)));
        assert_eq!(ctl.state().phase(), RunPhase::AwaitingStart);
        assert!(ctl.prompt().is_none());
    }

    #[tokio::test]
    async fn submit_before_start_fails_loudly() {
        let mut ctl = controller(3, Answer::Open);
        let err = ctl.submit_answer("x").await.unwrap_err();
        assert!(matches!(
            err,
            RunError::Progression(ProgressionError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn start_sublevel_past_the_end_is_out_of_range() {
        let mut ctl = controller(3, Answer::Open);
        ctl.start_run("Ada").await.unwrap();
        let err = ctl.start_sublevel(4).unwrap_err();
        assert!(matches!(
            err,
            RunError::Progression(ProgressionError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn retry_keeps_the_same_question() {
        let mut ctl = controller(3, Answer::Exact("CAT".into()));
        let first = ctl.start_run("Ada").await.unwrap();
        let result = ctl.submit_answer("cat").await.unwrap();
        assert_eq!(result.message, "case mismatch");
        assert_eq!(
            result.transition,
            Transition::Retry {
                attempts_remaining: 2
            }
        );
        assert_eq!(ctl.prompt(), Some(first));
    }

    #[tokio::test]
    async fn answering_twice_after_correct_is_rejected() {
        let mut ctl = controller(3, Answer::Exact("CAT".into()));
        ctl.start_run("Ada").await.unwrap();
        let result = ctl.submit_answer("CAT").await.unwrap();
        assert_eq!(result.transition, Transition::Advancing { next: 2 });
        let err = ctl.submit_answer("CAT").await.unwrap_err();
        assert!(matches!(
            err,
            RunError::Progression(ProgressionError::NoActiveQuestion)
        ));
        assert_eq!(ctl.state().score(), 10);
    }

    #[tokio::test]
    async fn dictionary_answers_without_dictionary_fail_closed() {
        let mut ctl = controller(
            3,
            Answer::Dictionary {
                target: "BOOK".into(),
            },
        );
        ctl.start_run("Ada").await.unwrap();
        let result = ctl.submit_answer("kobo").await.unwrap();
        assert_eq!(result.outcome, AnswerOutcome::Incorrect);
        assert_eq!(result.message, IncorrectReason::LookupFailed.message());
        assert_eq!(ctl.state().attempts_remaining(), 2);
    }

    #[test]
    fn registry_must_match_settings() {
        let settings = GameSettings::new(4, 3, 10).unwrap();
        let registry = TopicRegistry::partitioned(
            vec![Arc::new(Fixed(Answer::Open)) as Arc<dyn Topic>],
            3,
            settings.remainder(),
        )
        .unwrap();
        let err = ProgressionController::new(
            settings,
            Arc::new(registry),
            Arc::new(InMemoryRepository::new()),
            fixed_clock(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            RunError::RegistryMismatch {
                registry: 3,
                settings: 4
            }
        ));
    }
}
