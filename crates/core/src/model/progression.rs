use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{GameSettings, HighScoreEntry, PlayerName, RunId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Contract violations by the caller. None of these are user-facing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("no run has been started")]
    NotStarted,
    #[error("no active question to answer")]
    NoActiveQuestion,
    #[error("run already finished ({phase:?})")]
    RunFinished { phase: RunPhase },
    #[error("run is still in progress")]
    RunInProgress,
    #[error("sublevel {sublevel} is outside 1..={total}")]
    OutOfRange { sublevel: u32, total: u32 },
    #[error("cannot move back from sublevel {current} to {requested}")]
    SublevelRegression { requested: u32, current: u32 },
    #[error("current sublevel has not been answered yet")]
    NotAdvancing,
}

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunPhase {
    AwaitingStart,
    InSublevel,
    Advancing,
    GameOver,
    Completed,
}

impl RunPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::GameOver | RunPhase::Completed)
    }
}

/// Outcome of `ProgressionState::advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(u32),
    Completed,
}

/// Position within the run, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub percent: u32,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Run-time state of one run.
///
/// Holds no question and does no I/O; the owner generates questions and
/// resolves dictionary checks, then reports the result through
/// `record_correct` / `record_incorrect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    settings: GameSettings,
    run_id: Option<RunId>,
    player: Option<PlayerName>,
    started_at: Option<DateTime<Utc>>,
    current_sublevel: u32,
    /// Highest sublevel answered correctly in this run, 0 if none.
    cleared: u32,
    score: u32,
    attempts_remaining: u32,
    phase: RunPhase,
}

impl ProgressionState {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        let attempts = settings.max_attempts();
        Self {
            settings,
            run_id: None,
            player: None,
            started_at: None,
            current_sublevel: 1,
            cleared: 0,
            score: 0,
            attempts_remaining: attempts,
            phase: RunPhase::AwaitingStart,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    #[must_use]
    pub fn player(&self) -> Option<&PlayerName> {
        self.player.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn current_sublevel(&self) -> u32 {
        self.current_sublevel
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.settings.total_sublevels();
        let percent = u64::from(self.current_sublevel) * 100 / u64::from(total.max(1));
        Progress {
            current: self.current_sublevel,
            total,
            percent: u32::try_from(percent.min(100)).unwrap_or(100),
        }
    }

    /// Begin a new run for `player`, discarding whatever came before.
    ///
    /// Leaves the state in `InSublevel` at sublevel 1; the caller is
    /// expected to attach a fresh question.
    pub fn start_run(&mut self, player: PlayerName, started_at: DateTime<Utc>) {
        self.player = Some(player);
        self.reset(started_at);
    }

    /// Restart after a terminal state, keeping the player.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::NotStarted` before any run and
    /// `ProgressionError::RunInProgress` while the run is still live.
    pub fn restart(&mut self, started_at: DateTime<Utc>) -> Result<(), ProgressionError> {
        match self.phase {
            RunPhase::AwaitingStart => Err(ProgressionError::NotStarted),
            RunPhase::InSublevel | RunPhase::Advancing => Err(ProgressionError::RunInProgress),
            RunPhase::GameOver | RunPhase::Completed => {
                self.reset(started_at);
                Ok(())
            }
        }
    }

    fn reset(&mut self, started_at: DateTime<Utc>) {
        self.run_id = Some(RunId::new());
        self.started_at = Some(started_at);
        self.current_sublevel = 1;
        self.cleared = 0;
        self.score = 0;
        self.attempts_remaining = self.settings.max_attempts();
        self.phase = RunPhase::InSublevel;
    }

    /// Check that sublevel `n` may be started now.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted`/`RunFinished` in the wrong phase, `OutOfRange`
    /// outside `1..=total`, and `SublevelRegression` for `n` below the
    /// current sublevel or already answered correctly.
    pub fn check_enter(&self, n: u32) -> Result<(), ProgressionError> {
        self.ensure_live()?;
        let total = self.settings.total_sublevels();
        if n == 0 || n > total {
            return Err(ProgressionError::OutOfRange { sublevel: n, total });
        }
        if n < self.current_sublevel || n <= self.cleared {
            return Err(ProgressionError::SublevelRegression {
                requested: n,
                current: self.current_sublevel,
            });
        }
        Ok(())
    }

    /// Enter sublevel `n` with a full set of attempts.
    ///
    /// # Errors
    ///
    /// Same as `check_enter`.
    pub fn enter_sublevel(&mut self, n: u32) -> Result<(), ProgressionError> {
        self.check_enter(n)?;
        self.current_sublevel = n;
        self.attempts_remaining = self.settings.max_attempts();
        self.phase = RunPhase::InSublevel;
        Ok(())
    }

    /// Award points for a correct answer.
    ///
    /// Returns the new phase: `Completed` on the final sublevel, otherwise
    /// `Advancing`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError` unless a question is being answered.
    pub fn record_correct(&mut self) -> Result<RunPhase, ProgressionError> {
        self.ensure_answering()?;
        self.cleared = self.current_sublevel;
        self.score = self
            .score
            .saturating_add(self.settings.points_per_correct());
        self.phase = if self.current_sublevel >= self.settings.total_sublevels() {
            RunPhase::Completed
        } else {
            RunPhase::Advancing
        };
        Ok(self.phase)
    }

    /// Consume one attempt.
    ///
    /// Returns `GameOver` once attempts run out, otherwise `InSublevel`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError` unless a question is being answered.
    pub fn record_incorrect(&mut self) -> Result<RunPhase, ProgressionError> {
        self.ensure_answering()?;
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.phase = RunPhase::GameOver;
        }
        Ok(self.phase)
    }

    /// Move past an answered sublevel.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::NotAdvancing` while the current sublevel is
    /// still open, plus the usual phase errors.
    pub fn advance(&mut self) -> Result<Advance, ProgressionError> {
        self.ensure_live()?;
        if self.phase != RunPhase::Advancing {
            return Err(ProgressionError::NotAdvancing);
        }
        if self.current_sublevel >= self.settings.total_sublevels() {
            self.phase = RunPhase::Completed;
            return Ok(Advance::Completed);
        }
        self.current_sublevel += 1;
        Ok(Advance::Next(self.current_sublevel))
    }

    /// The entry to hand to the high-score sink, once the run is over.
    #[must_use]
    pub fn high_score_entry(&self, recorded_at: DateTime<Utc>) -> Option<HighScoreEntry> {
        if !self.phase.is_terminal() {
            return None;
        }
        self.player
            .clone()
            .map(|player| HighScoreEntry::new(player, self.score, recorded_at))
    }

    fn ensure_live(&self) -> Result<(), ProgressionError> {
        match self.phase {
            RunPhase::AwaitingStart => Err(ProgressionError::NotStarted),
            phase if phase.is_terminal() => Err(ProgressionError::RunFinished { phase }),
            _ => Ok(()),
        }
    }

    fn ensure_answering(&self) -> Result<(), ProgressionError> {
        self.ensure_live()?;
        if self.phase != RunPhase::InSublevel {
            return Err(ProgressionError::NoActiveQuestion);
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn started(total: u32) -> ProgressionState {
        let mut state = ProgressionState::new(GameSettings::new(total, 3, 10).unwrap());
        state.start_run(PlayerName::parse("Ada").unwrap(), fixed_now());
        state
    }

    #[test]
    fn start_run_enters_first_sublevel() {
        let state = started(5);
        assert_eq!(state.phase(), RunPhase::InSublevel);
        assert_eq!(state.current_sublevel(), 1);
        assert_eq!(state.score(), 0);
        assert_eq!(state.attempts_remaining(), 3);
        assert!(state.run_id().is_some());
    }

    #[test]
    fn answering_before_start_is_rejected() {
        let mut state = ProgressionState::new(GameSettings::default());
        assert_eq!(
            state.record_correct().unwrap_err(),
            ProgressionError::NotStarted
        );
    }

    #[test]
    fn three_misses_end_the_run() {
        let mut state = started(5);
        assert_eq!(state.record_incorrect().unwrap(), RunPhase::InSublevel);
        assert_eq!(state.record_incorrect().unwrap(), RunPhase::InSublevel);
        assert_eq!(state.record_incorrect().unwrap(), RunPhase::GameOver);
        assert_eq!(state.attempts_remaining(), 0);
        assert!(matches!(
            state.record_incorrect(),
            Err(ProgressionError::RunFinished { .. })
        ));
        assert_eq!(state.attempts_remaining(), 0);
    }

    #[test]
    fn correct_awards_points_and_keeps_attempts() {
        let mut state = started(5);
        state.record_incorrect().unwrap();
        assert_eq!(state.record_correct().unwrap(), RunPhase::Advancing);
        assert_eq!(state.score(), 10);
        assert_eq!(state.attempts_remaining(), 2);
    }

    #[test]
    fn advance_resets_attempts_on_enter() {
        let mut state = started(5);
        state.record_incorrect().unwrap();
        state.record_correct().unwrap();
        assert_eq!(state.advance().unwrap(), Advance::Next(2));
        state.enter_sublevel(2).unwrap();
        assert_eq!(state.attempts_remaining(), 3);
        assert_eq!(state.phase(), RunPhase::InSublevel);
    }

    #[test]
    fn advance_requires_an_answered_sublevel() {
        let mut state = started(5);
        assert_eq!(state.advance().unwrap_err(), ProgressionError::NotAdvancing);
    }

    #[test]
    fn correct_on_last_sublevel_completes() {
        let mut state = started(1);
        assert_eq!(state.record_correct().unwrap(), RunPhase::Completed);
        let entry = state.high_score_entry(fixed_now()).unwrap();
        assert_eq!(entry.score(), 10);
        assert_eq!(entry.player().as_str(), "Ada");
    }

    #[test]
    fn enter_rejects_out_of_range_and_regression() {
        let mut state = started(3);
        assert_eq!(
            state.enter_sublevel(4).unwrap_err(),
            ProgressionError::OutOfRange {
                sublevel: 4,
                total: 3
            }
        );
        assert!(matches!(
            state.enter_sublevel(0),
            Err(ProgressionError::OutOfRange { .. })
        ));
        state.enter_sublevel(3).unwrap();
        assert_eq!(
            state.enter_sublevel(2).unwrap_err(),
            ProgressionError::SublevelRegression {
                requested: 2,
                current: 3
            }
        );
    }

    #[test]
    fn answered_sublevel_cannot_be_replayed() {
        let mut state = started(3);
        state.record_correct().unwrap();
        assert_eq!(
            state.enter_sublevel(1).unwrap_err(),
            ProgressionError::SublevelRegression {
                requested: 1,
                current: 1
            }
        );
        assert_eq!(state.advance().unwrap(), Advance::Next(2));
        state.enter_sublevel(2).unwrap();
    }

    #[test]
    fn restart_only_from_terminal_states() {
        let mut state = started(3);
        assert_eq!(state.restart(fixed_now()).unwrap_err(), ProgressionError::RunInProgress);
        let first_run = state.run_id();
        state.record_correct().unwrap();
        assert_eq!(
            state.record_incorrect().unwrap_err(),
            ProgressionError::NoActiveQuestion
        );
        assert_eq!(state.phase(), RunPhase::Advancing);
        state.advance().unwrap();
        state.enter_sublevel(2).unwrap();
        for _ in 0..3 {
            state.record_incorrect().unwrap();
        }
        assert_eq!(state.phase(), RunPhase::GameOver);

        state.restart(fixed_now()).unwrap();
        assert_eq!(state.phase(), RunPhase::InSublevel);
        assert_eq!(state.score(), 0);
        assert_eq!(state.current_sublevel(), 1);
        assert_eq!(state.player().unwrap().as_str(), "Ada");
        assert_ne!(state.run_id(), first_run);
    }

    #[test]
    fn no_entry_while_run_is_live() {
        let state = started(3);
        assert!(state.high_score_entry(fixed_now()).is_none());
    }

    #[test]
    fn progress_reports_percent() {
        let mut state = started(4);
        assert_eq!(state.progress().percent, 25);
        state.record_correct().unwrap();
        state.advance().unwrap();
        state.enter_sublevel(2).unwrap();
        assert_eq!(
            state.progress(),
            Progress {
                current: 2,
                total: 4,
                percent: 50
            }
        );
    }
}
