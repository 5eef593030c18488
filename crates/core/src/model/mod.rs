mod high_score;
mod ids;
mod player;
mod progression;
mod question;
mod settings;

pub use ids::{ParseIdError, RunId};

pub use high_score::HighScoreEntry;
pub use player::{PlayerName, PlayerNameError};
pub use progression::{Advance, Progress, ProgressionError, ProgressionState, RunPhase};
pub use question::{Answer, CaseRule, ExpectedAnswer, Question, QuestionView, ValidationPolicy};
pub use settings::{BlankAnswerPolicy, GameSettings, RemainderPolicy, SettingsError};
