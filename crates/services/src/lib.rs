#![forbid(unsafe_code)]

pub mod dictionary;
pub mod error;
pub mod high_score_service;
pub mod lingua_services;
pub mod progression;

pub use lingua_core::Clock;

pub use dictionary::{DictionaryConfig, HttpDictionary, WordListDictionary, WordLookup};
pub use error::{DictionaryError, LinguaServicesError, RunError};
pub use high_score_service::{DEFAULT_LEADERBOARD_LIMIT, HighScoreService, LeaderboardItem};
pub use lingua_services::LinguaServices;
pub use progression::{
    Advanced, AnswerOutcome, AnswerResult, ProgressionController, RunHandle, RunSummary,
    Transition,
};
