//! Shared error types for the services crate.

use thiserror::Error;

use lingua_core::model::{PlayerNameError, ProgressionError, SettingsError};
use lingua_core::topics::builtin::BuiltinError;
use lingua_core::topics::{ContentError, RegistryError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by dictionary lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictionaryError {
    #[error("dictionary lookups are not configured")]
    Disabled,
    #[error("dictionary url cannot take a word segment")]
    InvalidUrl,
    #[error("dictionary request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ProgressionController`.
///
/// Wrong answers are never errors; these are caller mistakes or failures
/// of the high-score sink.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    #[error(transparent)]
    Name(#[from] PlayerNameError),
    #[error("registry covers {registry} sublevels but the run has {settings}")]
    RegistryMismatch { registry: u32, settings: u32 },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping `LinguaServices`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinguaServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error(transparent)]
    Run(#[from] RunError),
}
