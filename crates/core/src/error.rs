use thiserror::Error;

use crate::model::{PlayerNameError, ProgressionError, SettingsError};
use crate::topics::builtin::BuiltinError;
use crate::topics::{ContentError, RegistryError, TopicError};

/// Any error raised by the domain crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    PlayerName(#[from] PlayerNameError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
}
