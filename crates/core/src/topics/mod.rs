//! Topic registry: which topic owns which sublevel, and how each topic
//! produces questions.

pub mod builtin;
pub mod content;
mod generators;
mod registry;

pub use content::{AnswerType, ContentDocument, ContentError, QuestionKind, SublevelEntry};
pub use crate::model::CaseRule;
pub use generators::{
    LetterTopic, MAX_SCRAMBLE_ATTEMPTS, OpenTopic, Pool, PromptItem, PromptTopic,
    ScrambleTopic, Selection, Topic, TopicError, WordEntry, scramble,
};
pub use registry::{RegistryError, ResolvedTopic, TopicRegistry, TopicSlot};
