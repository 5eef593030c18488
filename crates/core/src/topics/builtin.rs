//! Content used when no external document is supplied.

use std::sync::Arc;

use crate::model::GameSettings;
use crate::topics::{
    CaseRule, LetterTopic, OpenTopic, PromptItem, PromptTopic, RegistryError, ScrambleTopic,
    Topic, TopicError, TopicRegistry,
};

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const WORDS: &[&str] = &[
    "BOOK", "KOBO", "CAT", "ACT", "DOG", "GOD", "STOP", "POTS", "TOPS", "SPOT", "APPLE", "HOUSE",
    "WATER", "TABLE", "GARDEN", "DANGER",
];

fn letter_topic() -> Result<LetterTopic, TopicError> {
    LetterTopic::new(
        "Alphabet Recognition",
        "Type the letter {letter}",
        LETTERS.chars().map(String::from).collect(),
        CaseRule::Sensitive,
    )
    .map(|t| t.with_hint(Some("Use capital letters.".into())))
}

fn scramble_topic() -> Result<ScrambleTopic, TopicError> {
    let words: Vec<String> = WORDS.iter().map(|w| (*w).to_owned()).collect();
    ScrambleTopic::from_words(
        "Word Formation",
        "Unscramble these letters: {letters}",
        &words,
        CaseRule::Sensitive,
    )
}

fn fill_in_topic() -> Result<PromptTopic, TopicError> {
    PromptTopic::new(
        "Fill in the Blank",
        "Complete the sentence: {item}",
        vec![
            PromptItem::new("The sun rises in the ___.", ["east"]),
            PromptItem::new("A baby cat is called a ___.", ["kitten"]),
            PromptItem::new("We read ___ book every night.", ["a", "the"]),
            PromptItem::new("Water freezes at zero ___ Celsius.", ["degrees"]),
            PromptItem::new("She ___ to school on foot.", ["walks", "goes"]),
        ],
        CaseRule::Insensitive,
    )
}

fn part_of_speech_topic() -> Result<PromptTopic, TopicError> {
    PromptTopic::new(
        "Parts of Speech",
        "Is '{item}' a noun, verb, adjective, or adverb?",
        vec![
            PromptItem::new("run", ["verb"]),
            PromptItem::new("happy", ["adjective"]),
            PromptItem::new("table", ["noun"]),
            PromptItem::new("quickly", ["adverb"]),
            PromptItem::new("blue", ["adjective"]),
            PromptItem::new("think", ["verb"]),
        ],
        CaseRule::Insensitive,
    )
}

fn tense_topic() -> Result<PromptTopic, TopicError> {
    PromptTopic::new(
        "Tense Conversion",
        "Write the past tense of '{item}'",
        vec![
            PromptItem::new("go", ["went"]),
            PromptItem::new("eat", ["ate"]),
            PromptItem::new("write", ["wrote"]),
            PromptItem::new("see", ["saw"]),
            PromptItem::new("dream", ["dreamed", "dreamt"]),
            PromptItem::new("learn", ["learned", "learnt"]),
        ],
        CaseRule::Insensitive,
    )
}

fn open_topic() -> Result<OpenTopic, TopicError> {
    OpenTopic::new(
        "Free Response",
        "{item}",
        vec![
            "Write a sentence using the word 'because'.".into(),
            "Describe your favourite food in a few words.".into(),
            "Name something you can see right now.".into(),
        ],
    )
}

/// The six built-in topics, in progression order.
///
/// # Errors
///
/// Returns `TopicError` only if the built-in tables are malformed.
pub fn default_topics() -> Result<Vec<Arc<dyn Topic>>, TopicError> {
    Ok(vec![
        Arc::new(letter_topic()?),
        Arc::new(scramble_topic()?),
        Arc::new(fill_in_topic()?),
        Arc::new(part_of_speech_topic()?),
        Arc::new(tense_topic()?),
        Arc::new(open_topic()?),
    ])
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuiltinError {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Registry over the built-in topics, partitioned per `settings`.
///
/// # Errors
///
/// Returns `BuiltinError::Registry` when there are fewer sublevels than
/// topics.
pub fn default_registry(settings: &GameSettings) -> Result<TopicRegistry, BuiltinError> {
    Ok(TopicRegistry::partitioned(
        default_topics()?,
        settings.total_sublevels(),
        settings.remainder(),
    )?)
}
