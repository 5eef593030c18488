use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Answer, CaseRule, Question};

/// Upper bound on reshuffles before a scramble gives up and shows the word
/// as-is.
pub const MAX_SCRAMBLE_ATTEMPTS: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic `{topic}` has an empty content pool")]
    EmptyPool { topic: String },
    #[error("topic `{topic}` has a blank item")]
    BlankItem { topic: String },
    #[error("topic `{topic}` has no accepted answer for `{cue}`")]
    MissingAnswers { topic: String, cue: String },
}

/// A named question-generation strategy.
///
/// `generate` may draw from `rng` and is not expected to be deterministic;
/// `local_index` is the zero-based position inside the topic's range.
pub trait Topic: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn generate(&self, local_index: u32, rng: &mut dyn RngCore) -> Question;
}

/// How an item is taken from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    Random,
    /// `local_index mod len`, so every sublevel of a topic has a fixed item.
    Sequential,
}

/// Non-empty list of content items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool<T>(Vec<T>);

impl<T> Pool<T> {
    /// # Errors
    ///
    /// Returns `TopicError::EmptyPool` for an empty list.
    pub fn new(topic: &str, items: Vec<T>) -> Result<Self, TopicError> {
        if items.is_empty() {
            return Err(TopicError::EmptyPool {
                topic: topic.to_owned(),
            });
        }
        Ok(Self(items))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.0
    }

    /// Never out of bounds, whatever the size of `local_index`.
    pub fn pick(&self, selection: Selection, local_index: u32, rng: &mut dyn RngCore) -> &T {
        let len = self.0.len();
        let idx = match selection {
            Selection::Random => rng.random_range(0..len),
            Selection::Sequential => usize::try_from(local_index).unwrap_or(usize::MAX) % len,
        };
        &self.0[idx]
    }
}

/// Shuffle the letters of `target` into a form that matches none of
/// `forbidden` (compared case-insensitively).
///
/// Falls back to `target` itself after `MAX_SCRAMBLE_ATTEMPTS`, which only
/// happens for words with no distinct arrangement (e.g. "A", "EE").
pub fn scramble(target: &str, forbidden: &[&str], rng: &mut dyn RngCore) -> String {
    let forbidden: Vec<String> = forbidden.iter().map(|f| f.to_lowercase()).collect();
    let mut letters: Vec<char> = target.chars().collect();

    for _ in 0..MAX_SCRAMBLE_ATTEMPTS {
        letters.shuffle(rng);
        let candidate: String = letters.iter().collect();
        if !forbidden.contains(&candidate.to_lowercase()) {
            return candidate;
        }
    }

    target.to_owned()
}

fn fill(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(placeholder, value)
}

fn non_blank(topic: &str, items: &[String]) -> Result<(), TopicError> {
    if items.iter().any(|item| item.trim().is_empty()) {
        return Err(TopicError::BlankItem {
            topic: topic.to_owned(),
        });
    }
    Ok(())
}

//
// ─── LETTER RECOGNITION ────────────────────────────────────────────────────────
//

/// "Type the letter {letter}": the answer is the drawn letter itself.
#[derive(Debug, Clone)]
pub struct LetterTopic {
    name: String,
    template: String,
    letters: Pool<String>,
    selection: Selection,
    case: CaseRule,
    hint: Option<String>,
}

impl LetterTopic {
    /// # Errors
    ///
    /// Returns `TopicError` for an empty or blank pool.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        letters: Vec<String>,
        case: CaseRule,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        non_blank(&name, &letters)?;
        let letters = Pool::new(&name, letters)?;
        Ok(Self {
            name,
            template: template.into(),
            letters,
            selection: Selection::Random,
            case,
            hint: None,
        })
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

impl Topic for LetterTopic {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, local_index: u32, rng: &mut dyn RngCore) -> Question {
        let letter = self.letters.pick(self.selection, local_index, rng).trim();
        Question::new(
            &self.name,
            fill(&self.template, "{letter}", letter),
            self.case.answer(letter),
        )
        .with_hint(self.hint.clone())
    }
}

//
// ─── WORD SCRAMBLE ─────────────────────────────────────────────────────────────
//

/// Target word plus other spellings of the same letters that also count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl WordEntry {
    #[must_use]
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            alternatives: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_alternatives<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives = alternatives.into_iter().map(Into::into).collect();
        self
    }

    fn trimmed(self) -> Self {
        Self {
            word: self.word.trim().to_owned(),
            alternatives: self
                .alternatives
                .iter()
                .map(|alt| alt.trim())
                .filter(|alt| !alt.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    fn accepted(&self) -> Vec<&str> {
        std::iter::once(self.word.as_str())
            .chain(self.alternatives.iter().map(String::as_str))
            .collect()
    }
}

/// "Unscramble {letters}".
#[derive(Debug, Clone)]
pub struct ScrambleTopic {
    name: String,
    template: String,
    words: Pool<WordEntry>,
    selection: Selection,
    case: CaseRule,
    dictionary: bool,
    hint: Option<String>,
}

impl ScrambleTopic {
    /// # Errors
    ///
    /// Returns `TopicError` for an empty pool or a blank word.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        words: Vec<WordEntry>,
        case: CaseRule,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        let words: Vec<WordEntry> = words.into_iter().map(WordEntry::trimmed).collect();
        if words.iter().any(|w| w.word.is_empty()) {
            return Err(TopicError::BlankItem { topic: name });
        }
        let words = Pool::new(&name, words)?;
        Ok(Self {
            name,
            template: template.into(),
            words,
            selection: Selection::Random,
            case,
            dictionary: false,
            hint: None,
        })
    }

    /// Build entries from a flat word list, treating other words in the list
    /// with the same letters as accepted alternatives.
    ///
    /// # Errors
    ///
    /// Same as `new`.
    pub fn from_words(
        name: impl Into<String>,
        template: impl Into<String>,
        words: &[String],
        case: CaseRule,
    ) -> Result<Self, TopicError> {
        let words: Vec<&str> = words.iter().map(|w| w.trim()).collect();
        let entries = words
            .iter()
            .map(|word| {
                let alternatives = words.iter().filter(|other| {
                    !other.eq_ignore_ascii_case(word)
                        && crate::validation::same_letters(other, word)
                });
                WordEntry::new(*word).with_alternatives(alternatives.copied())
            })
            .collect();
        Self::new(name, template, entries, case)
    }

    /// Accept any dictionary word spelled from the given letters.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: bool) -> Self {
        self.dictionary = dictionary;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

impl Topic for ScrambleTopic {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, local_index: u32, rng: &mut dyn RngCore) -> Question {
        let entry = self.words.pick(self.selection, local_index, rng);
        let accepted = entry.accepted();
        let letters = scramble(&entry.word, &accepted, rng);

        let answer = if self.dictionary {
            Answer::Dictionary {
                target: entry.word.clone(),
            }
        } else if entry.alternatives.is_empty() {
            self.case.answer(&entry.word)
        } else {
            Answer::one_of(accepted.iter().copied(), self.case)
        };

        Question::new(&self.name, fill(&self.template, "{letters}", &letters), answer)
            .with_hint(self.hint.clone())
    }
}

//
// ─── CUE / ANSWER ──────────────────────────────────────────────────────────────
//

/// A cue shown to the player and the answers it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptItem {
    pub cue: String,
    pub answers: Vec<String>,
}

impl PromptItem {
    #[must_use]
    pub fn new<I, S>(cue: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cue: cue.into(),
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Fill-in-the-blank, part of speech, tense conversion and similar
/// "cue in, word out" topics. The template's `{item}` receives the cue.
#[derive(Debug, Clone)]
pub struct PromptTopic {
    name: String,
    template: String,
    items: Pool<PromptItem>,
    selection: Selection,
    case: CaseRule,
    hint: Option<String>,
}

impl PromptTopic {
    /// # Errors
    ///
    /// Returns `TopicError` for an empty pool or an item without answers.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        items: Vec<PromptItem>,
        case: CaseRule,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        for item in &items {
            if item.cue.trim().is_empty() {
                return Err(TopicError::BlankItem { topic: name });
            }
            if item.answers.iter().all(|a| a.trim().is_empty()) {
                return Err(TopicError::MissingAnswers {
                    topic: name,
                    cue: item.cue.clone(),
                });
            }
        }
        let items = Pool::new(&name, items)?;
        Ok(Self {
            name,
            template: template.into(),
            items,
            selection: Selection::Random,
            case,
            hint: None,
        })
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

impl Topic for PromptTopic {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, local_index: u32, rng: &mut dyn RngCore) -> Question {
        let item = self.items.pick(self.selection, local_index, rng);
        let answers: Vec<String> = item
            .answers
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_owned)
            .collect();

        let answer = if answers.len() == 1 {
            self.case.answer(&answers[0])
        } else {
            Answer::one_of(answers, self.case)
        };

        Question::new(&self.name, fill(&self.template, "{item}", &item.cue), answer)
            .with_hint(self.hint.clone())
    }
}

//
// ─── OPEN RESPONSE ─────────────────────────────────────────────────────────────
//

/// Free-form prompts where any non-empty answer counts.
#[derive(Debug, Clone)]
pub struct OpenTopic {
    name: String,
    template: String,
    prompts: Pool<String>,
    selection: Selection,
    hint: Option<String>,
}

impl OpenTopic {
    /// # Errors
    ///
    /// Returns `TopicError` for an empty or blank pool.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        prompts: Vec<String>,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        non_blank(&name, &prompts)?;
        let prompts = Pool::new(&name, prompts)?;
        Ok(Self {
            name,
            template: template.into(),
            prompts,
            selection: Selection::Random,
            hint: None,
        })
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

impl Topic for OpenTopic {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, local_index: u32, rng: &mut dyn RngCore) -> Question {
        let prompt = self.prompts.pick(self.selection, local_index, rng);
        Question::new(&self.name, fill(&self.template, "{item}", prompt), Answer::Open)
            .with_hint(self.hint.clone())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
