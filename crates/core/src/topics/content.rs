//! Static content documents.
//!
//! ```json
//! {
//!   "settings": { "total_sublevels": 20 },
//!   "levels": [
//!     { "sublevel": 1, "topic": "Alphabet", "question": "Type the letter {letter}",
//!       "type": "alphabet-recognition", "data": ["A", "B"], "answerType": "case-sensitive" },
//!     { "sublevel": 11, "topic": "Words", "question": "Unscramble {letters}",
//!       "type": "word-formation", "data": ["BOOK", "KOBO"] }
//!   ]
//! }
//! ```
//!
//! Each entry governs the sublevels from its own `sublevel` up to the one
//! before the next entry; the last entry runs to the end of the run.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{GameSettings, SettingsError};
use crate::topics::{
    CaseRule, LetterTopic, OpenTopic, PromptItem, PromptTopic, RegistryError, ScrambleTopic,
    Selection, Topic, TopicError, TopicRegistry,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("invalid content document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("content document has no levels")]
    Empty,
    #[error("first level must start at sublevel 1, found {found}")]
    FirstSublevel { found: u32 },
    #[error("sublevel {found} does not follow {previous}")]
    NotIncreasing { previous: u32, found: u32 },
    #[error("sublevel {sublevel} is beyond the last sublevel {total}")]
    BeyondTotal { sublevel: u32, total: u32 },
    #[error("sublevel {sublevel}: `answers` has {answers} entries for {cues} cues")]
    AnswersMismatch {
        sublevel: u32,
        cues: usize,
        answers: usize,
    },
    #[error("sublevel {sublevel}: dictionary validation only applies to word-formation")]
    UnsupportedApiValidation { sublevel: u32 },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    AlphabetRecognition,
    WordFormation,
    FillIn,
    OpenEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerType {
    CaseSensitive,
    CaseInsensitive,
}

impl From<Option<AnswerType>> for CaseRule {
    fn from(value: Option<AnswerType>) -> Self {
        match value {
            Some(AnswerType::CaseSensitive) => CaseRule::Sensitive,
            Some(AnswerType::CaseInsensitive) | None => CaseRule::Insensitive,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SublevelEntry {
    pub sublevel: u32,
    pub topic: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub data: Vec<String>,
    #[serde(default)]
    pub answer_type: Option<AnswerType>,
    #[serde(default)]
    pub api_validation: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Accepted answers per `data` cue, for `fill-in`.
    #[serde(default)]
    pub answers: Vec<Vec<String>>,
    #[serde(default)]
    pub selection: Selection,
}

impl SublevelEntry {
    /// # Errors
    ///
    /// Returns `ContentError` when the entry's data does not fit its kind.
    pub fn into_topic(self) -> Result<Arc<dyn Topic>, ContentError> {
        let case = CaseRule::from(self.answer_type);
        if self.api_validation && self.kind != QuestionKind::WordFormation {
            return Err(ContentError::UnsupportedApiValidation {
                sublevel: self.sublevel,
            });
        }

        let topic: Arc<dyn Topic> = match self.kind {
            QuestionKind::AlphabetRecognition => Arc::new(
                LetterTopic::new(self.topic, self.question, self.data, case)?
                    .with_selection(self.selection)
                    .with_hint(self.description),
            ),
            QuestionKind::WordFormation => Arc::new(
                ScrambleTopic::from_words(self.topic, self.question, &self.data, case)?
                    .with_dictionary(self.api_validation)
                    .with_selection(self.selection)
                    .with_hint(self.description),
            ),
            QuestionKind::FillIn => {
                if self.answers.len() != self.data.len() {
                    return Err(ContentError::AnswersMismatch {
                        sublevel: self.sublevel,
                        cues: self.data.len(),
                        answers: self.answers.len(),
                    });
                }
                let items = self
                    .data
                    .into_iter()
                    .zip(self.answers)
                    .map(|(cue, answers)| PromptItem::new(cue, answers))
                    .collect();
                Arc::new(
                    PromptTopic::new(self.topic, self.question, items, case)?
                        .with_selection(self.selection)
                        .with_hint(self.description),
                )
            }
            QuestionKind::OpenEnded => Arc::new(
                OpenTopic::new(self.topic, self.question, self.data)?
                    .with_selection(self.selection)
                    .with_hint(self.description),
            ),
        };
        Ok(topic)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentDocument {
    #[serde(default)]
    pub settings: Option<GameSettings>,
    #[serde(alias = "beginnerLevels")]
    pub levels: Vec<SublevelEntry>,
}

impl ContentDocument {
    /// # Errors
    ///
    /// Returns `ContentError::Parse` for malformed JSON and
    /// `ContentError::Settings` for invalid embedded settings.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        let doc: Self = serde_json::from_str(raw)?;
        if let Some(settings) = &doc.settings {
            settings.validate()?;
        }
        Ok(doc)
    }

    /// Embedded settings, or `fallback` when the document has none.
    #[must_use]
    pub fn settings_or(&self, fallback: GameSettings) -> GameSettings {
        self.settings.clone().unwrap_or(fallback)
    }

    /// Build a registry covering `1..=total_sublevels`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` for misordered levels or invalid topic data.
    pub fn into_registry(self, total_sublevels: u32) -> Result<TopicRegistry, ContentError> {
        let mut levels = self.levels;
        let first = levels.first().ok_or(ContentError::Empty)?.sublevel;
        if first != 1 {
            return Err(ContentError::FirstSublevel { found: first });
        }

        let starts: Vec<u32> = levels.iter().map(|l| l.sublevel).collect();
        for pair in starts.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ContentError::NotIncreasing {
                    previous: pair[0],
                    found: pair[1],
                });
            }
        }
        if let Some(&last) = starts.last() {
            if last > total_sublevels {
                return Err(ContentError::BeyondTotal {
                    sublevel: last,
                    total: total_sublevels,
                });
            }
        }

        let ends = starts
            .iter()
            .skip(1)
            .map(|next| next - 1)
            .chain(std::iter::once(total_sublevels));

        let mut ranges = Vec::with_capacity(levels.len());
        for (entry, end) in levels.drain(..).zip(ends) {
            let start = entry.sublevel;
            ranges.push((entry.into_topic()?, start..=end));
        }

        Ok(TopicRegistry::from_ranges(ranges, total_sublevels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, BlankAnswerPolicy, ValidationPolicy};
    use crate::validation::{Verdict, validate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DOC: &str = r#"{
        "settings": { "total_sublevels": 30, "max_attempts": 2 },
        "beginnerLevels": [
            { "sublevel": 1, "topic": "Alphabet", "question": "Type the letter {letter}",
              "type": "alphabet-recognition", "data": ["A"], "answerType": "case-sensitive",
              "description": "Capital letters only" },
            { "sublevel": 11, "topic": "Words", "question": "Unscramble {letters}",
              "type": "word-formation", "data": ["BOOK", "KOBO"], "answerType": "case-sensitive" },
            { "sublevel": 21, "topic": "Tenses", "question": "Past tense of {item}",
              "type": "fill-in", "data": ["go", "dream"],
              "answers": [["went"], ["dreamed", "dreamt"]], "selection": "sequential" },
            { "sublevel": 26, "topic": "Free", "question": "{item}",
              "type": "open-ended", "data": ["Tell me about your day"] }
        ]
    }"#;

    #[test]
    fn parses_and_builds_contiguous_ranges() {
        let doc = ContentDocument::from_json(DOC).unwrap();
        let settings = doc.settings_or(GameSettings::default());
        assert_eq!(settings.total_sublevels(), 30);
        assert_eq!(settings.max_attempts(), 2);

        let registry = doc.into_registry(settings.total_sublevels()).unwrap();
        let ranges: Vec<_> = registry.slots().iter().map(|s| s.range()).collect();
        assert_eq!(ranges, vec![1..=10, 11..=20, 21..=25, 26..=30]);

        let mut rng = StdRng::seed_from_u64(11);
        let letter = registry.generate(4, &mut rng).unwrap();
        assert_eq!(letter.prompt(), "Type the letter A");
        assert_eq!(letter.answer(), &Answer::Exact("A".into()));
        assert_eq!(letter.hint(), Some("Capital letters only"));

        let words = registry.generate(11, &mut rng).unwrap();
        assert_eq!(words.policy(), ValidationPolicy::MultiChoice);

        let tense = registry.generate(22, &mut rng).unwrap();
        assert_eq!(tense.prompt(), "Past tense of dream");
        assert_eq!(tense.policy(), ValidationPolicy::MultiChoice);
        assert_eq!(
            validate(&tense, "Dreamt", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );

        assert_eq!(
            registry.generate(30, &mut rng).unwrap().policy(),
            ValidationPolicy::Open
        );
    }

    #[test]
    fn word_formation_follows_answer_type_for_alternatives() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [
                { "sublevel": 1, "topic": "Loose", "question": "{letters}",
                  "type": "word-formation", "data": ["BOOK", "KOBO"] },
                { "sublevel": 2, "topic": "Strict", "question": "{letters}",
                  "type": "word-formation", "data": ["BOOK", "KOBO"],
                  "answerType": "case-sensitive" }
            ] }"#,
        )
        .unwrap();
        let registry = doc.into_registry(2).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let loose = registry.generate(1, &mut rng).unwrap();
        assert_eq!(loose.policy(), ValidationPolicy::MultiChoice);
        assert_eq!(
            validate(&loose, "book", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&loose, "kobo", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );

        let strict = registry.generate(2, &mut rng).unwrap();
        assert_ne!(
            validate(&strict, "book", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
    }

    #[test]
    fn rejects_late_first_level() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [ { "sublevel": 2, "topic": "T", "question": "{item}",
                 "type": "open-ended", "data": ["x"] } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.into_registry(5),
            Err(ContentError::FirstSublevel { found: 2 })
        ));
    }

    #[test]
    fn rejects_unordered_levels() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [
                 { "sublevel": 1, "topic": "T", "question": "{item}", "type": "open-ended", "data": ["x"] },
                 { "sublevel": 1, "topic": "U", "question": "{item}", "type": "open-ended", "data": ["y"] }
               ] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.into_registry(5),
            Err(ContentError::NotIncreasing { .. })
        ));
    }

    #[test]
    fn rejects_api_validation_outside_word_formation() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [ { "sublevel": 1, "topic": "T", "question": "{letter}",
                 "type": "alphabet-recognition", "data": ["A"], "apiValidation": true } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.into_registry(1),
            Err(ContentError::UnsupportedApiValidation { sublevel: 1 })
        ));
    }

    #[test]
    fn rejects_mismatched_answers() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [ { "sublevel": 1, "topic": "T", "question": "{item}",
                 "type": "fill-in", "data": ["go", "see"], "answers": [["went"]] } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.into_registry(1),
            Err(ContentError::AnswersMismatch { cues: 2, answers: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty_pools_and_bad_settings() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [ { "sublevel": 1, "topic": "T", "question": "{item}",
                 "type": "open-ended", "data": [] } ] }"#,
        )
        .unwrap();
        assert!(matches!(doc.into_registry(1), Err(ContentError::Topic(_))));

        let err = ContentDocument::from_json(r#"{ "settings": { "max_attempts": 0 }, "levels": [] }"#)
            .unwrap_err();
        assert!(matches!(err, ContentError::Settings(SettingsError::NoAttempts)));
    }

    #[test]
    fn dictionary_word_formation() {
        let doc = ContentDocument::from_json(
            r#"{ "levels": [ { "sublevel": 1, "topic": "Words", "question": "{letters}",
                 "type": "word-formation", "data": ["STOP"], "apiValidation": true } ] }"#,
        )
        .unwrap();
        let registry = doc.into_registry(3).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let q = registry.generate(3, &mut rng).unwrap();
        assert_eq!(q.policy(), ValidationPolicy::DictionaryBacked);
    }
}
