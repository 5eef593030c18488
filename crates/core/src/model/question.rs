use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule set used to compare a submitted answer against the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    Exact,
    CaseInsensitive,
    MultiChoice,
    Open,
    DictionaryBacked,
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationPolicy::Exact => "exact",
            ValidationPolicy::CaseInsensitive => "case-insensitive",
            ValidationPolicy::MultiChoice => "multi-choice",
            ValidationPolicy::Open => "open",
            ValidationPolicy::DictionaryBacked => "dictionary-backed",
        };
        f.write_str(label)
    }
}

/// Whether letter case matters when comparing answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseRule {
    Sensitive,
    #[default]
    Insensitive,
}

impl CaseRule {
    /// Single-answer form of this rule.
    #[must_use]
    pub fn answer(self, expected: &str) -> Answer {
        match self {
            CaseRule::Sensitive => Answer::Exact(expected.to_owned()),
            CaseRule::Insensitive => Answer::CaseInsensitive(expected.to_owned()),
        }
    }

    /// Whether `input` and `expected` are equal under this rule.
    #[must_use]
    pub fn matches(self, input: &str, expected: &str) -> bool {
        match self {
            CaseRule::Sensitive => input == expected,
            CaseRule::Insensitive => input.to_lowercase() == expected.to_lowercase(),
        }
    }

    fn sensitive() -> Self {
        CaseRule::Sensitive
    }
}

/// Expected answer together with the policy that checks it.
///
/// Each variant pairs the answer data with exactly one `ValidationPolicy`,
/// so a question can never carry, say, an open policy with a fixed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "expected", rename_all = "kebab-case")]
pub enum Answer {
    /// Byte-for-byte match (answers are upper-case by convention).
    Exact(String),
    CaseInsensitive(String),
    /// Match against any of the alternatives; case-sensitive unless `case`
    /// says otherwise.
    OneOf {
        alternatives: Vec<String>,
        #[serde(default = "CaseRule::sensitive")]
        case: CaseRule,
    },
    /// Any non-empty input.
    Open,
    /// A word spelled from the letters of `target` that the dictionary knows.
    Dictionary { target: String },
}

/// Borrowed view of the expected answer, independent of the policy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedAnswer<'a> {
    Single(&'a str),
    Alternatives(&'a [String]),
    Open,
}

impl Answer {
    #[must_use]
    pub fn one_of<I, S>(alternatives: I, case: CaseRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::OneOf {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
            case,
        }
    }

    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        match self {
            Answer::Exact(_) => ValidationPolicy::Exact,
            Answer::CaseInsensitive(_) => ValidationPolicy::CaseInsensitive,
            Answer::OneOf { .. } => ValidationPolicy::MultiChoice,
            Answer::Open => ValidationPolicy::Open,
            Answer::Dictionary { .. } => ValidationPolicy::DictionaryBacked,
        }
    }

    #[must_use]
    pub fn expected(&self) -> ExpectedAnswer<'_> {
        match self {
            Answer::Exact(s) | Answer::CaseInsensitive(s) => ExpectedAnswer::Single(s),
            Answer::Dictionary { target } => ExpectedAnswer::Single(target),
            Answer::OneOf { alternatives, .. } => ExpectedAnswer::Alternatives(alternatives),
            Answer::Open => ExpectedAnswer::Open,
        }
    }

    /// Every concrete string this answer accepts without a dictionary lookup.
    #[must_use]
    pub fn accepted(&self) -> Vec<&str> {
        match self.expected() {
            ExpectedAnswer::Single(s) => vec![s],
            ExpectedAnswer::Alternatives(set) => set.iter().map(String::as_str).collect(),
            ExpectedAnswer::Open => Vec::new(),
        }
    }
}

/// A generated question, fresh for every sublevel start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    topic: String,
    prompt: String,
    hint: Option<String>,
    answer: Answer,
}

impl Question {
    #[must_use]
    pub fn new(topic: impl Into<String>, prompt: impl Into<String>, answer: Answer) -> Self {
        Self {
            topic: topic.into(),
            prompt: prompt.into(),
            hint: None,
            answer,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint.filter(|h| !h.trim().is_empty());
        self
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        self.answer.policy()
    }

    #[must_use]
    pub fn expected(&self) -> ExpectedAnswer<'_> {
        self.answer.expected()
    }

    /// Prompt-facing copy that never includes the expected answer.
    #[must_use]
    pub fn view(&self) -> QuestionView {
        QuestionView {
            topic: self.topic.clone(),
            prompt: self.prompt.clone(),
            hint: self.hint.clone(),
            policy: self.policy(),
        }
    }
}

/// What a presenter may show for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub topic: String,
    pub prompt: String,
    pub hint: Option<String>,
    pub policy: ValidationPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_variants_map_to_one_policy_each() {
        assert_eq!(Answer::Exact("A".into()).policy(), ValidationPolicy::Exact);
        assert_eq!(
            Answer::CaseInsensitive("a".into()).policy(),
            ValidationPolicy::CaseInsensitive
        );
        assert_eq!(
            Answer::one_of(["BOOK"], CaseRule::Insensitive).policy(),
            ValidationPolicy::MultiChoice
        );
        assert_eq!(Answer::Open.policy(), ValidationPolicy::Open);
        assert_eq!(
            Answer::Dictionary {
                target: "CAT".into()
            }
            .policy(),
            ValidationPolicy::DictionaryBacked
        );
    }

    #[test]
    fn accepted_lists_alternatives() {
        let answer = Answer::one_of(["BOOK", "KOBO"], CaseRule::Sensitive);
        assert_eq!(answer.accepted(), vec!["BOOK", "KOBO"]);
        assert!(Answer::Open.accepted().is_empty());
    }

    #[test]
    fn one_of_defaults_to_case_sensitive() {
        let answer: Answer =
            serde_json::from_str(r#"{"policy":"one-of","expected":{"alternatives":["BOOK"]}}"#)
                .unwrap();
        assert_eq!(answer, Answer::one_of(["BOOK"], CaseRule::Sensitive));
    }

    #[test]
    fn view_hides_expected_answer() {
        let q = Question::new("Letters", "Type the letter Q", Answer::Exact("Q".into()))
            .with_hint(Some("Upper case only".into()));
        let view = q.view();
        assert_eq!(view.prompt, "Type the letter Q");
        assert_eq!(view.hint.as_deref(), Some("Upper case only"));
        assert_eq!(view.policy, ValidationPolicy::Exact);
    }

    #[test]
    fn blank_hint_is_dropped() {
        let q = Question::new("T", "P", Answer::Open).with_hint(Some("   ".into()));
        assert_eq!(q.hint(), None);
    }
}
