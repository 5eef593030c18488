//! Local answer checking.
//!
//! Everything here is pure. Dictionary-backed questions stop at
//! `Verdict::NeedsExternalCheck`; the caller performs the lookup and feeds
//! the result back through `Verdict::from_lookup`.

use std::fmt;

use crate::model::{Answer, BlankAnswerPolicy, Question};

/// Why a submission was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncorrectReason {
    WrongAnswer,
    /// Right letters, wrong capitalisation, on an exact-case question.
    CaseMismatch,
    /// Dictionary question answered with letters that were not given.
    LettersMismatch,
    NotAWord,
    /// Dictionary unreachable, timed out, or not configured.
    LookupFailed,
    /// Blank open answer under `BlankAnswerPolicy::ConsumeAttempt`.
    Blank,
}

impl IncorrectReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            IncorrectReason::WrongAnswer => "incorrect",
            IncorrectReason::CaseMismatch => "case mismatch",
            IncorrectReason::LettersMismatch => "use the given letters",
            IncorrectReason::NotAWord => "not a recognised word",
            IncorrectReason::LookupFailed => "could not verify the word",
            IncorrectReason::Blank => BLANK_MESSAGE,
        }
    }
}

impl fmt::Display for IncorrectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub const CORRECT_MESSAGE: &str = "correct";
pub const BLANK_MESSAGE: &str = "enter an answer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect(IncorrectReason),
    /// Letters check out; the dictionary decides.
    NeedsExternalCheck { word: String },
    /// Blank open answer that costs nothing.
    Blank,
}

impl Verdict {
    /// Turn a dictionary answer into a verdict. `None` means the lookup
    /// itself failed, which is never accepted.
    #[must_use]
    pub fn from_lookup(exists: Option<bool>) -> Self {
        match exists {
            Some(true) => Verdict::Correct,
            Some(false) => Verdict::Incorrect(IncorrectReason::NotAWord),
            None => Verdict::Incorrect(IncorrectReason::LookupFailed),
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Correct => CORRECT_MESSAGE,
            Verdict::Incorrect(reason) => reason.message(),
            Verdict::NeedsExternalCheck { .. } => "checking",
            Verdict::Blank => BLANK_MESSAGE,
        }
    }
}

/// Check `raw` against the question's answer.
#[must_use]
pub fn validate(question: &Question, raw: &str, blank: BlankAnswerPolicy) -> Verdict {
    let input = raw.trim();

    match question.answer() {
        Answer::Open => {
            if !input.is_empty() {
                Verdict::Correct
            } else if blank == BlankAnswerPolicy::ConsumeAttempt {
                Verdict::Incorrect(IncorrectReason::Blank)
            } else {
                Verdict::Blank
            }
        }
        Answer::OneOf { alternatives, case } => {
            if alternatives.iter().any(|alt| case.matches(input, alt.trim())) {
                Verdict::Correct
            } else {
                Verdict::Incorrect(IncorrectReason::WrongAnswer)
            }
        }
        Answer::Exact(expected) => {
            if input == expected {
                Verdict::Correct
            } else if input.to_lowercase() == expected.to_lowercase() {
                Verdict::Incorrect(IncorrectReason::CaseMismatch)
            } else {
                Verdict::Incorrect(IncorrectReason::WrongAnswer)
            }
        }
        Answer::CaseInsensitive(expected) => {
            if input.to_lowercase() == expected.trim().to_lowercase() {
                Verdict::Correct
            } else {
                Verdict::Incorrect(IncorrectReason::WrongAnswer)
            }
        }
        Answer::Dictionary { target } => {
            if !input.is_empty() && same_letters(input, target) {
                Verdict::NeedsExternalCheck {
                    word: input.to_lowercase(),
                }
            } else {
                Verdict::Incorrect(IncorrectReason::LettersMismatch)
            }
        }
    }
}

/// True when both strings use the same multiset of letters, ignoring case.
#[must_use]
pub fn same_letters(a: &str, b: &str) -> bool {
    letter_bag(a) == letter_bag(b)
}

fn letter_bag(s: &str) -> Vec<char> {
    let mut chars: Vec<char> = s.chars().flat_map(char::to_lowercase).collect();
    chars.sort_unstable();
    chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaseRule;

    fn q(answer: Answer) -> Question {
        Question::new("Topic", "Prompt", answer)
    }

    #[test]
    fn exact_distinguishes_case_mismatch() {
        let question = q(Answer::Exact("CAT".into()));
        assert_eq!(
            validate(&question, "CAT", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        let verdict = validate(&question, "cat", BlankAnswerPolicy::Ignore);
        assert_eq!(verdict, Verdict::Incorrect(IncorrectReason::CaseMismatch));
        assert_eq!(verdict.message(), "case mismatch");
        assert_eq!(
            validate(&question, "dog", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::WrongAnswer)
        );
    }

    #[test]
    fn multi_choice_is_case_sensitive() {
        let question = q(Answer::one_of(["BOOK", "KOBO"], CaseRule::Sensitive));
        assert_eq!(
            validate(&question, "BOOK", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&question, " KOBO ", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&question, "book", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::WrongAnswer)
        );
    }

    #[test]
    fn insensitive_multi_choice_ignores_case() {
        let question = q(Answer::one_of(["dreamed", "dreamt"], CaseRule::Insensitive));
        assert_eq!(
            validate(&question, "Dreamt", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&question, " DREAMED", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&question, "dreams", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::WrongAnswer)
        );
    }

    #[test]
    fn open_accepts_anything_but_blank() {
        let question = q(Answer::Open);
        assert_eq!(
            validate(&question, "x", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        let blank = validate(&question, "   ", BlankAnswerPolicy::Ignore);
        assert_eq!(blank, Verdict::Blank);
        assert_eq!(blank.message(), "enter an answer");
        assert_eq!(
            validate(&question, "", BlankAnswerPolicy::ConsumeAttempt),
            Verdict::Incorrect(IncorrectReason::Blank)
        );
    }

    #[test]
    fn case_insensitive_trims_and_lowercases() {
        let question = q(Answer::CaseInsensitive("Went".into()));
        assert_eq!(
            validate(&question, "  went", BlankAnswerPolicy::Ignore),
            Verdict::Correct
        );
        assert_eq!(
            validate(&question, "goed", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::WrongAnswer)
        );
    }

    #[test]
    fn dictionary_requires_the_given_letters_first() {
        let question = q(Answer::Dictionary {
            target: "STOP".into(),
        });
        assert_eq!(
            validate(&question, "Pots", BlankAnswerPolicy::Ignore),
            Verdict::NeedsExternalCheck {
                word: "pots".into()
            }
        );
        assert_eq!(
            validate(&question, "spot s", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::LettersMismatch)
        );
        assert_eq!(
            validate(&question, "", BlankAnswerPolicy::Ignore),
            Verdict::Incorrect(IncorrectReason::LettersMismatch)
        );
    }

    #[test]
    fn lookup_results_fail_closed() {
        assert_eq!(Verdict::from_lookup(Some(true)), Verdict::Correct);
        assert_eq!(
            Verdict::from_lookup(Some(false)),
            Verdict::Incorrect(IncorrectReason::NotAWord)
        );
        assert_eq!(
            Verdict::from_lookup(None),
            Verdict::Incorrect(IncorrectReason::LookupFailed)
        );
    }

    #[test]
    fn same_letters_ignores_case_and_order() {
        assert!(same_letters("BOOK", "kobo"));
        assert!(!same_letters("BOOK", "BOK"));
    }
}
