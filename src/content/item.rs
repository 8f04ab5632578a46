//! Slides and questions presented during a session
//!
//! Items carry the full authored body, including which options are
//! correct. Anything sent to clients goes through [`ItemView`], which
//! leaves correctness out.

use std::{collections::BTreeSet, time::Duration};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{ItemId, ItemKind, OptionId};
use crate::constants::{question, slide};

type ValidationResult = garde::Result;

/// How a question expects to be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    /// Exactly one option, with correct answers
    SingleChoice,
    /// Any non-empty subset of the options
    MultipleChoiceSelect,
    /// Free text
    OpenEnded,
    /// Exactly one option, without correct answers
    Poll,
}

impl ResponseType {
    /// Whether answers reference options rather than free text
    pub fn is_choice(self) -> bool {
        !matches!(self, Self::OpenEnded)
    }
}

/// One option on a choice-based question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnswerOption {
    /// Stable identifier referenced by submissions
    #[garde(skip)]
    pub id: OptionId,
    /// Text shown to participants
    #[garde(length(chars, max = question::MAX_OPTION_TEXT_LENGTH))]
    pub text: String,
    /// Whether selecting this option is correct (never sent to participants)
    #[garde(skip)]
    #[serde(default)]
    pub correct: bool,
}

/// A display-only slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Slide {
    /// Identifier within the authoring subsystem
    #[garde(skip)]
    pub id: ItemId,
    /// Slide heading
    #[garde(length(chars, max = slide::MAX_TITLE_LENGTH))]
    pub title: String,
    /// Slide content
    #[garde(length(chars, max = slide::MAX_BODY_LENGTH))]
    #[serde(default)]
    pub body: String,
}

/// Validates that a question's time budget is within the configured bounds
fn validate_time_limit(val: &Duration, _ctx: &()) -> ValidationResult {
    if (question::MIN_TIME_LIMIT..=question::MAX_TIME_LIMIT).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "time_limit is outside of the bounds [{},{}]",
            question::MIN_TIME_LIMIT,
            question::MAX_TIME_LIMIT
        )))
    }
}

/// Validates the option list against the question's response type
fn validate_options(
    response: &ResponseType,
) -> impl FnOnce(&Vec<AnswerOption>, &()) -> ValidationResult + '_ {
    move |options, _| {
        if !response.is_choice() {
            return if options.is_empty() {
                Ok(())
            } else {
                Err(garde::Error::new("open-ended questions take no options"))
            };
        }
        if options.is_empty() || options.len() > question::MAX_OPTION_COUNT {
            return Err(garde::Error::new(format!(
                "choice questions need between 1 and {} options",
                question::MAX_OPTION_COUNT
            )));
        }
        if !options.iter().map(|o| &o.id).all_unique() {
            return Err(garde::Error::new("option ids must be unique"));
        }
        if matches!(response, ResponseType::Poll) && options.iter().any(|o| o.correct) {
            return Err(garde::Error::new("polls have no correct options"));
        }
        Ok(())
    }
}

/// A question that accepts answers while it is current
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier within the authoring subsystem
    #[garde(skip)]
    pub id: ItemId,
    /// The question text
    #[garde(length(chars, min = 1, max = question::MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// How the question is answered
    #[garde(skip)]
    pub response: ResponseType,
    /// Options in authored order (empty for open-ended questions)
    #[garde(custom(validate_options(&self.response)), dive)]
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Advisory answering time
    #[garde(custom(validate_time_limit))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,
}

impl Question {
    /// Looks up an option by id
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    /// Ids of the correct options
    pub fn correct_options(&self) -> BTreeSet<&OptionId> {
        self.options
            .iter()
            .filter(|o| o.correct)
            .map(|o| &o.id)
            .collect()
    }

    /// Whether the question has a notion of a correct answer at all
    pub fn is_graded(&self) -> bool {
        matches!(
            self.response,
            ResponseType::SingleChoice | ResponseType::MultipleChoiceSelect
        ) && self.options.iter().any(|o| o.correct)
    }
}

/// A slide or question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, derive_more::From)]
pub enum Item {
    /// Display-only content
    Slide(#[garde(dive)] Slide),
    /// Answerable content
    Question(#[garde(dive)] Question),
}

impl Item {
    /// The item's identifier
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Slide(s) => &s.id,
            Self::Question(q) => &q.id,
        }
    }

    /// Whether this is a slide or a question
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Slide(_) => ItemKind::Slide,
            Self::Question(_) => ItemKind::Question,
        }
    }

    /// Returns the question if this item is one
    pub fn as_question(&self) -> Option<&Question> {
        match self {
            Self::Question(q) => Some(q),
            Self::Slide(_) => None,
        }
    }

    /// The advisory time budget, if the item has one
    pub fn time_limit(&self) -> Option<Duration> {
        self.as_question().map(|q| q.time_limit)
    }

    /// The participant-safe view of this item
    pub fn view(&self) -> ItemView {
        match self {
            Self::Slide(s) => ItemView::Slide {
                id: s.id.clone(),
                title: s.title.clone(),
                body: s.body.clone(),
            },
            Self::Question(q) => ItemView::Question {
                id: q.id.clone(),
                prompt: q.prompt.clone(),
                response: q.response,
                options: q
                    .options
                    .iter()
                    .map(|o| OptionView {
                        id: o.id.clone(),
                        text: o.text.clone(),
                    })
                    .collect_vec(),
                time_limit: q.time_limit,
            },
        }
    }
}

/// An option as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// Option identifier to submit
    pub id: OptionId,
    /// Option text
    pub text: String,
}

/// An item as shown to clients, without correct answers
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemView {
    /// A slide
    Slide {
        /// Slide identifier
        id: ItemId,
        /// Slide heading
        title: String,
        /// Slide content
        body: String,
    },
    /// A question
    Question {
        /// Question identifier to submit against
        id: ItemId,
        /// The question text
        prompt: String,
        /// How to answer
        response: ResponseType,
        /// Options in authored order
        options: Vec<OptionView>,
        /// Advisory answering time
        #[serde_as(as = "serde_with::DurationSeconds<u64>")]
        time_limit: Duration,
    },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn option(id: &str, correct: bool) -> AnswerOption {
        AnswerOption {
            id: id.into(),
            text: format!("Option {id}"),
            correct,
        }
    }

    pub(crate) fn single_choice(id: &str, options: &[&str], correct: &str) -> Question {
        Question {
            id: id.into(),
            prompt: "Pick one".to_string(),
            response: ResponseType::SingleChoice,
            options: options.iter().map(|o| option(o, *o == correct)).collect(),
            time_limit: Duration::from_secs(20),
        }
    }

    pub(crate) fn multi_select(id: &str, options: &[&str], correct: &[&str]) -> Question {
        Question {
            id: id.into(),
            prompt: "Pick any".to_string(),
            response: ResponseType::MultipleChoiceSelect,
            options: options
                .iter()
                .map(|o| option(o, correct.contains(o)))
                .collect(),
            time_limit: Duration::from_secs(20),
        }
    }

    pub(crate) fn open_ended(id: &str) -> Question {
        Question {
            id: id.into(),
            prompt: "Say anything".to_string(),
            response: ResponseType::OpenEnded,
            options: vec![],
            time_limit: Duration::from_secs(30),
        }
    }

    pub(crate) fn slide(id: &str) -> Slide {
        Slide {
            id: id.into(),
            title: "Welcome".to_string(),
            body: "Get ready".to_string(),
        }
    }

    #[test]
    fn test_question_validation() {
        assert!(single_choice("q1", &["A", "B"], "A").validate().is_ok());
        assert!(multi_select("q2", &["A", "B", "C"], &["A", "C"]).validate().is_ok());
        assert!(open_ended("q3").validate().is_ok());
        assert!(slide("s1").validate().is_ok());
    }

    #[test]
    fn test_question_time_limit_bounds() {
        let mut q = single_choice("q1", &["A", "B"], "A");
        q.time_limit = Duration::from_secs(question::MIN_TIME_LIMIT - 1);
        assert!(q.validate().is_err());

        q.time_limit = Duration::from_secs(question::MAX_TIME_LIMIT + 1);
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_choice_question_needs_options() {
        let q = single_choice("q1", &[], "A");
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_choice_question_option_limit() {
        let ids = (0..=question::MAX_OPTION_COUNT)
            .map(|i| i.to_string())
            .collect_vec();
        let refs = ids.iter().map(String::as_str).collect_vec();
        let q = single_choice("q1", &refs, "0");
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_duplicate_option_ids_rejected() {
        let q = single_choice("q1", &["A", "A"], "A");
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_open_ended_rejects_options() {
        let mut q = open_ended("q1");
        q.options.push(option("A", false));
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_poll_rejects_correct_flags() {
        let mut q = single_choice("q1", &["A", "B"], "A");
        q.response = ResponseType::Poll;
        assert!(q.validate().is_err());

        q.options.iter_mut().for_each(|o| o.correct = false);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let mut q = open_ended("q1");
        q.prompt = String::new();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_view_hides_correctness() {
        let item = Item::from(single_choice("q1", &["A", "B"], "A"));
        let json = serde_json::to_string(&item.view()).unwrap();

        assert!(!json.contains("correct"));
        assert!(json.contains("Option A"));
        assert!(json.contains("\"time_limit\":20"));
    }

    #[test]
    fn test_item_accessors() {
        let q = Item::from(single_choice("q1", &["A", "B"], "B"));
        assert_eq!(q.id(), &ItemId::from("q1"));
        assert_eq!(q.kind(), ItemKind::Question);
        assert_eq!(q.time_limit(), Some(Duration::from_secs(20)));

        let s = Item::from(slide("s1"));
        assert_eq!(s.kind(), ItemKind::Slide);
        assert!(s.as_question().is_none());
        assert_eq!(s.time_limit(), None);
    }

    #[test]
    fn test_grading() {
        let q = multi_select("q1", &["A", "B", "C"], &["A", "C"]);
        assert!(q.is_graded());
        assert_eq!(
            q.correct_options(),
            [OptionId::from("A"), OptionId::from("C")].iter().collect()
        );

        assert!(!open_ended("q2").is_graded());
    }
}
