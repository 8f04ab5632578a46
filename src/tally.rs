//! Live answer aggregation for the current item
//!
//! The [`Aggregator`] only ever knows about one item: whichever is
//! current. Moving to another item resets it, and the finished tally is
//! handed to the session summary.

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    constants::answer_text,
    content::{Item, ItemId, OptionId, Question, ResponseType},
    error::Error,
    participant,
};

/// A submitted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerValue {
    /// One option, for single choice questions and polls
    Single(OptionId),
    /// A non-empty set of options, for multi-select questions
    Multiple(BTreeSet<OptionId>),
    /// Free text, for open-ended questions
    Text(String),
}

/// Aggregated answers for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// The question being tallied
    pub item: ItemId,
    /// Selection count per option, in authored option order
    pub counts: Vec<(OptionId, usize)>,
    /// Number of participants with a counted submission
    pub total: usize,
    /// Submitted texts, for open-ended questions
    pub responses: Vec<String>,
}

impl Tally {
    fn empty(question: &Question) -> Self {
        Self {
            item: question.id.clone(),
            counts: question
                .options
                .iter()
                .map(|o| (o.id.clone(), 0))
                .collect_vec(),
            total: 0,
            responses: Vec::new(),
        }
    }

    /// The count for one option
    pub fn count(&self, option: &OptionId) -> Option<usize> {
        self.counts
            .iter()
            .find(|(id, _)| id == option)
            .map(|(_, count)| *count)
    }

    /// Share of respondents per option, rounded to whole percent
    ///
    /// Every entry is 0 while nobody has answered. Multi-select shares can
    /// add up to more than 100.
    pub fn percentages(&self) -> Vec<(OptionId, u32)> {
        self.counts
            .iter()
            .map(|(id, count)| {
                let percent = if self.total == 0 {
                    0
                } else {
                    (*count as f64 / self.total as f64 * 100.0).round() as u32
                };
                (id.clone(), percent)
            })
            .collect_vec()
    }
}

/// A question's tally together with who answered what
#[derive(Debug, Clone)]
pub struct Completed {
    /// The question body, including correct options
    pub question: Question,
    /// Final counts
    pub tally: Tally,
    /// Each participant's counted answer
    pub answers: HashMap<participant::Id, AnswerValue>,
}

#[derive(Debug, Clone)]
enum Current {
    Nothing,
    Slide,
    Question(Completed),
}

/// Accepts at most one answer per participant for the current question
#[derive(Debug, Clone)]
pub struct Aggregator {
    current: Current,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            current: Current::Nothing,
        }
    }
}

impl Aggregator {
    /// Prepares an empty tally for `item`, dropping the previous one
    pub fn reset(&mut self, item: &Item) {
        self.current = match item {
            Item::Slide(_) => Current::Slide,
            Item::Question(question) => Current::Question(Completed {
                tally: Tally::empty(question),
                question: question.clone(),
                answers: HashMap::new(),
            }),
        };
    }

    /// Removes and returns the current question's results
    pub fn take(&mut self) -> Option<Completed> {
        match std::mem::replace(&mut self.current, Current::Nothing) {
            Current::Question(completed) => Some(completed),
            Current::Nothing | Current::Slide => None,
        }
    }

    /// The live tally, `None` unless a question is current
    pub fn current(&self) -> Option<&Tally> {
        match &self.current {
            Current::Question(completed) => Some(&completed.tally),
            Current::Nothing | Current::Slide => None,
        }
    }

    /// Whether `participant` already has a counted answer
    pub fn has_answered(&self, participant: participant::Id) -> bool {
        match &self.current {
            Current::Question(completed) => completed.answers.contains_key(&participant),
            Current::Nothing | Current::Slide => false,
        }
    }

    /// Counts an answer and returns the updated tally
    ///
    /// # Errors
    ///
    /// * `Error::StaleSubmission` - `item` is not the current question
    /// * `Error::DuplicateSubmission` - the participant already answered
    /// * `Error::InvalidAnswer` - the value does not fit the question
    pub fn submit(
        &mut self,
        participant: participant::Id,
        item: &ItemId,
        value: AnswerValue,
    ) -> Result<Tally, Error> {
        let Current::Question(completed) = &mut self.current else {
            return Err(Error::StaleSubmission);
        };
        if &completed.question.id != item {
            return Err(Error::StaleSubmission);
        }
        if completed.answers.contains_key(&participant) {
            return Err(Error::DuplicateSubmission);
        }

        let value = normalize(&completed.question, value)?;
        let tally = &mut completed.tally;
        match &value {
            AnswerValue::Single(option) => increment(tally, option),
            AnswerValue::Multiple(options) => {
                options.iter().for_each(|option| increment(tally, option));
            }
            AnswerValue::Text(text) => tally.responses.push(text.clone()),
        }
        tally.total += 1;

        completed.answers.insert(participant, value);
        Ok(completed.tally.clone())
    }
}

fn increment(tally: &mut Tally, option: &OptionId) {
    if let Some((_, count)) = tally.counts.iter_mut().find(|(id, _)| id == option) {
        *count += 1;
    }
}

/// Checks an answer's shape against the question, trimming free text
fn normalize(question: &Question, value: AnswerValue) -> Result<AnswerValue, Error> {
    match (question.response, value) {
        (
            ResponseType::SingleChoice | ResponseType::Poll,
            AnswerValue::Single(option),
        ) if question.option(&option).is_some() => Ok(AnswerValue::Single(option)),
        (ResponseType::MultipleChoiceSelect, AnswerValue::Multiple(options))
            if !options.is_empty() && options.iter().all(|o| question.option(o).is_some()) =>
        {
            Ok(AnswerValue::Multiple(options))
        }
        (ResponseType::OpenEnded, AnswerValue::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || text.chars().count() > answer_text::MAX_LENGTH {
                Err(Error::InvalidAnswer)
            } else {
                Ok(AnswerValue::Text(text.to_owned()))
            }
        }
        _ => Err(Error::InvalidAnswer),
    }
}
