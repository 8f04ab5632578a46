//! Final results handed out when a session ends
//!
//! Results are collected question by question as the host advances. The
//! summary is what reporting consumes: who took part, how each question
//! was answered and how many graded questions each participant got right.

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use serde::Serialize;
use web_time::SystemTime;

use crate::{
    content::{ContentId, ItemId, OptionId, Question, ResponseType},
    participant::{self, Participant},
    session::{Session, SessionId},
    tally::{AnswerValue, Completed, Tally},
};

/// Final results of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    /// The question
    pub item: ItemId,
    /// The question text
    pub prompt: String,
    /// How the question was answered
    pub response: ResponseType,
    /// The correct options, empty for ungraded questions
    pub correct: Vec<OptionId>,
    /// Final counts
    pub tally: Tally,
    /// Share of respondents per option
    pub percentages: Vec<(OptionId, u32)>,
}

/// How one participant did over the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantResult {
    /// The participant
    pub participant: Participant,
    /// Questions with a counted answer
    pub answered: usize,
    /// Graded questions answered correctly
    pub correct: usize,
}

/// Everything reporting needs once a session has ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// The session
    pub session: SessionId,
    /// The hosted content
    pub content: ContentId,
    /// When the first item was shown
    pub started_at: Option<SystemTime>,
    /// When the session completed
    pub ended_at: SystemTime,
    /// Number of graded questions presented
    pub graded: usize,
    /// Roster in join order with per-participant results
    pub participants: Vec<ParticipantResult>,
    /// Presented questions in order
    pub questions: Vec<QuestionResult>,
}

/// Whether `value` is exactly the correct answer for `question`
fn is_correct(question: &Question, value: &AnswerValue) -> bool {
    if !question.is_graded() {
        return false;
    }
    let correct = question.correct_options();
    match value {
        AnswerValue::Single(option) => correct.contains(option),
        AnswerValue::Multiple(options) => options.iter().collect::<BTreeSet<_>>() == correct,
        AnswerValue::Text(_) => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Score {
    answered: usize,
    correct: usize,
}

/// Accumulates results while a session runs
#[derive(Debug, Clone, Default)]
pub struct Results {
    started_at: Option<SystemTime>,
    graded: usize,
    scores: HashMap<participant::Id, Score>,
    questions: Vec<QuestionResult>,
}

impl Results {
    /// Marks the moment the first item was shown
    pub fn start(&mut self) {
        self.started_at.get_or_insert_with(SystemTime::now);
    }

    /// Folds in a finished question
    pub fn record(&mut self, completed: Completed) {
        let Completed {
            question,
            tally,
            answers,
        } = completed;

        if question.is_graded() {
            self.graded += 1;
        }
        for (participant, value) in &answers {
            let score = self.scores.entry(*participant).or_default();
            score.answered += 1;
            if is_correct(&question, value) {
                score.correct += 1;
            }
        }

        self.questions.push(QuestionResult {
            item: question.id.clone(),
            prompt: question.prompt.clone(),
            response: question.response,
            correct: question
                .correct_options()
                .into_iter()
                .cloned()
                .collect_vec(),
            percentages: tally.percentages(),
            tally,
        });
    }

    /// Builds the summary for a completed session
    pub fn finish(&self, session: &Session) -> SessionSummary {
        SessionSummary {
            session: session.id(),
            content: session.content_id().clone(),
            started_at: self.started_at,
            ended_at: SystemTime::now(),
            graded: self.graded,
            participants: session
                .participants()
                .iter()
                .map(|participant| {
                    let score = self.scores.get(&participant.id).copied().unwrap_or_default();
                    ParticipantResult {
                        participant: participant.clone(),
                        answered: score.answered,
                        correct: score.correct,
                    }
                })
                .collect_vec(),
            questions: self.questions.clone(),
        }
    }
}
