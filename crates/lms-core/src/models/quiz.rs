// ABOUTME: Validated quiz content (questions with exactly one correct option) and scoring
// ABOUTME: The single encode/decode pair for every pre-test, lesson quiz and final assessment blob
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Quiz content is persisted as a JSON array of questions. It is decoded and
//! validated exactly once when read ([`QuizContent::decode`]) and encoded
//! exactly once when written ([`QuizContent::encode`]); everything in between
//! works with the typed value.

use crate::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Submitted answers: question index → selected option index
pub type Answers = BTreeMap<usize, usize>;

/// Minimum number of options a question must offer
const MIN_OPTIONS_PER_QUESTION: usize = 2;

/// One selectable option of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    /// Option text shown to the learner
    pub text: String,
    /// Whether this is the correct option
    #[serde(default)]
    pub is_correct: bool,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text
    #[serde(alias = "question")]
    pub text: String,
    /// Ordered options
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Index of the correct option
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.is_correct)
    }

    fn validate(&self, index: usize) -> DomainResult<()> {
        let number = index + 1;
        if self.text.trim().is_empty() {
            return Err(DomainError::invalid(format!("Question {number} has no text")));
        }
        if self.options.len() < MIN_OPTIONS_PER_QUESTION {
            return Err(DomainError::invalid(format!(
                "Question {number} needs at least {MIN_OPTIONS_PER_QUESTION} options"
            )));
        }
        if self.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(DomainError::invalid(format!(
                "Question {number} has an option without text"
            )));
        }
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        if correct != 1 {
            return Err(DomainError::invalid(format!(
                "Question {number} must have exactly one correct option (found {correct})"
            )));
        }
        Ok(())
    }
}

/// Validated, non-empty list of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuizContent(Vec<Question>);

impl QuizContent {
    /// Validate a list of questions
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` if the list is empty or any question
    /// breaks the one-correct-option rule
    pub fn new(questions: Vec<Question>) -> DomainResult<Self> {
        if questions.is_empty() {
            return Err(DomainError::invalid("Quiz must contain at least one question"));
        }
        for (index, question) in questions.iter().enumerate() {
            question.validate(index)?;
        }
        Ok(Self(questions))
    }

    /// Decode stored JSON content
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupt` if the JSON is malformed or fails validation
    pub fn decode(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw).map_err(|e| DomainError::corrupt(e.to_string()))
    }

    /// Encode for storage
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupt` if serialization fails
    pub fn encode(&self) -> DomainResult<String> {
        serde_json::to_string(&self.0).map_err(|e| DomainError::corrupt(e.to_string()))
    }

    /// Questions in display order
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.0
    }

    /// Number of questions
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for validated content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Score a submission. Unanswered questions count as wrong.
    #[must_use]
    pub fn score(&self, answers: &Answers) -> ScoreSummary {
        let correct_questions: Vec<usize> = self
            .0
            .iter()
            .enumerate()
            .filter(|(index, question)| {
                matches!(
                    (question.correct_index(), answers.get(index)),
                    (Some(expected), Some(&given)) if expected == given
                )
            })
            .map(|(index, _)| index)
            .collect();

        ScoreSummary {
            score: correct_questions.len() as u32,
            total: self.0.len() as u32,
            correct_questions,
        }
    }
}

impl TryFrom<Vec<Question>> for QuizContent {
    type Error = DomainError;

    fn try_from(questions: Vec<Question>) -> Result<Self, Self::Error> {
        Self::new(questions)
    }
}

impl From<QuizContent> for Vec<Question> {
    fn from(content: QuizContent) -> Self {
        content.0
    }
}

/// Outcome of scoring one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Number of correctly answered questions
    pub score: u32,
    /// Number of questions
    pub total: u32,
    /// Indices of correctly answered questions
    pub correct_questions: Vec<usize>,
}

impl ScoreSummary {
    /// Score as a percentage of the total
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.score) * 100.0 / f64::from(self.total)
    }

    /// Whether the percentage reaches `passing_rate` (0-100).
    ///
    /// Compared in integers so 2/3 against 67 is not subject to float rounding.
    #[must_use]
    pub fn meets(&self, passing_rate: u8) -> bool {
        self.total > 0
            && u64::from(self.score) * 100 >= u64::from(passing_rate) * u64::from(self.total)
    }

    /// Every question answered correctly
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}
