/*
    This module holds the grading host's data record and the operations
    exercises use to fill it in
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error_handling::FormatError;
use crate::util;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum GradingError {
    #[error("Unescaped student input should not be present in the feedback for {0}.")]
    UnescapedFeedback(String),
    #[error("Student answer for {0} not present in submitted answers.")]
    MissingSubmittedAnswer(String),
    #[error("Partial score for {0} not present in partial scores.")]
    MissingPartialScore(String),
    #[error("Question {0} is not present in the partial scores dictionary")]
    MissingQuestion(String),
    #[error("No correct answer recorded for {0}")]
    MissingCorrectAnswer(String),
    #[error("No weighted partial scores to average")]
    NoWeightedScores,
}

pub type GradingResult<T> = Result<T, GradingError>;

// What a grade function decided: right/wrong or a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Correct(bool),
    Partial(f64),
}

impl Score {
    pub fn value(self) -> f64 {
        match self {
            Score::Correct(true) => 1.0,
            Score::Correct(false) => 0.0,
            Score::Partial(score) => {
                assert!((0.0..=1.0).contains(&score), "partial score {} is outside [0, 1]", score);
                score
            }
        }
    }
}

impl From<bool> for Score {
    fn from(correct: bool) -> Self {
        Score::Correct(correct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialScore {
    // None hides the badge next to the input
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

// The record the grading host hands to `generate` and `grade` and reads back
// afterwards. Fields the host sends that are not modelled here are kept as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingData {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub correct_answers: Map<String, Value>,
    #[serde(default)]
    pub submitted_answers: Map<String, Value>,
    #[serde(default)]
    pub format_errors: BTreeMap<String, String>,
    #[serde(default)]
    pub partial_scores: BTreeMap<String, PartialScore>,
    #[serde(default)]
    pub feedback: BTreeMap<String, String>,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Escapes text for display in the host's HTML pages.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl GradingData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn submitted_answer(&self, question: &str) -> Option<&Value> {
        self.submitted_answers.get(question)
    }

    pub fn partial_score(&self, question: &str) -> Option<f64> {
        self.partial_scores.get(question).and_then(|part| part.score)
    }

    pub fn question_weight(&self, question: &str) -> Option<u32> {
        self.partial_scores.get(question).and_then(|part| part.weight)
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) {
        self.params.insert(name.to_string(), value.into());
    }

    pub fn set_correct_answer(&mut self, question: &str, value: impl Into<Value>) {
        self.correct_answers.insert(question.to_string(), value.into());
    }

    pub fn set_feedback(&mut self, field: &str, feedback: impl Into<String>) {
        self.feedback.insert(field.to_string(), feedback.into());
    }

    // Missing answers and format errors are reported to the student, not returned
    pub fn grade_question_parameterized<F>(
        &mut self,
        question: &str,
        grade: F,
        weight: u32,
        feedback_field: Option<&str>,
    ) -> GradingResult<()>
    where
        F: FnOnce(&Value) -> Result<(Score, Option<String>), FormatError>,
    {
        self.partial_scores.insert(question.to_string(), PartialScore {
            score: Some(0.0),
            weight: Some(weight),
            feedback: None,
        });

        let Some(submitted) = self.submitted_answers.get(question).cloned() else {
            tracing::debug!(question, "no answer submitted");
            self.format_errors.insert(question.to_string(), "No answer was submitted".to_string());
            return Ok(());
        };

        let (score, feedback) = match grade(&submitted) {
            Ok(graded) => graded,
            Err(err) => {
                tracing::debug!(question, error = %err, "format error");
                self.format_errors.insert(question.to_string(), escape_html(&err.to_string()));
                return Ok(());
            }
        };

        let score = score.value();
        tracing::debug!(question, score, "graded question");

        let Some(part) = self.partial_scores.get_mut(question) else {
            return Ok(());
        };
        part.score = Some(score);

        let Some(feedback) = feedback.filter(|f| !f.is_empty()) else {
            return Ok(());
        };

        if let Value::String(raw) = &submitted {
            let has_markup = raw.contains('<') && raw.contains('>');
            if has_markup && feedback.contains(raw.as_str()) {
                return Err(GradingError::UnescapedFeedback(question.to_string()));
            }
        }

        part.feedback = Some(feedback.clone());
        self.set_feedback(feedback_field.unwrap_or(question), feedback);
        Ok(())
    }

    // Grades `question` by comparing the set of tokens submitted with the set
    // in `expected` (the recorded correct answer when not given).
    pub fn grade_question_tokenized(&mut self, question: &str, expected: Option<&str>, weight: u32) -> GradingResult<()> {
        let expected = match expected {
            Some(expected) => expected.to_string(),
            None => self
                .correct_answers
                .get(question)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| GradingError::MissingCorrectAnswer(question.to_string()))?,
        };
        let as_set = util::is_set_answer(&expected);

        self.grade_question_parameterized(
            question,
            |submitted| {
                let submitted = submitted
                    .as_str()
                    .ok_or_else(|| FormatError::malformed("Expected a text answer"))?;
                let matches = util::answer_token_set(submitted, as_set)? == util::answer_token_set(&expected, as_set)?;
                Ok((Score::Correct(matches), None))
            },
            weight,
            None,
        )
    }

    // Sets feedback on `field` from the answers named in `inputs`, which are
    // passed to `feedback` in the same order. Call after grading them.
    // Hiding partial scores removes the per-input badges.
    pub fn set_holistic_feedback<F>(
        &mut self,
        field: &str,
        inputs: &[&str],
        feedback: F,
        hide_partial_scores: bool,
    ) -> GradingResult<()>
    where
        F: FnOnce(&[&Value]) -> Option<String>,
    {
        for &input in inputs {
            if !self.submitted_answers.contains_key(input) {
                return Err(GradingError::MissingSubmittedAnswer(input.to_string()));
            }
            if !self.partial_scores.contains_key(input) {
                return Err(GradingError::MissingPartialScore(input.to_string()));
            }
        }

        let answers: Vec<&Value> = inputs.iter().filter_map(|&input| self.submitted_answers.get(input)).collect();
        if let Some(content) = feedback(&answers).filter(|f| !f.is_empty()) {
            self.set_feedback(field, content);
        }

        if hide_partial_scores {
            for input in inputs {
                self.partial_scores.remove(*input);
            }
        }

        Ok(())
    }

    pub fn remove_partial_credit_display(&mut self, question: &str) -> GradingResult<()> {
        let part = self
            .partial_scores
            .get_mut(question)
            .ok_or_else(|| GradingError::MissingQuestion(question.to_string()))?;
        *part = PartialScore { score: None, weight: None, feedback: None };
        Ok(())
    }

    // Sets the main score to the weighted average of the partial scores.
    // Hidden partial scores do not take part.
    pub fn set_weighted_score_data(&mut self) -> GradingResult<()> {
        let (total, weights) = self
            .partial_scores
            .values()
            .filter_map(|part| part.score.map(|score| (score, f64::from(part.weight.unwrap_or(1)))))
            .fold((0.0, 0.0), |(total, weights), (score, weight)| (total + score * weight, weights + weight));

        if weights == 0.0 {
            return Err(GradingError::NoWeightedScores);
        }

        self.score = (total / weights).clamp(0.0, 1.0);
        tracing::debug!(score = self.score, "set weighted score");
        Ok(())
    }

    // Full marks only when every partial score is correct.
    pub fn set_all_or_nothing_score_data(&mut self) {
        self.score = if self.all_questions_correct() { 1.0 } else { 0.0 };
    }

    pub fn all_questions_correct(&self) -> bool {
        !self.partial_scores.is_empty()
            && self.partial_scores.values().all(|part| part.score == Some(1.0))
    }
}
