/*
    This module registers the exercises the grading host can load
*/

mod play_music;

use serde_json::Value;

use crate::derivation::{build_derivation, DerivationRecord};
use crate::error_handling::FormatError;
use crate::grading::{GradingData, GradingResult, Score};
use crate::grammar::Grammar;
use crate::rules::{evaluate, Rule};

pub use play_music::PlayMusic;

// A scaffolded-writing exercise: a grammar of sentences a student can build
// and the rules that grade them.
pub trait Problem: Send + Sync {
    fn name(&self) -> &'static str;

    // The prompt shown above the sentence builder.
    fn statement(&self) -> &'static str;

    // The question the sentence is submitted under.
    fn question(&self) -> &'static str;

    fn grammar(&self) -> &Grammar;

    fn rules(&self) -> &[Rule];

    // Puts the serialized grammar where the rendering layer expects it.
    fn generate(&self, data: &mut GradingData) -> serde_json::Result<()> {
        let cfg = self.grammar().to_json_string()?;
        data.set_param(&format!("{}_cfg", self.question()), cfg);
        Ok(())
    }

    // Grades the submitted sentence and sets the overall score.
    fn grade(&self, data: &mut GradingData) -> GradingResult<()> {
        data.grade_question_parameterized(
            self.question(),
            |submitted| grade_statement(self.grammar(), self.rules(), submitted),
            1,
            None,
        )?;
        data.set_weighted_score_data()
    }
}

// The tokens of a submitted sentence: a list of strings, or one string of
// words separated by spaces.
pub fn submitted_tokens(submitted: &Value) -> Result<Vec<String>, FormatError> {
    match submitted {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| FormatError::malformed("Every part of the sentence must be text"))
            })
            .collect(),
        Value::String(text) => Ok(text.split_whitespace().map(str::to_string).collect()),
        _ => Err(FormatError::malformed("Expected a sentence")),
    }
}

pub fn check_sentence(grammar: &Grammar, rules: &[Rule], tokens: &[String]) -> Result<(bool, Option<String>), FormatError> {
    let record: DerivationRecord = build_derivation(grammar, tokens)?;
    Ok(evaluate(&record, rules).into())
}

fn grade_statement(grammar: &Grammar, rules: &[Rule], submitted: &Value) -> Result<(Score, Option<String>), FormatError> {
    let tokens = submitted_tokens(submitted)?;
    let (accepted, feedback) = check_sentence(grammar, rules, &tokens)?;
    Ok((Score::Correct(accepted), feedback))
}

static PROBLEMS: &[&dyn Problem] = &[&PlayMusic];

pub fn all() -> &'static [&'static dyn Problem] {
    PROBLEMS
}

pub fn lookup(name: &str) -> Option<&'static dyn Problem> {
    PROBLEMS.iter().copied().find(|problem| problem.name() == name)
}
