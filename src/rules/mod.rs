/*
    This module evaluates an ordered list of grading rules against a
    derivation record
*/

use std::fmt;

use crate::derivation::DerivationRecord;

// What a single rule decided about a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    // The rule is satisfied, optionally with something encouraging to say
    Pass(Option<String>),
    // The rule is violated; grading stops here
    Fail(String),
}

pub type Check = Box<dyn Fn(&DerivationRecord) -> Outcome + Send + Sync>;

pub struct Rule {
    pub name: String,
    check: Check,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Rule {
    pub fn new(name: impl Into<String>, check: impl Fn(&DerivationRecord) -> Outcome + Send + Sync + 'static) -> Self {
        Rule { name: name.into(), check: Box::new(check) }
    }

    // Fails with `feedback` when `condition` holds, passes silently otherwise.
    pub fn reject_when(name: impl Into<String>, condition: Condition, feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();
        Rule::new(name, move |record| {
            if condition(record) {
                Outcome::Fail(feedback.clone())
            } else {
                Outcome::Pass(None)
            }
        })
    }

    // Passes with `feedback` when `condition` holds, passes silently otherwise.
    pub fn praise_when(name: impl Into<String>, condition: Condition, feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();
        Rule::new(name, move |record| {
            Outcome::Pass(condition(record).then(|| feedback.clone()))
        })
    }

    pub fn check(&self, record: &DerivationRecord) -> Outcome {
        (self.check)(record)
    }
}

pub type Condition = Box<dyn Fn(&DerivationRecord) -> bool + Send + Sync>;

// `non_terminal` took the alternative spelled `literal`.
pub fn path(non_terminal: &str, literal: &str) -> Condition {
    let non_terminal = non_terminal.to_string();
    let literal = literal.to_string();
    Box::new(move |record| record.took_alternative(&non_terminal, &literal))
}

pub fn all(conditions: Vec<Condition>) -> Condition {
    Box::new(move |record| conditions.iter().all(|c| c(record)))
}

pub fn any(conditions: Vec<Condition>) -> Condition {
    Box::new(move |record| conditions.iter().any(|c| c(record)))
}

pub fn not(condition: Condition) -> Condition {
    Box::new(move |record| !condition(record))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub feedback: Option<String>,
}

impl From<Verdict> for (bool, Option<String>) {
    fn from(verdict: Verdict) -> Self {
        (verdict.accepted, verdict.feedback)
    }
}

// Runs the rules in order. The first failing rule decides the verdict and no
// later rule is run. If every rule passes the submission is accepted with the
// last feedback any rule offered.
pub fn evaluate(record: &DerivationRecord, rules: &[Rule]) -> Verdict {
    let mut praise = None;

    for rule in rules {
        match rule.check(record) {
            Outcome::Fail(feedback) => {
                tracing::debug!(rule = %rule.name, "rule failed");
                return Verdict { accepted: false, feedback: Some(feedback) };
            }
            Outcome::Pass(Some(feedback)) => {
                tracing::trace!(rule = %rule.name, "rule passed with feedback");
                praise = Some(feedback);
            }
            Outcome::Pass(None) => {}
        }
    }

    Verdict { accepted: true, feedback: praise }
}
