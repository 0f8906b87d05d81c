/*
    This module generates sample sentences from a grammar
*/

use rand::prelude::*;

use crate::grammar::*;
use crate::error_handling::*;

// Verified grammars are acyclic, so no sentence needs more nesting than this
const MAX_DEPTH: usize = 64;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum GenerateErrorType {
    // An undefined nonterminal was used
    #[error("No definition for nonterminal `{0}`")]
    UndefinedNonterminal(String),
    #[error("Expansion of `{0}` nests too deeply")]
    TooDeep(String),
}

impl ErrorType for GenerateErrorType {}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult = Result<Vec<String>, GenerateError>;

// Walks the grammar, picking alternatives at random
struct Generator<'a, R: Rng> {
    grammar: &'a Grammar,
    rng: &'a mut R,
    origin: &'a str,
}

pub fn generate(grammar: &Grammar) -> GenResult {
    generate_with_override(grammar, &grammar.start_symbol)
}

// Generates a sentence in the given grammar starting with the given symbol
pub fn generate_with_override(grammar: &Grammar, start: &str) -> GenResult {
    generate_with_rng(grammar, start, &mut thread_rng())
}

pub fn generate_with_rng<R: Rng>(grammar: &Grammar, start: &str, rng: &mut R) -> GenResult {
    let mut generator = Generator { grammar, rng, origin: start };
    let mut tokens = Vec::new();
    generator.generate_nonterminal(start, 0, &mut tokens)?;
    Ok(tokens)
}

impl<R: Rng> Generator<'_, R> {
    fn error(&self, error: GenerateErrorType) -> GenerateError {
        GenerateError {
            location: Location::whole(self.origin),
            error
        }
    }

    fn generate_nonterminal(&mut self, nonterminal: &str, depth: usize, tokens: &mut Vec<String>) -> Result<(), GenerateError> {
        if depth > MAX_DEPTH {
            return Err(self.error(GenerateErrorType::TooDeep(nonterminal.to_string())));
        }
        let grammar = self.grammar;
        let rewrite = grammar
            .rewrite(nonterminal)
            .ok_or_else(|| self.error(GenerateErrorType::UndefinedNonterminal(nonterminal.to_string())))?;

        let Some(alternative) = rewrite.choose(&mut *self.rng) else {
            return Ok(());
        };

        for symbol in alternative {
            match symbol {
                Symbol::Nonterminal(name) => self.generate_nonterminal(name, depth + 1, tokens)?,
                Symbol::Terminal(text) if text.trim().is_empty() => {},
                Symbol::Terminal(text) => tokens.push(text.trim().to_string()),
            }
        }

        Ok(())
    }
}
