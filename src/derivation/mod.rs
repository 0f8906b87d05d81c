/*
    This module matches a submitted token sequence against a grammar and
    records which alternative each nonterminal took
*/

mod matcher;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error_handling::FormatError;
use crate::grammar::*;
use matcher::{Matcher, Node};

// The alternative one occurrence of a nonterminal matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    // Position of the alternative in the rule, in declaration order
    pub index: usize,
    pub alternative: Alternative,
    // The terminal text the alternative yields, words joined by single spaces
    pub text: String,
}

impl Choice {
    // Either the text it produced or the way the alternative is written
    fn is(&self, literal: &str) -> bool {
        let literal = literal.trim();
        self.text == literal || Grammar::describe(&self.alternative) == literal
    }
}

// Which alternative every reached nonterminal took for one submission.
// A nonterminal that appears more than once in the derivation keeps one
// `Choice` per occurrence, left to right. Nonterminals the derivation never
// reached are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationRecord {
    tokens: Vec<String>,
    choices: BTreeMap<String, Vec<Choice>>,
}

impl DerivationRecord {
    // True if `non_terminal` matched the alternative spelled `literal`,
    // either by the text it produced or by its written symbols.
    pub fn took_alternative(&self, non_terminal: &str, literal: &str) -> bool {
        self.choices(non_terminal).iter().any(|choice| choice.is(literal))
    }

    // True if the derivation expanded `non_terminal` at all, even to nothing.
    pub fn reached(&self, non_terminal: &str) -> bool {
        self.choices.contains_key(non_terminal)
    }

    pub fn choices(&self, non_terminal: &str) -> &[Choice] {
        self.choices.get(non_terminal).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn yield_text(&self) -> String {
        self.tokens.join(" ")
    }

    fn record(&mut self, node: Node) {
        if let Node::Branch { nonterminal, index, alternative, children } = node {
            let text = Node::text_of(&children);
            self.choices.entry(nonterminal).or_default().push(Choice { index, alternative, text });
            for child in children {
                self.record(child);
            }
        }
    }
}

// Derives `tokens` from the start symbol of `grammar`.
// Alternatives are tried in declaration order with full backtracking and the
// first complete derivation wins. A terminal matches one token equal to it or
// a run of tokens whose words spell it. Blank tokens are ignored.
pub fn build_derivation<S: AsRef<str>>(grammar: &Grammar, tokens: &[S]) -> Result<DerivationRecord, FormatError> {
    let tokens: Vec<String> = tokens
        .iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let mut matcher = Matcher::new(grammar, &tokens);
    let tree = matcher.derive()?;

    let mut record = DerivationRecord { tokens, choices: BTreeMap::new() };
    record.record(tree);

    tracing::debug!(
        sentence = %record.yield_text(),
        nonterminals = record.choices.len(),
        "built derivation"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::generator;

    static PLAY_MUSIC: Lazy<Grammar> = Lazy::new(|| {
        r#"
            START -> "Play" PLAY
            PLAY -> ARTIST PLAY_LOCATION INSTRUMENT | EPSILON
            ARTIST -> "Vulfpeck" | "Janice Kapp Perry" | "Taylor Swift"
            PLAY_LOCATION -> "in church" | "at the quad" | "at home"
            INSTRUMENT -> "with a trombone" | "with a violin" | "with a guitar"
            EPSILON ->
        "#.parse().unwrap()
    });

    #[test]
    fn records_every_choice() {
        let record = build_derivation(&PLAY_MUSIC, &["Play", "Vulfpeck", "at the quad", "with a guitar"]).unwrap();

        assert!(record.took_alternative("ARTIST", "Vulfpeck"));
        assert!(record.took_alternative("PLAY_LOCATION", "at the quad"));
        assert!(record.took_alternative("INSTRUMENT", "with a guitar"));
        assert!(!record.took_alternative("ARTIST", "Taylor Swift"));
        assert_eq!(record.choices("ARTIST")[0].index, 0);
        assert_eq!(record.choices("INSTRUMENT")[0].index, 2);
        assert_eq!(record.choices("PLAY")[0].text, "Vulfpeck at the quad with a guitar");
        assert!(!record.reached("EPSILON"));
    }

    #[test]
    fn split_words_match_phrases() {
        let tokens = ["Play", "Janice", "Kapp", "Perry", "in", "church", "with", "a", "violin"];
        let record = build_derivation(&PLAY_MUSIC, &tokens[..]).unwrap();

        assert!(record.took_alternative("ARTIST", "Janice Kapp Perry"));
        assert!(record.took_alternative("PLAY_LOCATION", "in church"));
        assert!(record.took_alternative("INSTRUMENT", "with a violin"));
    }

    #[test]
    fn empty_branch_is_reached_but_matches_nothing_else() {
        let record = build_derivation(&PLAY_MUSIC, &["Play"]).unwrap();

        assert!(record.reached("PLAY"));
        assert!(record.reached("EPSILON"));
        assert!(!record.reached("ARTIST"));
        assert!(record.took_alternative("PLAY", "EPSILON"));
        assert!(record.took_alternative("EPSILON", ""));
        assert!(!record.took_alternative("ARTIST", "Vulfpeck"));
        assert!(record.choices("ARTIST").is_empty());
    }

    #[test]
    fn blank_tokens_are_ignored() {
        let record = build_derivation(&PLAY_MUSIC, &["  Play ", "", "Taylor Swift", "at home", " with a trombone"]).unwrap();
        assert_eq!(record.tokens().len(), 4);
        assert!(record.took_alternative("ARTIST", "Taylor Swift"));
    }

    #[test]
    fn trailing_token_is_reported() {
        let err = build_derivation(&PLAY_MUSIC, &["Play", "Vulfpeck", "in church", "with a guitar", "loudly"]).unwrap_err();
        assert_eq!(err, FormatError::NotDerivable { position: 4, found: Some("loudly".to_string()) });
    }

    #[test]
    fn misplaced_token_is_reported() {
        let err = build_derivation(&PLAY_MUSIC, &["Play", "in church", "Vulfpeck", "with a guitar"]).unwrap_err();
        assert_eq!(err, FormatError::NotDerivable { position: 1, found: Some("in church".to_string()) });
    }

    #[test]
    fn incomplete_sentence_is_reported() {
        let err = build_derivation(&PLAY_MUSIC, &["Play", "Vulfpeck"]).unwrap_err();
        assert_eq!(err, FormatError::NotDerivable { position: 2, found: None });

        let err = build_derivation::<&str>(&PLAY_MUSIC, &[]).unwrap_err();
        assert_eq!(err, FormatError::NotDerivable { position: 0, found: None });
    }

    #[test]
    fn first_declared_alternative_wins() {
        let grammar: Grammar = r#"
            S -> A "c" | "a" B
            A -> "a b" | "a"
            B -> "b c"
        "#.parse().unwrap();

        let record = build_derivation(&grammar, &["a", "b", "c"]).unwrap();
        assert!(record.took_alternative("A", "a b"));
        assert!(!record.reached("B"));
    }

    #[test]
    fn backtracks_into_later_alternatives() {
        let grammar: Grammar = r#"
            S -> A "b" "c"
            A -> "a b" | "a"
        "#.parse().unwrap();

        let record = build_derivation(&grammar, &["a", "b", "c"]).unwrap();
        assert_eq!(record.choices("A")[0].index, 1);
    }

    #[test]
    fn repeated_nonterminal_keeps_each_occurrence() {
        let grammar: Grammar = r#"
            S -> COLOR "and" COLOR
            COLOR -> "red" | "blue"
        "#.parse().unwrap();

        let record = build_derivation(&grammar, &["blue", "and", "red"]).unwrap();
        let indices: Vec<usize> = record.choices("COLOR").iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 0]);
        assert!(record.took_alternative("COLOR", "red"));
        assert!(record.took_alternative("COLOR", "blue"));
    }

    #[test]
    fn unverified_recursion_is_an_error() {
        let mut grammar = (*PLAY_MUSIC).clone();
        grammar.rules.insert("EPSILON".to_string(), vec![vec![Symbol::Nonterminal("PLAY".to_string())]]);

        let err = build_derivation(&grammar, &["Play", "Vulfpeck"]).unwrap_err();
        assert!(matches!(err, FormatError::RecursiveNonterminal(_)));
    }

    #[test]
    fn unverified_undefined_is_an_error() {
        let mut grammar = (*PLAY_MUSIC).clone();
        grammar.rules.remove("INSTRUMENT");

        let err = build_derivation(&grammar, &["Play", "Vulfpeck", "in church", "with a guitar"]).unwrap_err();
        assert_eq!(err, FormatError::UndefinedNonterminal("INSTRUMENT".to_string()));
    }

    proptest! {
        #[test]
        fn generated_sentences_derive_deterministically(seed in any::<u64>()) {
            let tokens = generator::generate_with_rng(&PLAY_MUSIC, "START", &mut StdRng::seed_from_u64(seed)).unwrap();
            let first = build_derivation(&PLAY_MUSIC, &tokens[..]).unwrap();
            let second = build_derivation(&PLAY_MUSIC, &tokens[..]).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
