/*
    This module is for storing and describing grammars
*/

use std::collections::HashMap;
use std::str::FromStr;

use itertools::Itertools;
use serde::Serialize;

use crate::parser::{self, CompileErrors};

// The base unit in a grammar rule
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

// The symbols in a single alternative. An empty alternative derives nothing.
pub type Alternative = Vec<Symbol>;

// The alternatives of a rewrite rule, in declaration order
pub type Rewrite = Vec<Alternative>;

#[derive(Debug, PartialEq, Clone)]
pub struct Grammar {
    pub start_symbol: String,
    pub rules: HashMap<String, Rewrite>,
    // Nonterminals in the order they were declared
    pub order: Vec<String>,
}

#[derive(Serialize)]
struct RuleJson<'a> {
    name: &'a str,
    alternatives: &'a Rewrite,
}

#[derive(Serialize)]
struct GrammarJson<'a> {
    start: &'a str,
    rules: Vec<RuleJson<'a>>,
}

impl Grammar {
    pub fn rewrite(&self, nonterminal: &str) -> Option<&Rewrite> {
        self.rules.get(nonterminal)
    }

    // The rules in declaration order, then any missing from `order` by name
    pub fn ordered_rules(&self) -> impl Iterator<Item = (&str, &Rewrite)> + '_ {
        let declared = self
            .order
            .iter()
            .unique()
            .filter_map(|name| self.rules.get(name).map(|rewrite| (name.as_str(), rewrite)));
        let undeclared = self
            .rules
            .iter()
            .filter(|(name, _)| !self.order.contains(name))
            .map(|(name, rewrite)| (name.as_str(), rewrite))
            .sorted_by_key(|(name, _)| *name);
        declared.chain(undeclared)
    }

    // Serializes the grammar for the rendering layer of the host.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&GrammarJson {
            start: &self.start_symbol,
            rules: self
                .ordered_rules()
                .map(|(name, alternatives)| RuleJson { name, alternatives })
                .collect(),
        })
    }

    // The words an alternative always yields, with nonterminals expanded.
    // None when a nonterminal it reaches has a choice, is undefined or loops.
    pub fn terminal_text(&self, alternative: &Alternative) -> Option<String> {
        let mut words = Vec::new();
        self.push_terminal_words(alternative, &mut Vec::new(), &mut words)?;
        Some(words.join(" "))
    }

    fn push_terminal_words<'a>(&'a self, alternative: &'a Alternative, active: &mut Vec<&'a str>, words: &mut Vec<&'a str>) -> Option<()> {
        for symbol in alternative {
            match symbol {
                Symbol::Terminal(t) if t.trim().is_empty() => {},
                Symbol::Terminal(t) => words.push(t.trim()),
                Symbol::Nonterminal(n) => {
                    if active.contains(&n.as_str()) {
                        return None;
                    }
                    let [only] = self.rewrite(n)?.as_slice() else {
                        return None;
                    };
                    active.push(n);
                    self.push_terminal_words(only, active, words)?;
                    active.pop();
                }
            }
        }
        Some(())
    }

    // The text an alternative spells when written out symbol by symbol:
    // terminals bare and nonterminals by name.
    pub fn describe(alternative: &Alternative) -> String {
        alternative
            .iter()
            .map(|symbol| match symbol {
                Symbol::Terminal(t) => t.as_str(),
                Symbol::Nonterminal(n) => n.as_str(),
            })
            .join(" ")
    }
}

impl FromStr for Grammar {
    type Err = CompileErrors;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parser::parse_str(source, "<inline>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        S -> "go" WHERE
        WHERE -> "home" | "out" | E
        E ->
    "#;

    #[test]
    fn rules_keep_declaration_order() {
        let grammar: Grammar = SOURCE.parse().unwrap();
        let names = grammar.ordered_rules().map(|(name, _)| name).collect_vec();
        assert_eq!(names, vec!["S", "WHERE", "E"]);
        assert_eq!(grammar.start_symbol, "S");
    }

    #[test]
    fn rules_missing_from_order_are_kept() {
        let mut grammar: Grammar = SOURCE.parse().unwrap();
        grammar.order = vec!["WHERE".to_string()];

        let names = grammar.ordered_rules().map(|(name, _)| name).collect_vec();
        assert_eq!(names, vec!["WHERE", "E", "S"]);

        let json: serde_json::Value = serde_json::from_str(&grammar.to_json_string().unwrap()).unwrap();
        assert_eq!(json["rules"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn serializes_for_rendering() {
        let grammar: Grammar = SOURCE.parse().unwrap();
        let json: serde_json::Value = serde_json::from_str(&grammar.to_json_string().unwrap()).unwrap();

        assert_eq!(json["start"], "S");
        assert_eq!(json["rules"][0]["name"], "S");
        assert_eq!(json["rules"][0]["alternatives"][0][0]["terminal"], "go");
        assert_eq!(json["rules"][0]["alternatives"][0][1]["nonterminal"], "WHERE");
        assert_eq!(json["rules"][2]["alternatives"][0], serde_json::json!([]));
    }

    #[test]
    fn terminal_text_expands_fixed_nonterminals() {
        let grammar: Grammar = r#"
            S -> "go" WHERE | "go" HOME
            WHERE -> "home" | "out" | E
            HOME -> E "back" "home"
            E ->
        "#.parse().unwrap();
        let rewrite = grammar.rewrite("S").unwrap().clone();

        assert_eq!(grammar.terminal_text(&rewrite[1]), Some("go back home".to_string()));
        assert_eq!(grammar.terminal_text(&rewrite[0]), None);
        assert_eq!(grammar.terminal_text(&grammar.rewrite("E").unwrap()[0]), Some(String::new()));

        let mut looping = grammar.clone();
        looping.rules.insert("E".to_string(), vec![vec![Symbol::Nonterminal("HOME".to_string())]]);
        assert_eq!(looping.terminal_text(&rewrite[1]), None);
    }

    #[test]
    fn describe_alternative() {
        let alternative = vec![
            Symbol::Terminal("at the quad".to_string()),
            Symbol::Nonterminal("INSTRUMENT".to_string()),
        ];
        assert_eq!(Grammar::describe(&alternative), "at the quad INSTRUMENT");
        assert_eq!(Grammar::describe(&Vec::new()), "");
    }
}
