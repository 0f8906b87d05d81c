use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use crate::grammar::Symbol::Nonterminal;
use super::CompileErrorType::{RecursiveNonterminal, UndefinedNonterminal};
use super::{Alternative, CompileError, CompileErrors, FileResult, Location, Rewrite};

pub type IntermediateRuleset = HashMap<String, (Rewrite, Location)>;

fn nonterminals(alternative: &Alternative) -> impl Iterator<Item = &String> {
    alternative.iter().filter_map(|symbol| match symbol {
        Nonterminal(symbol) => Some(symbol),
        _ => None
    })
}

fn get_alternative_undefined_symbols(alternative: &Alternative, location: &Location, rules: &IntermediateRuleset) -> CompileErrors {
    nonterminals(alternative)
        .filter(|symbol| !rules.contains_key(*symbol))
        .map(|symbol_text| CompileError {
            location: location.to_owned(),
            error: UndefinedNonterminal(symbol_text.to_owned())
        })
        .collect()
}

fn get_rewrite_undefined_symbols(rewrite: &Rewrite, location: &Location, rules: &IntermediateRuleset) -> CompileErrors {
    rewrite.iter()
        .flat_map(|alternative| get_alternative_undefined_symbols(alternative, location, rules))
        .collect()
}

// Rules sorted by the line they were defined on, so errors come out in a
// stable order
fn rules_by_line(rules: &IntermediateRuleset) -> Vec<(&String, &(Rewrite, Location))> {
    rules.iter().sorted_by_key(|(_, (_, location))| location.line).collect()
}

fn get_undefined_symbols(rules: &IntermediateRuleset) -> CompileErrors {
    rules_by_line(rules)
        .into_iter()
        .flat_map(|(_, (rewrite, location))| get_rewrite_undefined_symbols(rewrite, location, rules))
        .collect()
}

// Depth first search keeping the current path. Returns the path of the first
// cycle found, starting and ending with the same nonterminal.
fn find_cycle<'a>(
    symbol: &'a String,
    rules: &'a IntermediateRuleset,
    path: &mut Vec<&'a String>,
    finished: &mut HashSet<&'a String>
) -> Option<Vec<String>> {
    if let Some(start) = path.iter().position(|s| *s == symbol) {
        let mut cycle = path[start..].iter().map(|s| s.to_string()).collect_vec();
        cycle.push(symbol.clone());
        return Some(cycle);
    }
    if finished.contains(symbol) {
        return None;
    }

    path.push(symbol);
    // Undefined nonterminals are reported separately
    if let Some((rewrite, _)) = rules.get(symbol) {
        for next in rewrite.iter().flat_map(nonterminals) {
            if let Some(cycle) = find_cycle(next, rules, path, finished) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    finished.insert(symbol);

    None
}

fn get_recursive_symbols(rules: &IntermediateRuleset) -> CompileErrors {
    let mut finished = HashSet::new();
    let mut errors = Vec::new();

    for (symbol, (_, location)) in rules_by_line(rules) {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(symbol, rules, &mut path, &mut finished) {
            errors.push(CompileError {
                location: location.to_owned(),
                error: RecursiveNonterminal(cycle)
            });
            // One report per grammar is enough to point at the problem
            break;
        }
    }

    errors
}

pub fn verify_rules(rules: &IntermediateRuleset) -> FileResult<()> {
    let mut errors = Vec::new();

    errors.extend(get_undefined_symbols(rules));
    errors.extend(get_recursive_symbols(rules));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
