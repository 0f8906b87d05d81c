use itertools::Itertools;

use crate::error_handling::FormatError;
use crate::grammar::*;

// A node of the derivation tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(String),
    Branch {
        nonterminal: String,
        index: usize,
        alternative: Alternative,
        children: Vec<Node>
    }
}

impl Node {
    fn push_text<'a>(&'a self, words: &mut Vec<&'a str>) {
        match self {
            Node::Leaf(text) if !text.is_empty() => words.push(text),
            Node::Leaf(_) => {},
            Node::Branch { children, .. } => children.iter().for_each(|c| c.push_text(words))
        }
    }

    pub fn text_of(nodes: &[Node]) -> String {
        let mut words = Vec::new();
        nodes.iter().for_each(|n| n.push_text(&mut words));
        words.join(" ")
    }
}

// A way to match a run of symbols: where it stops and the nodes it produced
type Partial = (usize, Vec<Node>);

pub struct Matcher<'a> {
    grammar: &'a Grammar,
    tokens: &'a [String],
    // Nonterminals being expanded, outermost first
    active: Vec<&'a str>,
    // The furthest position no parse could get past
    furthest: usize
}

impl<'a> Matcher<'a> {
    pub fn new(grammar: &'a Grammar, tokens: &'a [String]) -> Self {
        Matcher { grammar, tokens, active: Vec::new(), furthest: 0 }
    }

    pub fn derive(&mut self) -> Result<Node, FormatError> {
        let grammar = self.grammar;
        let start = grammar.start_symbol.as_str();
        let parses = self.match_nonterminal(start, 0)?;

        for (end, mut nodes) in parses {
            if end == self.tokens.len() {
                tracing::trace!(start, "complete derivation found");
                return nodes.pop().ok_or_else(|| FormatError::UndefinedNonterminal(start.to_string()));
            }
            self.furthest = self.furthest.max(end);
        }

        Err(FormatError::NotDerivable {
            position: self.furthest,
            found: self.tokens.get(self.furthest).cloned()
        })
    }

    // How many tokens from `pos` spell the terminal, if they do
    fn terminal_width(&self, terminal: &str, pos: usize) -> Option<usize> {
        let rest = &self.tokens[pos.min(self.tokens.len())..];
        let terminal = terminal.trim();

        if terminal.is_empty() {
            return Some(0);
        }
        if rest.first().is_some_and(|token| token == terminal) {
            return Some(1);
        }

        let words = terminal.split_whitespace().collect_vec();
        let spelled = words.len() > 1
            && rest.len() >= words.len()
            && rest.iter().zip(&words).all(|(token, word)| token == word);
        spelled.then_some(words.len())
    }

    fn match_symbol(&mut self, symbol: &'a Symbol, pos: usize) -> Result<Vec<Partial>, FormatError> {
        match symbol {
            Symbol::Terminal(text) => match self.terminal_width(text, pos) {
                Some(width) => Ok(vec![(pos + width, vec![Node::Leaf(text.trim().to_string())])]),
                None => {
                    self.furthest = self.furthest.max(pos);
                    Ok(Vec::new())
                }
            },
            Symbol::Nonterminal(name) => self.match_nonterminal(name, pos)
        }
    }

    // Every way the symbols can match from `pos`, in declaration order
    fn match_sequence(&mut self, symbols: &'a [Symbol], pos: usize) -> Result<Vec<Partial>, FormatError> {
        let Some((first, rest)) = symbols.split_first() else {
            return Ok(vec![(pos, Vec::new())]);
        };

        let mut parses = Vec::new();
        for (mid, head) in self.match_symbol(first, pos)? {
            for (end, tail) in self.match_sequence(rest, mid)? {
                parses.push((end, head.iter().cloned().chain(tail).collect()));
            }
        }

        Ok(parses)
    }

    fn match_nonterminal(&mut self, name: &'a str, pos: usize) -> Result<Vec<Partial>, FormatError> {
        if self.active.contains(&name) {
            return Err(FormatError::RecursiveNonterminal(name.to_string()));
        }
        let grammar = self.grammar;
        let rewrite = grammar
            .rewrite(name)
            .ok_or_else(|| FormatError::UndefinedNonterminal(name.to_string()))?;

        self.active.push(name);
        let mut parses = Vec::new();
        for (index, alternative) in rewrite.iter().enumerate() {
            tracing::trace!(nonterminal = name, index, pos, "trying alternative");
            for (end, children) in self.match_sequence(alternative, pos)? {
                parses.push((end, vec![Node::Branch {
                    nonterminal: name.to_string(),
                    index,
                    alternative: alternative.clone(),
                    children
                }]));
            }
        }
        self.active.pop();

        Ok(parses)
    }
}
