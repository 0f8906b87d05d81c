/*
    This module parses the textual grammar format used by problem authors:

        START -> "Play" PLAY
        PLAY -> ARTIST | EPSILON
        EPSILON ->
*/

mod lexer;
mod verifier;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use crate::grammar::*;
use crate::error_handling::*;
use itertools::Itertools;
use lexer::*;
use verifier::verify_rules;
use verifier::IntermediateRuleset;

#[derive(Debug, thiserror::Error)]
pub enum CompileErrorType {
    // A line which should contain a rule does not
    #[error("Expected `->` after nonterminal")]
    MissingArrow,
    // A rule has multiple arrows
    #[error("Unexpected `->` encountered")]
    UnexpectedArrow,
    // The author starts a rule line with something other than a nonterminal
    #[error("Tried to define something other than a nonterminal")]
    MissingNonterminal,
    // There is an unclosed quote
    #[error("Unmatched quotes")]
    UnmatchedQuote,
    #[error("Unexpected character `{0}`")]
    UnexpectedCharacter(char),
    // An undefined token was used
    #[error("Could not find definition for `{0}`")]
    UndefinedNonterminal(String),
    #[error("`{0}` is defined more than once")]
    DuplicateNonterminal(String),
    // The path from the nonterminal back to itself
    #[error("Nonterminal expands to itself: {}", .0.join(" -> "))]
    RecursiveNonterminal(Vec<String>),
    #[error("Grammar has no rules")]
    EmptyGrammar,
    // Somehow a full rewrite was parsed as a base alternative
    // This is a problem with scaffolded, not the grammar
    #[error("Rewrite was not fully split (this is a problem with scaffolded, not the grammar)")]
    UnsplitRewrite,
    // A blank line got too deep into the parser
    // This is a problem with scaffolded, not the grammar
    #[error("Blank line encountered in rule parser (this is a problem with scaffolded, not the grammar)")]
    UnexpectedBlankLine,
    // There was an issue with reading a file
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for CompileErrorType {}

impl PartialEq for CompileErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CompileErrorType::FileError(a), CompileErrorType::FileError(b)) => a.kind() == b.kind(),
            (CompileErrorType::UnexpectedCharacter(a), CompileErrorType::UnexpectedCharacter(b)) => a == b,
            (CompileErrorType::UndefinedNonterminal(a), CompileErrorType::UndefinedNonterminal(b)) => a == b,
            (CompileErrorType::DuplicateNonterminal(a), CompileErrorType::DuplicateNonterminal(b)) => a == b,
            (CompileErrorType::RecursiveNonterminal(a), CompileErrorType::RecursiveNonterminal(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other)
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn io_error(error: std::io::Error, origin: &str) -> CompileError {
    CompileError {
        location: Location::whole(origin),
        error: CompileErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

#[derive(PartialEq, Debug)]
struct Rule {
    symbol: String,
    rewrite: Rewrite,
    location: Location
}

fn parse_alternative(tokens: &[Token]) -> Result<Alternative> {
    tokens.iter().map(|t| match t {
        Token::Arrow => Err(CompileErrorType::UnexpectedArrow),
        Token::Or => Err(CompileErrorType::UnsplitRewrite),
        Token::Nonterminal(s) => Ok(Symbol::Nonterminal(s.clone())),
        Token::Terminal(s) => Ok(Symbol::Terminal(s.clone()))
    }).collect()
}

// `A ->` with nothing after the arrow yields a single empty alternative
fn parse_rewrite(tokens: &[Token]) -> Result<Rewrite> {
    tokens.split(|t| *t == Token::Or).map(parse_alternative).collect()
}

fn parse_line(tokens: &[Token], location: Location) -> Result<Rule> {
    let symbol = match tokens.first() {
        Some(Token::Nonterminal(s)) => Ok(s.clone()),
        Some(_) => Err(CompileErrorType::MissingNonterminal),
        None => Err(CompileErrorType::UnexpectedBlankLine)
    }?;

    if tokens.get(1) != Some(&Token::Arrow) {
        return Err(CompileErrorType::MissingArrow)
    }

    let rewrite = parse_rewrite(&tokens[2..])?;

    Ok(Rule {
        symbol,
        rewrite,
        location
    })
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Rule> {
    lexer::lex_line(line)
        .and_then(|lexed_line| parse_line(&lexed_line, location.clone()))
        .map_err(|error| CompileError { location, error })
}

fn is_rule_line(line: &String) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';') && !line.starts_with('#')
}

// Numbers the lines (from 1) and drops the ones that hold no rule. Read
// errors are kept so they get reported alongside the parse errors.
fn rule_line_nums(lines: impl Iterator<Item = LineResult<String>>) -> impl Iterator<Item = (usize, LineResult<String>)> {
    lines
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_ok_and(is_rule_line) || line.is_err())
        .map(|(num, line)| (num + 1, line))
}

// Generates a rule hashmap from a vector of rules
fn ruleset_from_rules(rules: Vec<Rule>) -> FileResult<HashMap<String, Rewrite>> {
    let rule_count = rules.len();

    let mut duplicates = Vec::new();
    let mut test_ruleset = IntermediateRuleset::with_capacity(rule_count);
    for rule in rules {
        if test_ruleset.contains_key(&rule.symbol) {
            duplicates.push(CompileError {
                location: rule.location,
                error: CompileErrorType::DuplicateNonterminal(rule.symbol)
            });
            continue;
        }
        test_ruleset.insert(rule.symbol, (rule.rewrite, rule.location));
    }

    if !duplicates.is_empty() {
        return Err(duplicates);
    }

    verify_rules(&test_ruleset)?;

    Ok(test_ruleset
        .into_iter()
        .map(|(symbol, (rewrite, _))| (symbol, rewrite))
        .collect())
}

fn grammar_from_rules(rule_list: Vec<Rule>, origin: &str) -> FileResult<Grammar> {
    let Some(first) = rule_list.first() else {
        return Err(vec![CompileError {
            location: Location::whole(origin),
            error: CompileErrorType::EmptyGrammar
        }]);
    };
    let start_symbol = first.symbol.clone();
    let order = rule_list.iter().map(|rule| rule.symbol.clone()).unique().collect_vec();

    let rules = ruleset_from_rules(rule_list)?;

    Ok(Grammar {
        start_symbol,
        rules,
        order
    })
}

fn parse_lines(lines: impl Iterator<Item = LineResult<String>>, origin: &str) -> FileResult<Grammar> {
    let parsed_lines = rule_line_nums(lines).map(|(num, line_res)| {
        line_res.and_then(|line| parse_lex_line(&line, Location::new(origin, num)))
    });

    let (rules, errors): (Vec<_>, Vec<_>) = parsed_lines.partition_result();
    if !errors.is_empty() {
        return Err(errors);
    }

    let grammar = grammar_from_rules(rules, origin)?;
    tracing::debug!(origin, start = %grammar.start_symbol, rules = grammar.rules.len(), "parsed grammar");
    Ok(grammar)
}

pub fn parse_str(source: &str, origin: &str) -> FileResult<Grammar> {
    parse_lines(source.lines().map(|line| Ok(line.to_string())), origin)
}

pub fn parse_file(path: &Path) -> FileResult<Grammar> {
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|e| vec![io_error(e, &origin)])?;
    let lines = std::io::BufReader::new(file)
        .lines()
        .map(|line| line.map_err(|e| io_error(e, &origin)));

    parse_lines(lines, &origin)
}

#[cfg(test)]
mod tests {
    use std::iter::zip;
    use std::path::PathBuf;

    use super::*;

    fn s_nonterminal(text: &str) -> Symbol {
        Symbol::Nonterminal(text.to_string())
    }

    fn s_terminal(text: &str) -> Symbol {
        Symbol::Terminal(text.to_string())
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("grammars").join(name)
    }

    #[test]
    fn parse_normal_alternative() {
        let lines = vec![
            vec![
                Token::Nonterminal("ARTIST".to_string()),
                Token::Nonterminal("PLAY_LOCATION".to_string()),
                Token::Nonterminal("INSTRUMENT".to_string())
            ],
            vec![
                Token::Terminal("Play".to_string()),
                Token::Nonterminal("PLAY".to_string())
            ]
        ];
        let answers = vec![
            vec![
                s_nonterminal("ARTIST"),
                s_nonterminal("PLAY_LOCATION"),
                s_nonterminal("INSTRUMENT")
            ],
            vec![
                s_terminal("Play"),
                s_nonterminal("PLAY")
            ]
        ];

        for (line, answer) in zip(lines, answers) {
            assert_eq!(parse_alternative(&line[..]).unwrap(), answer);
        }
    }

    #[test]
    fn parse_malformed_alternative() {
        assert_eq!(parse_alternative(&[Token::Arrow]), Err(CompileErrorType::UnexpectedArrow));
        assert_eq!(parse_alternative(&[Token::Or]), Err(CompileErrorType::UnsplitRewrite));
    }

    #[test]
    fn parse_normal_line() {
        let text = "PLAY -> ARTIST PLAY_LOCATION INSTRUMENT | EPSILON";
        let lexed = lexer::lex_line(text).unwrap();
        let location = Location::default();

        let answer = Rule {
            symbol: "PLAY".to_string(),
            rewrite: vec![
                vec![
                    s_nonterminal("ARTIST"),
                    s_nonterminal("PLAY_LOCATION"),
                    s_nonterminal("INSTRUMENT")
                ],
                vec![s_nonterminal("EPSILON")]
            ],
            location: location.clone()
        };

        assert_eq!(parse_line(&lexed[..], location), Ok(answer));
    }

    #[test]
    fn parse_empty_line() {
        let lexed = lexer::lex_line("EPSILON ->").unwrap();
        let rule = parse_line(&lexed[..], Location::default()).unwrap();
        assert_eq!(rule.rewrite, vec![Vec::<Symbol>::new()]);
    }

    #[test]
    fn parse_malformed_line() {
        // Blank
        assert_eq!(parse_line(&[], Location::default()), Err(CompileErrorType::UnexpectedBlankLine));

        // Missing arrow
        assert_eq!(parse_line(
            &lexer::lex_line("ARTIST PLAY_LOCATION INSTRUMENT").unwrap()[..],
            Location::default()
        ), Err(CompileErrorType::MissingArrow));

        // Improper definition
        assert_eq!(parse_line(
            &lexer::lex_line("\"Play\" -> PLAY").unwrap()[..],
            Location::default()
        ), Err(CompileErrorType::MissingNonterminal));
        assert_eq!(parse_line(
            &lexer::lex_line("| -> ARTIST").unwrap()[..],
            Location::default()
        ), Err(CompileErrorType::MissingNonterminal));
        assert_eq!(parse_line(
            &lexer::lex_line("-> ARTIST").unwrap()[..],
            Location::default()
        ), Err(CompileErrorType::MissingNonterminal));
    }

    #[test]
    fn parse_normal_file() {
        let example_path = fixture("play_music.cfg");
        let example_parsed = parse_file(&example_path).unwrap();

        let mut rules = HashMap::new();
        rules.insert("START".to_string(), vec![vec![
            s_terminal("Play"),
            s_nonterminal("PLAY")
        ]]);
        rules.insert("PLAY".to_string(), vec![
            vec![
                s_nonterminal("ARTIST"),
                s_nonterminal("PLAY_LOCATION"),
                s_nonterminal("INSTRUMENT")
            ],
            vec![s_nonterminal("EPSILON")]
        ]);
        rules.insert("ARTIST".to_string(), vec![
            vec![s_terminal("Vulfpeck")],
            vec![s_terminal("Janice Kapp Perry")],
            vec![s_terminal("Taylor Swift")]
        ]);
        rules.insert("PLAY_LOCATION".to_string(), vec![
            vec![s_terminal("in church")],
            vec![s_terminal("at the quad")],
            vec![s_terminal("at home")]
        ]);
        rules.insert("INSTRUMENT".to_string(), vec![
            vec![s_terminal("with a trombone")],
            vec![s_terminal("with a violin")],
            vec![s_terminal("with a guitar")]
        ]);
        rules.insert("EPSILON".to_string(), vec![vec![]]);

        assert_eq!(example_parsed, Grammar {
            start_symbol: "START".to_string(),
            rules,
            order: ["START", "PLAY", "ARTIST", "PLAY_LOCATION", "INSTRUMENT", "EPSILON"]
                .map(String::from)
                .to_vec()
        });
    }

    #[test]
    fn parse_malformed_file() {
        let example_path = fixture("malformed.cfg");
        let origin = example_path.display().to_string();
        let example_parsed = parse_file(&example_path).unwrap_err();

        assert_eq!(example_parsed, vec![
            CompileError {
                location: Location::new(origin.clone(), 3),
                error: CompileErrorType::MissingNonterminal
            },
            CompileError {
                location: Location::new(origin, 6),
                error: CompileErrorType::UnexpectedArrow
            }
        ]);
    }

    #[test]
    fn parse_missing_file() {
        let errors = parse_file(&fixture("does_not_exist.cfg")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error, CompileErrorType::FileError(std::io::ErrorKind::NotFound.into()));
    }

    #[test]
    fn parse_duplicate_definition() {
        let errors = parse_str("A -> \"a\"\nA -> \"b\"", "dup").unwrap_err();
        assert_eq!(errors, vec![CompileError {
            location: Location::new("dup", 2),
            error: CompileErrorType::DuplicateNonterminal("A".to_string())
        }]);
    }

    #[test]
    fn parse_empty_source() {
        let errors = parse_str("; nothing here\n\n", "empty").unwrap_err();
        assert_eq!(errors[0].error, CompileErrorType::EmptyGrammar);
    }
}
