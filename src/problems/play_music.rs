use once_cell::sync::Lazy;

use super::Problem;
use crate::grammar::Grammar;
use crate::parser;
use crate::rules::{all, path, Rule};

const GRAMMAR: &str = r#"
    START -> "Play" PLAY
    PLAY -> ARTIST PLAY_LOCATION INSTRUMENT | EPSILON
    ARTIST -> "Vulfpeck" | "Janice Kapp Perry" | "Taylor Swift"
    PLAY_LOCATION -> "in church" | "at the quad" | "at home"
    INSTRUMENT -> "with a trombone" | "with a violin" | "with a guitar"
    EPSILON ->
"#;

static PLAY_MUSIC_GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    match parser::parse_str(GRAMMAR, "play_music") {
        Ok(grammar) => grammar,
        Err(errors) => panic!("play_music grammar is invalid:\n{}", crate::error_handling::report(&errors)),
    }
});

static PLAY_MUSIC_RULES: Lazy<Vec<Rule>> = Lazy::new(|| vec![
    Rule::reject_when(
        "vulfpeck in church",
        all(vec![path("ARTIST", "Vulfpeck"), path("PLAY_LOCATION", "in church")]),
        "Vulfpeck is great, but not in the context of church. consider playing somewhere else.",
    ),
    Rule::reject_when(
        "taylor swift",
        path("ARTIST", "Taylor Swift"),
        "It's best to sing Taylor Swift songs rather than play them. Try again.",
    ),
    Rule::reject_when(
        "vulfpeck on violin",
        all(vec![path("ARTIST", "Vulfpeck"), path("INSTRUMENT", "with a violin")]),
        "Yeah that doesn't really work. You'd better use a different instrument if you want to play Vulfpeck",
    ),
    Rule::reject_when(
        "at home",
        path("PLAY_LOCATION", "at home"),
        "No need to play at home anymore. You've practiced. Go out and play!",
    ),
    Rule::reject_when(
        "janice kapp perry at the quad",
        all(vec![path("ARTIST", "Janice Kapp Perry"), path("PLAY_LOCATION", "at the quad")]),
        "Her music is a bit soft. Not many people will be able to hear it",
    ),
    Rule::praise_when(
        "ultimate combo",
        all(vec![
            path("ARTIST", "Vulfpeck"),
            path("PLAY_LOCATION", "at the quad"),
            path("INSTRUMENT", "with a guitar"),
        ]),
        "Yep. That's the ultimate combo.",
    ),
]);

pub struct PlayMusic;

impl Problem for PlayMusic {
    fn name(&self) -> &'static str {
        "play_music"
    }

    fn statement(&self) -> &'static str {
        "You want to play a song. How will you go about doing so?"
    }

    fn question(&self) -> &'static str {
        "subproblem_definition"
    }

    fn grammar(&self) -> &Grammar {
        &PLAY_MUSIC_GRAMMAR
    }

    fn rules(&self) -> &[Rule] {
        &PLAY_MUSIC_RULES
    }
}
