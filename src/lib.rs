/*
    Grammar-path grading for scaffolded-writing exercises. A problem declares
    a small grammar of sentences. A submission is matched against it with
    `derivation::build_derivation`, which records the alternative each
    nonterminal took, and then graded by running `rules::evaluate` over that
    record.
*/

pub mod derivation;
pub mod error_handling;
pub mod generator;
pub mod grading;
pub mod grammar;
pub mod parser;
pub mod problems;
pub mod rules;
pub mod util;
