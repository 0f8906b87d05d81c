/*
    Small helpers shared by exercise authors: answer tokenizing, searching and
    binary-string shorthand.
*/

use std::collections::BTreeSet;

use itertools::{Either, Itertools};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error_handling::FormatError;

// Largest integer the grading host can represent exactly.
pub const PL_INTEGER_LIMIT: i128 = (1 << 53) - 1;

static SHORTHAND_PIECE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([01])\^\{(\d+)\}|[01]").expect("shorthand pattern is valid")
});

// Lowest value in `[lo, hi)` for which `condition` holds, assuming it is
// monotone. When it never holds in the range, `hi` itself is tried last.
pub fn binary_search(mut lo: i64, mut hi: i64, condition: impl Fn(i64) -> bool) -> Option<i64> {
    assert!(lo <= hi, "binary_search called with lo > hi");

    while lo < hi {
        // Floor of the mean without overflowing on wide ranges
        let mid = (lo & hi) + ((lo ^ hi) >> 1);
        if condition(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    condition(lo).then_some(lo)
}

fn checked_pow(base: i64, exponent: i64) -> Option<i64> {
    u32::try_from(exponent).ok().and_then(|e| base.checked_pow(e))
}

// True if `num == base^x` for some integer `x >= 0`.
pub fn is_power_of_base(num: i64, base: i64) -> Result<bool, FormatError> {
    // Overflow only happens once the power is already past `num`
    let at_least = |x| checked_pow(base, x).map_or(true, |p| p >= num);
    binary_search(0, num.max(0), at_least)
        .map(|x| checked_pow(base, x) == Some(num))
        .ok_or_else(|| FormatError::malformed(format!("Binary search for {}^x = {} failed", base, num)))
}

// True if `num == x^power` for some integer `x >= 0`.
pub fn is_perfect_power(num: i64, power: i64) -> Result<bool, FormatError> {
    let at_least = |x| checked_pow(x, power).map_or(true, |p| p >= num);
    binary_search(0, num.max(0), at_least)
        .map(|x| checked_pow(x, power) == Some(num))
        .ok_or_else(|| FormatError::malformed(format!("Binary search for x^{} = {} failed", power, num)))
}

// Expands shorthand like `0^{3}1` into `0001`. `e` stands for the empty
// string.
pub fn form_string_from_shorthand(shorthand: &str) -> Result<String, FormatError> {
    if shorthand == "e" {
        return Ok(String::new());
    }

    let invalid = || FormatError::malformed(format!("{} is not valid shorthand for a binary string", shorthand));

    let mut expanded = String::new();
    let mut covered = 0;
    for captures in SHORTHAND_PIECE.captures_iter(shorthand) {
        let whole = captures.get(0).ok_or_else(invalid)?;
        // Anything skipped between matches is not shorthand
        if whole.start() != covered {
            return Err(invalid());
        }
        covered = whole.end();

        match (captures.get(1), captures.get(2)) {
            (Some(digit), Some(count)) => {
                let count: usize = count.as_str().parse().map_err(|_| invalid())?;
                expanded.push_str(&digit.as_str().repeat(count));
            }
            _ => expanded.push_str(whole.as_str()),
        }
    }

    if covered == 0 || covered != shorthand.len() {
        return Err(invalid());
    }

    Ok(expanded)
}

pub fn integer_is_outside_pl_limit(number: i128) -> bool {
    !(-PL_INTEGER_LIMIT..=PL_INTEGER_LIMIT).contains(&number)
}

// Removes all spaces, trims commas from the ends and splits on every comma
// that is not closed off by a `)` before the next `(`.
pub fn tokenize_string(string: &str) -> Vec<String> {
    let compact: String = string.chars().filter(|&c| c != ' ').collect();
    let compact = compact.trim_matches(',');

    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in compact.char_indices() {
        if c != ',' {
            continue;
        }
        let rest = &compact[i + 1..];
        let inside = rest.find(['(', ')']).is_some_and(|j| rest[j..].starts_with(')'));
        if !inside {
            tokens.push(compact[start..i].to_string());
            start = i + 1;
        }
    }
    tokens.push(compact[start..].to_string());

    tokens
}

// Tokenizes an answer that must not be written as a set.
pub fn tokenize_string_without_set(student_answer: &str) -> Result<Vec<String>, FormatError> {
    if student_answer.starts_with('{') || student_answer.ends_with('}') {
        return Err(FormatError::malformed("This input field is not a set, so it does not require curly braces"));
    }
    Ok(tokenize_string(student_answer))
}

// Tokenizes an answer written as a set, `{a, b}` or `∅`.
pub fn tokenize_string_set(string: &str) -> Result<Vec<String>, FormatError> {
    let string = match string.trim() {
        "∅" => "{}",
        s => s,
    };
    let inner = string
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| FormatError::malformed("Make sure to format your answer with curly braces to denote a set"))?;

    Ok(tokenize_string(inner))
}

// Whether an expected answer is written as a set.
pub fn is_set_answer(answer: &str) -> bool {
    (answer.starts_with('{') && answer.ends_with('}')) || answer == "∅"
}

// Tokens of an answer as a set, using set syntax when `as_set` is true.
pub fn answer_token_set(answer: &str, as_set: bool) -> Result<BTreeSet<String>, FormatError> {
    let tokens = if as_set {
        tokenize_string_set(answer)?
    } else {
        tokenize_string_without_set(answer)?
    };
    Ok(tokens.into_iter().collect())
}

// All subsets with sizes in `min_size..=max_size`, smallest first.
// `max_size` defaults to the number of items.
pub fn sized_powerset<T: Clone>(items: &[T], min_size: usize, max_size: Option<usize>) -> Result<Vec<Vec<T>>, FormatError> {
    let max_size = match max_size {
        None => items.len(),
        Some(max) if max > items.len() => {
            return Err(FormatError::malformed(format!(
                "max_size parameter {} is greater than the length of the input iterable",
                max
            )))
        }
        Some(max) => max,
    };

    Ok((min_size..=max_size)
        .flat_map(|size| items.iter().cloned().combinations(size))
        .collect())
}

// Every string over `alphabet` with length in `lower_bound..=n`.
pub fn strings_of_length_at_most_n<'a>(lower_bound: usize, n: usize, alphabet: &'a [char]) -> impl Iterator<Item = String> + 'a {
    (lower_bound..=n).flat_map(move |length| {
        if length == 0 {
            return Either::Left(std::iter::once(String::new()));
        }
        Either::Right(
            std::iter::repeat(alphabet.iter())
                .take(length)
                .multi_cartesian_product()
                .map(|chars| chars.into_iter().collect::<String>())
        )
    })
}

pub fn replace_empty(x: &str) -> &str {
    if x.is_empty() { "ε" } else { x }
}

pub fn float_equals(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

pub const FLOAT_EPSILON: f64 = 0.0001;
