use std::fmt::Display;

pub trait ErrorType: std::error::Error + PartialEq {}

// Where a grammar came from: a file path or the name of the problem that
// embeds it. Line 0 means the error is not tied to a single line.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Location {
    pub origin: String,
    pub line: usize
}

impl Location {
    pub fn new(origin: impl Into<String>, line: usize) -> Self {
        Location { origin: origin.into(), line }
    }

    pub fn whole(origin: impl Into<String>) -> Self {
        Location::new(origin, 0)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.origin)
        } else {
            write!(f, "{}:{}", self.origin, self.line)
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\x1b[31;49;1m[{}]\x1b[39;49;1m  {}\x1b[0m", self.location, self.error)
    }
}

impl<T: ErrorType + 'static> std::error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type Errors<T> = Vec<Error<T>>;

// A problem with what the student submitted. These are shown to the student
// as a format message and never count against the score.
#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum FormatError {
    #[error("{}", describe_unplaced(.position, .found))]
    NotDerivable { position: usize, found: Option<String> },
    #[error("Could not find definition for `{0}`")]
    UndefinedNonterminal(String),
    #[error("`{0}` expands to itself")]
    RecursiveNonterminal(String),
    #[error("{0}")]
    Malformed(String),
}

impl ErrorType for FormatError {}

impl FormatError {
    pub fn malformed(message: impl Into<String>) -> Self {
        FormatError::Malformed(message.into())
    }
}

fn describe_unplaced(position: &usize, found: &Option<String>) -> String {
    match found {
        Some(token) => format!("`{}` (word {}) does not fit here", token, position + 1),
        None => "The sentence is incomplete".to_string(),
    }
}

// Joins a batch of located errors into one report, one error per line
pub fn report<T: ErrorType>(errors: &Errors<T>) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}
