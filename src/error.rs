use thiserror::Error;

/// Errors reported by automaton and number-system operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed automaton description or regular expression
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Coordinates sharing a label disagree on their alphabet
    #[error("alignment error: {0}")]
    Alignment(String),
    /// A value outside its coordinate alphabet, or a symbol space too large
    #[error("encoding error: {0}")]
    Encoding(String),
    /// Coordinates are unlabeled, or a label is not a free coordinate
    #[error("unbound coordinate: {0}")]
    Unbound(String),
    /// Negative constants, division by zero
    #[error("arithmetic domain error: {0}")]
    ArithmeticDomain(String),
    #[error("number system {0} is not defined")]
    UndefinedNumberSystem(String),
    /// Operation not applicable to the given automaton or operands
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
