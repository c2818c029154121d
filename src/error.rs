use thiserror::Error;

use crate::object::Object;
use crate::token::Token;

/// Scan Error.
///
/// Captures the first problem found while scanning source text.  The scanner keeps
/// scanning after recording it, so callers inspect this slot once scanning is done.
///
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

/// Parse Error.
///
/// Captures a message and the offending token for an error that occurs during the
/// parsing pass.
///
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

/// Resolve Error.
///
/// Captures a static error found by the resolution pass.  Resolution stops at the
/// first one.
///
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

/// Runtime Error.
///
/// Captures an error that occurs during the interpret phase.  Contains a message and
/// the token it was raised at, for the line number.
///
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

/// Unwind.
///
/// The ways statement execution can stop early.  `break`, `continue`, and `return`
/// ride the same Err channel as runtime errors so they unwind recursive evaluation,
/// and each is caught by the construct it targets: loops stop Break and Continue,
/// function calls stop Return.
///
#[derive(Debug, PartialEq)]
pub enum Unwind {
    Error(RuntimeError),
    Return(Object),
    Break,
    Continue,
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Unwind {
        Unwind::Error(error)
    }
}

/// runtime_error!
///
/// Convenience macro to create a Runtime Error.  Clones the token and creates a String.
///
macro_rules! runtime_error {
    ($a:expr,$b:expr) => {
        RuntimeError { token: $a.copy(), message: String::from($b) }
    };
}
pub(crate) use runtime_error;
