//! Diagnostics (§6's "Diagnostic sink" collaborator, §7's error taxonomy).
//!
//! Library code never panics or exits on these paths — every fallible
//! operation returns `Result<_, CoreError>`, the way the teacher's
//! `ParseError` is threaded through `parser.rs`. [`fatal`] is the thin
//! adapter a caller reaches for when it wants the spec's literal "print a
//! one-line diagnostic and terminate the process" behavior.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// `define` of an existing name with a non-identical body.
    Redefinition(String),
    /// `##` at the start or end of a replacement list.
    DanglingPaste,
    /// Pasting produced a byte sequence the tokenizer couldn't consume
    /// whole as a single token.
    InvalidPaste(String),
    /// Missing expected `(`, `,`, or `)`, or over-/under-nesting, while
    /// reading a macro invocation's arguments.
    MalformedInvocation(String),
    /// End-of-list encountered inside an argument.
    TruncatedInvocation,
    /// The tokenizer found a byte it doesn't recognize.
    UnexpectedChar(usize, char),
    /// A `#` in a replacement list with no parameter placeholder after it.
    IncompletePlaceholder,
    /// A parameter-placeholder index out of range of the macro's params.
    InvalidArgumentNumber,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Redefinition(name) => {
                write!(f, "Redefinition of macro '{name}' with different substitution.")
            }
            CoreError::DanglingPaste => {
                write!(f, "'##' cannot appear at either end of a macro expansion.")
            }
            CoreError::InvalidPaste(text) => {
                write!(f, "Invalid token resulting from pasting: '{text}'.")
            }
            CoreError::MalformedInvocation(msg) => write!(f, "Malformed macro invocation: {msg}"),
            CoreError::TruncatedInvocation => write!(f, "Unexpected end of input in expansion."),
            CoreError::UnexpectedChar(pos, ch) => {
                write!(f, "Unexpected character '{ch}' at byte offset {pos}.")
            }
            CoreError::IncompletePlaceholder => {
                write!(f, "'#' in macro body must be followed by a parameter.")
            }
            CoreError::InvalidArgumentNumber => {
                write!(f, "Parameter placeholder refers to a nonexistent argument.")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Print `err` to stderr and terminate the process — the spec's literal
/// "all core errors are fatal" behavior. The library itself never calls
/// this; it's here for a binary or test harness that wants it.
pub fn fatal(err: &CoreError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1)
}
