use std::{io, path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

use super::problem::Operation;

/// A fatal condition that ends the run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("usage: polybench <variables> <input> <output>, or polybench -v")]
    Usage,
    #[error("cannot open input file {}: {source}", .path.display())]
    OpenInput { path: PathBuf, source: io::Error },
    #[error("cannot create output file {}: {source}", .path.display())]
    CreateOutput { path: PathBuf, source: io::Error },
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
    #[error("out of memory while reading a line")]
    OutOfMemory,
    #[error("input line is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
    #[error("unsupported problem type: '{0}'")]
    UnsupportedProblemType(String),
    #[error("{operation} expects {expected} operand(s), found {found}")]
    ArityMismatch {
        operation: Operation,
        expected: usize,
        found: usize,
    },
    #[error("failed to parse a polynomial '{operand}': {reason}")]
    InvalidOperand { operand: String, reason: String },
}
