//! Crate-wide error taxonomy.
//!
//! Every fallible surface in the engine returns one of these variants rather
//! than unwinding. The tags mirror the propagation policy in the design: a
//! `ParserError`/`BinderError` aborts binding, a `ConversionError` during
//! `IGNORE_ERRORS` copy is caught at the row boundary instead of here.

use std::fmt;

use thiserror::Error;

use crate::cast::ConversionError;

/// A source position for parser/binder diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Top-level crate error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parser exception: {message} ({pos})")]
    Parser { message: String, pos: Position },

    #[error("Binder exception: {0}")]
    Binder(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Copy exception: {0}")]
    Copy(String),

    #[error("Runtime exception: {0}")]
    Runtime(String),

    #[error("Internal exception (this is a bug): {0}")]
    Internal(String),

    #[error("IO exception: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Catalog(String),

    #[error("Configuration exception: {0}")]
    Config(#[from] figment::Error),
}

impl Error {
    pub fn parser(message: impl Into<String>, pos: Position) -> Self {
        Error::Parser { message: message.into(), pos }
    }

    pub fn binder(message: impl Into<String>) -> Self {
        Error::Binder(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(message.into())
    }

    pub fn copy(message: impl Into<String>) -> Self {
        Error::Copy(message.into())
    }

    /// Whether this error should be routed through the per-block CSV error
    /// handler rather than aborting the statement outright (§7 propagation
    /// policy).
    pub fn is_ignorable_conversion(&self) -> bool {
        matches!(self, Error::Conversion(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
