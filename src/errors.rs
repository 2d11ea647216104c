//! sqlplot error handling.
//!
//! Every fatal condition of a document run is an [`SpError`]. The variants
//! follow the error taxonomy of the engine:
//!
//! - **Query**: the backend rejected a statement or query.
//! - **Shape**: a result does not have the shape a directive needs (missing
//!   `x`/`y` column, missing group column, wrong row count, malformed header).
//! - **Reformat**: the `REFORMAT(...)` clause could not be parsed.
//! - **Connect** / **Import**: the external collaborators failed.
//!
//! Soft conditions (NULL coordinates, unmatched RANGE names, unknown keywords)
//! are never errors; they are logged through `tracing` and processing continues.
//!
//! The engine wraps any error raised while handling a directive into
//! [`SpError::Directive`], which carries the document source and a label on the
//! offending comment line so `miette` can render it in context.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = SpError> = std::result::Result<T, E>;

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum SpError {
    #[error("SQL failed: {message}")]
    #[diagnostic(code(sqlplot::query), help("while executing: {query}"))]
    Query { query: String, message: String },

    #[error("{directive} failed: {message}")]
    #[diagnostic(code(sqlplot::shape))]
    Shape { directive: String, message: String },

    #[error("invalid REFORMAT clause: {message}")]
    #[diagnostic(
        code(sqlplot::reformat),
        help("see the REFORMAT keys: escape, round, precision, width, digits, group, min, max, col, row")
    )]
    Reformat { message: String },

    #[error("could not connect to database '{conninfo}': {message}")]
    #[diagnostic(code(sqlplot::connect))]
    Connect { conninfo: String, message: String },

    #[error("IMPORT-DATA failed: {message}")]
    #[diagnostic(code(sqlplot::import))]
    Import { message: String },

    #[error("error accessing {path}: {source}")]
    #[diagnostic(code(sqlplot::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown file type of {path}")]
    #[diagnostic(code(sqlplot::filetype), help("use -f latex or -f gnuplot"))]
    UnknownFileType { path: String },

    #[error("mismatch to expected output file {path}")]
    #[diagnostic(code(sqlplot::check))]
    OutputMismatch { path: String },

    #[error("{message}")]
    #[diagnostic(code(sqlplot::usage))]
    Usage { message: String },

    #[error("{keyword} directive at line {line} failed")]
    #[diagnostic(code(sqlplot::directive))]
    Directive {
        keyword: String,
        line: usize,
        command: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("in this directive")]
        span: SourceSpan,
        #[source]
        cause: Box<SpError>,
    },
}

// ============================================================================
// CONSTRUCTION HELPERS
// ============================================================================

impl SpError {
    pub fn query(query: impl Into<String>, message: impl ToString) -> Self {
        SpError::Query {
            query: query.into(),
            message: message.to_string(),
        }
    }

    pub fn shape(directive: impl Into<String>, message: impl Into<String>) -> Self {
        SpError::Shape {
            directive: directive.into(),
            message: message.into(),
        }
    }

    pub fn reformat(message: impl Into<String>) -> Self {
        SpError::Reformat {
            message: message.into(),
        }
    }

    pub fn connect(conninfo: impl Into<String>, message: impl ToString) -> Self {
        SpError::Connect {
            conninfo: conninfo.into(),
            message: message.to_string(),
        }
    }

    pub fn import(message: impl Into<String>) -> Self {
        SpError::Import {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SpError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        SpError::Usage {
            message: message.into(),
        }
    }

    /// The innermost error, looking through directive wrappers.
    pub fn root_cause(&self) -> &SpError {
        match self {
            SpError::Directive { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
