//! sqlplot: SQL directives embedded in LaTeX and Gnuplot comments.
//!
//! A document carries comments such as
//!
//! ```text
//! % TABULAR REFORMAT(round=2) SELECT algo, AVG(time) FROM stats GROUP BY algo
//! ```
//!
//! and [`engine::Engine`] runs the query and writes the result into the lines
//! after the comment. Running a processed document again regenerates the same
//! output, keeping any styling the author added to it.

pub use crate::errors::{Result, SpError};

pub mod backend;
pub mod cli;
pub mod directive;
pub mod document;
pub mod engine;
pub mod errors;
pub mod gnuplot;
pub mod import;
pub mod latex;
pub mod merge;
pub mod reformat;
pub mod shape;
pub mod text;
