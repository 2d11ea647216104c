//! Query shaping: turning query results into document fragments.
//!
//! The table-like directives (TEXTTABLE, TABULAR, TABTABLE) render the same
//! way in every document kind. PLOT, MULTIPLOT and DEFMACRO produce
//! dialect-neutral data here and leave the concrete syntax to a [`Dialect`].

use unicode_width::UnicodeWidthStr;

use crate::backend::Cursor;
use crate::directive::{Directive, Keyword};
use crate::document::{CommentStyle, Document};
use crate::errors::Result;
use crate::text::shorten;

pub mod defmacro;
pub mod multiplot;
pub mod tabular;
pub mod texttable;

pub use defmacro::MacroDef;
pub use multiplot::{MultiPlot, Series};

/// Width limit for the query text repeated in end markers.
pub const END_MARKER_WIDTH: usize = 80;

// ============================================================================
// DIALECT
// ============================================================================

/// Document-kind specific output of the plotting and macro directives.
///
/// Each method rewrites the fragment following the directive and returns the
/// line where scanning resumes.
pub trait Dialect {
    fn plot(&mut self, doc: &mut Document, directive: &Directive, rows: &[Vec<String>])
        -> Result<usize>;

    fn multiplot(&mut self, doc: &mut Document, directive: &Directive, plot: &MultiPlot)
        -> Result<usize>;

    fn defmacro(&mut self, doc: &mut Document, directive: &Directive, defs: &[MacroDef])
        -> Result<usize>;
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// The sentinel closing a generated block: `% END TABULAR SELECT ...`.
pub fn end_marker(style: CommentStyle, keyword: Keyword, query: &str) -> String {
    format!(
        "{} END {} {}",
        style.marker(),
        keyword,
        shorten(query, END_MARKER_WIDTH)
    )
}

/// Line of the end marker closing a previous `keyword` block, if the next
/// comment after `ln` is one.
pub fn find_end_marker(doc: &Document, style: CommentStyle, ln: usize, keyword: Keyword) -> Option<usize> {
    style.scan_for_comment(doc, ln, &format!("END {}", keyword))
}

/// Stream all rows of a result as cell texts, NULL as empty.
pub fn plot_rows(cursor: &mut dyn Cursor) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    while cursor.step()? {
        rows.push((0..cursor.num_cols()).map(|j| cursor.text(j).to_string()).collect());
    }
    Ok(rows)
}

/// Display width of a cell.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

pub fn pad_left(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{}{}", " ".repeat(fill), text)
}

pub fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(text));
    format!("{}{}", text, " ".repeat(fill))
}
