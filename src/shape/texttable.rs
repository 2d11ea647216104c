//! TEXTTABLE: an ASCII box table of a query result.
//!
//! ```text
//! +-------+----------+
//! | count |      sum |
//! +-------+----------+
//! |     5 | 24504.38 |
//! +-------+----------+
//! ```

use tracing::debug;

use super::{display_width, end_marker, find_end_marker, pad_left, pad_right};
use crate::backend::ResultTable;
use crate::directive::{Directive, Keyword};
use crate::document::{CommentStyle, Document};
use crate::text::is_number;

/// Render `table` as box table lines.
pub fn render(table: &ResultTable) -> Vec<String> {
    let cols = table.num_cols();

    let mut width: Vec<usize> = (0..cols).map(|j| display_width(table.col_name(j))).collect();
    let mut numeric = vec![true; cols];

    for i in 0..table.num_rows() {
        for j in 0..cols {
            width[j] = width[j].max(display_width(table.text(i, j)));
            if !table.is_null(i, j) && !is_number(table.text(i, j)) {
                numeric[j] = false;
            }
        }
    }

    let divider = {
        let mut line = String::from("+-");
        for (j, w) in width.iter().enumerate() {
            if j != 0 {
                line.push_str("+-");
            }
            line.push_str(&"-".repeat(w + 1));
        }
        line.push('+');
        line
    };

    let row_line = |cells: Vec<String>| {
        let mut line = String::from("| ");
        for (j, cell) in cells.iter().enumerate() {
            if j != 0 {
                line.push_str("| ");
            }
            line.push_str(cell);
            line.push(' ');
        }
        line.push('|');
        line
    };

    let mut out = Vec::with_capacity(table.num_rows() + 4);
    out.push(divider.clone());
    out.push(row_line(
        (0..cols).map(|j| pad_left(table.col_name(j), width[j])).collect(),
    ));
    out.push(divider.clone());
    for i in 0..table.num_rows() {
        out.push(row_line(
            (0..cols)
                .map(|j| {
                    if numeric[j] {
                        pad_left(table.text(i, j), width[j])
                    } else {
                        pad_right(table.text(i, j), width[j])
                    }
                })
                .collect(),
        ));
    }
    out.push(divider);
    out
}

/// Replace the block up to a previous `END TEXTTABLE` marker, or insert a new
/// one, and return the line after it.
pub fn rewrite(doc: &mut Document, style: CommentStyle, directive: &Directive, table: &ResultTable) -> usize {
    let mut lines = render(table);
    lines.push(end_marker(style, Keyword::TextTable, &directive.body));

    let ln = directive.insert_line;
    let end = match find_end_marker(doc, style, ln, Keyword::TextTable) {
        Some(eln) => eln + 1,
        None => ln,
    };
    debug!("--> {} rows", table.num_rows());

    doc.replace(ln, end, directive.indent, lines, "TEXTTABLE")
}
