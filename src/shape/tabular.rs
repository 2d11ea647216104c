//! TABULAR and TABTABLE: one delimited line per result row.
//!
//! Both directives share this implementation and differ only in their
//! [`TableStyle`]: column separator, row terminator and which trailing text of
//! an old row is carried over to the regenerated one.

use tracing::debug;

use super::{display_width, end_marker, find_end_marker, pad_left};
use crate::backend::ResultTable;
use crate::directive::{Directive, Keyword};
use crate::document::{CommentStyle, Document};
use crate::merge::{Extractor, TabTableRow, TabularRow};
use crate::reformat::Reformat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStyle {
    pub keyword: Keyword,
    pub separator: &'static str,
    pub terminator: &'static str,
}

pub const TABULAR: TableStyle = TableStyle {
    keyword: Keyword::Tabular,
    separator: " & ",
    terminator: " \\\\",
};

pub const TABTABLE: TableStyle = TableStyle {
    keyword: Keyword::TabTable,
    separator: "\t",
    terminator: "",
};

impl TableStyle {
    fn suffix(&self, line: &str) -> Option<String> {
        match self.keyword {
            Keyword::TabTable => TabTableRow.extract(line),
            _ => TabularRow.extract(line),
        }
    }

    /// Format every row; cells pass through `reformat` and are right-aligned
    /// to the widest formatted cell of their column.
    pub fn render(&self, table: &ResultTable, reformat: &Reformat) -> Vec<String> {
        let cells: Vec<Vec<String>> = (0..table.num_rows())
            .map(|i| {
                (0..table.num_cols())
                    .map(|j| reformat.format(i, j, table.text(i, j)))
                    .collect()
            })
            .collect();

        let mut width = vec![0usize; table.num_cols()];
        for row in &cells {
            for (j, cell) in row.iter().enumerate() {
                width[j] = width[j].max(display_width(cell));
            }
        }

        cells
            .iter()
            .map(|row| {
                let mut line = row
                    .iter()
                    .enumerate()
                    .map(|(j, cell)| pad_left(cell, width[j]))
                    .collect::<Vec<_>>()
                    .join(self.separator);
                line.push_str(self.terminator);
                line
            })
            .collect()
    }

    /// Regenerate the rows after `directive`. Old rows up to the matching end
    /// marker donate their trailing decoration, in order; surplus old rows are
    /// dropped. Without an end marker the rows are inserted fresh.
    pub fn rewrite(
        &self,
        doc: &mut Document,
        style: CommentStyle,
        directive: &Directive,
        table: &ResultTable,
        reformat: &Reformat,
    ) -> usize {
        let mut lines = self.render(table, reformat);
        let ln = directive.insert_line;

        let end = match find_end_marker(doc, style, ln, self.keyword) {
            Some(eln) => {
                let mut rln = ln;
                for line in lines.iter_mut() {
                    if rln >= eln {
                        break;
                    }
                    match self.suffix(doc.line(rln)) {
                        Some(suffix) => line.push_str(&suffix),
                        None => break,
                    }
                    rln += 1;
                }
                eln + 1
            }
            None => ln,
        };

        lines.push(end_marker(style, self.keyword, &directive.body));
        debug!("--> {} rows", table.num_rows());

        doc.replace(ln, end, directive.indent, lines, self.keyword.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResultTable {
        ResultTable::new(
            "SELECT name, n",
            vec!["name".into(), "n".into()],
            vec![
                vec![Some("quick".into()), Some("5".into())],
                vec![Some("bubble".into()), Some("120".into())],
            ],
        )
    }

    fn directive(body: &str, keyword: Keyword, insert_line: usize) -> Directive {
        Directive {
            keyword,
            command: format!("{} {}", keyword, body),
            body: body.to_string(),
            start_line: insert_line - 1,
            insert_line,
            indent: 0,
        }
    }

    #[test]
    fn test_render_tabular() {
        let lines = TABULAR.render(&table(), &Reformat::default());
        assert_eq!(lines, vec![" quick &   5 \\\\", "bubble & 120 \\\\"]);
    }

    #[test]
    fn test_render_tabtable() {
        let lines = TABTABLE.render(&table(), &Reformat::default());
        assert_eq!(lines, vec![" quick\t  5", "bubble\t120"]);
    }

    #[test]
    fn test_rewrite_keeps_suffixes_and_drops_surplus() {
        let mut doc = Document::from_text(
            "% TABULAR SELECT name, n\n\
             a & 1 \\\\ \\hline\n\
             b & 2 \\\\\n\
             c & 3 \\\\ \\midrule\n\
             % END TABULAR SELECT name, n\n\
             \\end{tabular}\n",
        );
        let style = CommentStyle::new('%');
        let d = directive("SELECT name, n", Keyword::Tabular, 1);
        let next = TABULAR.rewrite(&mut doc, style, &d, &table(), &Reformat::default());

        assert_eq!(next, 4);
        assert_eq!(
            doc.lines(),
            &[
                "% TABULAR SELECT name, n",
                " quick &   5 \\\\ \\hline",
                "bubble & 120 \\\\",
                "% END TABULAR SELECT name, n",
                "\\end{tabular}",
            ]
        );
    }

    #[test]
    fn test_rewrite_inserts_without_end_marker() {
        let mut doc = Document::from_text("% TABTABLE SELECT name, n\n");
        let style = CommentStyle::new('%');
        let d = directive("SELECT name, n", Keyword::TabTable, 1);
        let next = TABTABLE.rewrite(&mut doc, style, &d, &table(), &Reformat::default());
        assert_eq!(next, 4);
        assert_eq!(doc.line(3), "% END TABTABLE SELECT name, n");
    }
}
