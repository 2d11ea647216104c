//! The `REFORMAT(...)` clause of TABULAR, TABTABLE and DEFMACRO queries.
//!
//! ```text
//! % TABULAR REFORMAT(digits=3 col 0=(escape) cols 2-3=(round=1 min=bold) group)
//! %         SELECT name, n, avg, stddev FROM results
//! ```
//!
//! Cell-level keys: `escape`, `floor`, `ceil`, `round=floor|ceil|<n>`,
//! `precision=<n>`, `width=<n>`, `digits=2|3|4`, `group[=<sep>]`.
//! Row/column-level keys add `min`/`minimum` and `max`/`maximum` with a style
//! of `none`, `bold` (`bf`) or `emph` (`em`). Selectors `col`, `cols`,
//! `column`, `columns`, `row` and `rows` take a number range and a nested
//! clause applying to every selected index.
//!
//! The effective format of a cell is the default format, overridden by its
//! column format, overridden by its row format, field by field.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::ResultTable;
use crate::errors::{Result, SpError};
use crate::text::{latex_escape, parse_number};

pub mod number;
mod parser;

pub use parser::parse_numbers;
use parser::{balanced, Scanner};

// ============================================================================
// FORMAT SPECIFICATIONS
// ============================================================================

/// How numbers are rounded before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
    /// Round to this many decimal digits; negative values round to tens,
    /// hundreds, and so on.
    Digits(i32),
}

/// Cell-level format. Unset fields fall back to less specific levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellFormat {
    pub escape: Option<bool>,
    pub round: Option<Rounding>,
    pub precision: Option<usize>,
    pub width: Option<usize>,
    pub digits: Option<u32>,
    pub grouping: Option<String>,
}

/// Markup wrapped around row or column extrema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Bold,
    Emph,
}

impl Highlight {
    fn parse(key: &str, value: &str) -> Result<Self> {
        match value {
            "" | "none" => Ok(Highlight::None),
            "bold" | "bf" => Ok(Highlight::Bold),
            "emph" | "em" => Ok(Highlight::Emph),
            _ => Err(SpError::reformat(format!(
                "invalid style for {}: {} (use none, bold or emph)",
                key, value
            ))),
        }
    }

    fn wrap(self, text: String) -> String {
        match self {
            Highlight::None => text,
            Highlight::Bold => format!("\\textbf{{{}}}", text),
            Highlight::Emph => format!("\\emph{{{}}}", text),
        }
    }
}

/// Row- or column-level format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFormat {
    pub cell: CellFormat,
    pub min: Option<Highlight>,
    pub max: Option<Highlight>,
}

impl CellFormat {
    fn apply(&mut self, other: &CellFormat) {
        if other.escape.is_some() {
            self.escape = other.escape;
        }
        if other.round.is_some() {
            self.round = other.round;
        }
        if other.precision.is_some() {
            self.precision = other.precision;
        }
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.digits.is_some() {
            self.digits = other.digits;
        }
        if other.grouping.is_some() {
            self.grouping.clone_from(&other.grouping);
        }
    }

    /// Parse one cell-level key. Returns false if `key` is not cell-level.
    fn parse_key(&mut self, key: &str, scan: &mut Scanner<'_>) -> Result<bool> {
        let invalid = |value: &str| SpError::reformat(format!("invalid value {}={}", key, value));

        match key {
            "escape" => self.escape = Some(true),
            "floor" => self.round = Some(Rounding::Floor),
            "ceil" => self.round = Some(Rounding::Ceil),
            "round" => {
                let value = scan.value()?;
                self.round = Some(match value {
                    "floor" => Rounding::Floor,
                    "ceil" => Rounding::Ceil,
                    _ => Rounding::Digits(value.parse().map_err(|_| invalid(value))?),
                });
            }
            "precision" => {
                let value = scan.value()?;
                self.precision = Some(value.parse().map_err(|_| invalid(value))?);
            }
            "width" => {
                let value = scan.value()?;
                self.width = Some(value.parse().map_err(|_| invalid(value))?);
            }
            "digits" => {
                let value = scan.value()?;
                let digits: u32 = value.parse().map_err(|_| invalid(value))?;
                if !(2..=4).contains(&digits) {
                    return Err(SpError::reformat(format!(
                        "digits={} is not supported, use digits=2, 3 or 4",
                        digits
                    )));
                }
                self.digits = Some(digits);
            }
            "group" | "grouping" => {
                let sep = scan.assigned_value()?.unwrap_or(",");
                self.grouping = Some(sep.to_string());
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl LineFormat {
    fn apply(&mut self, other: &LineFormat) {
        if other.min.is_some() {
            self.min = other.min;
        }
        if other.max.is_some() {
            self.max = other.max;
        }
        self.cell.apply(&other.cell);
    }

    fn wants_extrema(&self) -> bool {
        let active = |h: Option<Highlight>| matches!(h, Some(Highlight::Bold | Highlight::Emph));
        active(self.min) || active(self.max)
    }

    /// Parse one row/column-level key.
    fn parse_key(&mut self, key: &str, scan: &mut Scanner<'_>) -> Result<bool> {
        match key {
            "min" | "minimum" => self.min = Some(Highlight::parse(key, scan.value()?)?),
            "max" | "maximum" => self.max = Some(Highlight::parse(key, scan.value()?)?),
            _ => return self.cell.parse_key(key, scan),
        }
        Ok(true)
    }

    /// Parse a nested row/column clause.
    fn parse(format: &str) -> Result<Self> {
        let mut line = LineFormat::default();
        let mut scan = Scanner::new(format);
        while let Some(key) = scan.keyword()? {
            if !line.parse_key(key, &mut scan)? {
                return Err(SpError::reformat(format!("invalid row/column-level key: {}", key)));
            }
        }
        Ok(line)
    }
}

// ============================================================================
// EXTREMA
// ============================================================================

/// Literal source text of a row's or column's minimum and maximum.
#[derive(Debug, Clone, Default, PartialEq)]
struct Extrema {
    min: Option<(f64, String)>,
    max: Option<(f64, String)>,
}

impl Extrema {
    fn observe(&mut self, v: f64, text: &str) {
        if self.min.as_ref().map_or(true, |(m, _)| v < *m) {
            self.min = Some((v, text.to_string()));
        }
        if self.max.as_ref().map_or(true, |(m, _)| v > *m) {
            self.max = Some((v, text.to_string()));
        }
    }

    fn is_min(&self, text: &str) -> bool {
        self.min.as_ref().is_some_and(|(_, t)| t == text)
    }

    fn is_max(&self, text: &str) -> bool {
        self.max.as_ref().is_some_and(|(_, t)| t == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Row,
    Col,
}

// ============================================================================
// REFORMAT
// ============================================================================

/// A parsed REFORMAT clause, prepared against one result table.
#[derive(Debug, Clone, Default)]
pub struct Reformat {
    default: LineFormat,
    cols: BTreeMap<usize, LineFormat>,
    rows: BTreeMap<usize, LineFormat>,
    col_extrema: BTreeMap<usize, Extrema>,
    row_extrema: BTreeMap<usize, Extrema>,
}

impl Reformat {
    /// Split a leading `REFORMAT(...)` clause off `query`. Queries without the
    /// clause yield an empty format and the unchanged query.
    pub fn parse_query(query: &str) -> Result<(Reformat, String)> {
        let query = query.trim();
        let Some(rest) = query.strip_prefix("REFORMAT") else {
            return Ok((Reformat::default(), query.to_string()));
        };

        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('(') else {
            return Err(SpError::reformat("REFORMAT clause needs parentheses"));
        };

        let clause = balanced(rest)?;
        let reformat = Reformat::parse_format(clause.trim())?;
        let remainder = rest[clause.len() + 1..].trim().to_string();
        Ok((reformat, remainder))
    }

    /// Parse the text inside `REFORMAT(...)`.
    pub fn parse_format(format: &str) -> Result<Reformat> {
        debug!("top-level format: {}", format);

        let mut reformat = Reformat::default();
        let mut scan = Scanner::new(format);

        while let Some(key) = scan.keyword()? {
            match key {
                "col" | "cols" | "column" | "columns" | "row" | "rows" => {
                    let indices = parse_numbers(scan.argument())?;
                    let line = LineFormat::parse(scan.value()?)?;
                    let target = if key.starts_with("row") {
                        &mut reformat.rows
                    } else {
                        &mut reformat.cols
                    };
                    for i in indices {
                        target.entry(i).or_default().apply(&line);
                    }
                }
                _ => {
                    if !reformat.default.parse_key(key, &mut scan)? {
                        return Err(SpError::reformat(format!("invalid top-level key: {}", key)));
                    }
                }
            }
        }

        Ok(reformat)
    }

    fn wants_extrema(&self) -> bool {
        self.default.wants_extrema()
            || self.cols.values().any(LineFormat::wants_extrema)
            || self.rows.values().any(LineFormat::wants_extrema)
    }

    /// Scan the complete table for row and column extrema.
    pub fn prepare(&mut self, table: &ResultTable) {
        if !self.wants_extrema() {
            return;
        }
        for i in 0..table.num_rows() {
            for j in 0..table.num_cols() {
                let text = table.text(i, j);
                if let Some(v) = parse_number(text) {
                    self.row_extrema.entry(i).or_default().observe(v, text);
                    self.col_extrema.entry(j).or_default().observe(v, text);
                }
            }
        }
    }

    /// Effective format of cell (row, col), and where its min/max styles
    /// came from.
    fn resolve(&self, row: usize, col: usize) -> (LineFormat, Scope, Scope) {
        let mut fmt = self.default.clone();
        let (mut min_scope, mut max_scope) = (Scope::Col, Scope::Col);

        if let Some(c) = self.cols.get(&col) {
            fmt.apply(c);
        }
        if let Some(r) = self.rows.get(&row) {
            if r.min.is_some() {
                min_scope = Scope::Row;
            }
            if r.max.is_some() {
                max_scope = Scope::Row;
            }
            fmt.apply(r);
        }
        (fmt, min_scope, max_scope)
    }

    fn extrema(&self, scope: Scope, row: usize, col: usize) -> Option<&Extrema> {
        match scope {
            Scope::Row => self.row_extrema.get(&row),
            Scope::Col => self.col_extrema.get(&col),
        }
    }

    /// Reformat the text of cell (row, col).
    pub fn format(&self, row: usize, col: usize, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let (fmt, min_scope, max_scope) = self.resolve(row, col);

        let Some(v) = parse_number(text) else {
            return if fmt.cell.escape == Some(true) {
                latex_escape(text)
            } else {
                text.to_string()
            };
        };

        let out = number::format_number(text, v, &fmt.cell);

        let is_min = self
            .extrema(min_scope, row, col)
            .is_some_and(|e| e.is_min(text));
        let is_max = self
            .extrema(max_scope, row, col)
            .is_some_and(|e| e.is_max(text));

        match (fmt.min.filter(|_| is_min), fmt.max.filter(|_| is_max)) {
            (Some(style), _) if style != Highlight::None => style.wrap(out),
            (_, Some(style)) => style.wrap(out),
            _ => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[&str]) -> ResultTable {
        ResultTable::new(
            "SELECT v",
            vec!["v".into()],
            values.iter().map(|v| vec![Some(v.to_string())]).collect(),
        )
    }

    #[test]
    fn test_parse_query_strips_clause() {
        let (reformat, query) =
            Reformat::parse_query("REFORMAT(digits=3 col 1=(round=0)) SELECT a, b FROM t").unwrap();
        assert_eq!(query, "SELECT a, b FROM t");
        assert_eq!(reformat.default.cell.digits, Some(3));
        assert_eq!(reformat.cols[&1].cell.round, Some(Rounding::Digits(0)));
    }

    #[test]
    fn test_parse_query_without_clause() {
        let (reformat, query) = Reformat::parse_query("SELECT 1").unwrap();
        assert_eq!(reformat.default, LineFormat::default());
        assert!(reformat.cols.is_empty() && reformat.rows.is_empty());
        assert_eq!(query, "SELECT 1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Reformat::parse_query("REFORMAT digits=3 SELECT 1").is_err());
        assert!(Reformat::parse_query("REFORMAT(col 1=(round=2) SELECT 1").is_err());
        assert!(Reformat::parse_format("col 3-1=(round=2)").is_err());
        assert!(Reformat::parse_format("min=underline").is_err());
        assert!(Reformat::parse_format("digits=7").is_err());
        assert!(Reformat::parse_format("frobnicate").is_err());
        assert!(Reformat::parse_format("col 1=(col 2=(round=1))").is_err());
    }

    #[test]
    fn test_row_overrides_column_overrides_default() {
        let reformat =
            Reformat::parse_format("precision=1 col 1=(precision=2) row 0=(precision=3)").unwrap();
        assert_eq!(reformat.format(1, 0, "1.23456"), "1.2");
        assert_eq!(reformat.format(1, 1, "1.23456"), "1.23");
        assert_eq!(reformat.format(0, 1, "1.23456"), "1.235");
    }

    #[test]
    fn test_min_matches_source_text() {
        let mut reformat = Reformat::parse_format("col 0=(min=bold round=0)").unwrap();
        let table = column(&["9.5", "10.2", "10.8"]);
        reformat.prepare(&table);

        assert_eq!(reformat.format(0, 0, "9.5"), "\\textbf{10}");
        assert_eq!(reformat.format(1, 0, "10.2"), "10");
        assert_eq!(reformat.format(2, 0, "10.8"), "11");
    }

    #[test]
    fn test_duplicate_extrema_all_highlighted() {
        let mut reformat = Reformat::parse_format("max=emph").unwrap();
        let table = column(&["3", "7", "7", "1"]);
        reformat.prepare(&table);
        assert_eq!(reformat.format(1, 0, "7"), "\\emph{7}");
        assert_eq!(reformat.format(2, 0, "7"), "\\emph{7}");
        assert_eq!(reformat.format(0, 0, "3"), "3");
    }

    #[test]
    fn test_row_extrema() {
        let mut reformat = Reformat::parse_format("row 0=(max=bold)").unwrap();
        let table = ResultTable::new(
            "SELECT a, b",
            vec!["a".into(), "b".into()],
            vec![
                vec![Some("4".into()), Some("2".into())],
                vec![Some("9".into()), Some("1".into())],
            ],
        );
        reformat.prepare(&table);
        assert_eq!(reformat.format(0, 0, "4"), "\\textbf{4}");
        assert_eq!(reformat.format(0, 1, "2"), "2");
        assert_eq!(reformat.format(1, 0, "9"), "9");
    }

    #[test]
    fn test_escape_applies_to_text_cells() {
        let reformat = Reformat::parse_format("escape").unwrap();
        assert_eq!(reformat.format(0, 0, "quick_sort"), "quick\\_sort");
        assert_eq!(reformat.format(0, 0, "12"), "12");
    }

    #[test]
    fn test_group_with_separator() {
        let reformat = Reformat::parse_format("group=(\\,) precision=0").unwrap();
        assert_eq!(reformat.format(0, 0, "1234567.4"), "1\\,234\\,567");
    }
}
