//! MULTIPLOT: one series per consecutive run of equal group-column values.
//!
//! ```text
//! % MULTIPLOT(algo,n|ptitle) SELECT MULTIPLOT, size AS x, AVG(time) AS y,
//! %   'algo ' || algo AS ptitle FROM stats GROUP BY MULTIPLOT, x ORDER BY MULTIPLOT, x
//! ```
//!
//! The query must return its rows sorted by the group columns. Grouping is a
//! single linear pass: a new series starts whenever the group values differ
//! from the previous row, so unsorted input yields split series.

use tracing::{debug, warn};

use crate::backend::{find_col, Cursor};
use crate::errors::{Result, SpError};

const PLACEHOLDER: &str = "MULTIPLOT";

/// Where series legends come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendSource {
    /// `col=value,col=value` from the group columns.
    Groups,
    /// The `title` column, taken as LaTeX markup.
    Title,
    /// The `ptitle` column, plain text escaped for LaTeX.
    PTitle,
}

impl LegendSource {
    fn column(self) -> Option<&'static str> {
        match self {
            LegendSource::Groups => None,
            LegendSource::Title => Some("title"),
            LegendSource::PTitle => Some("ptitle"),
        }
    }
}

/// The parsed `(<cols>[|title|ptitle]) <query>` body of a MULTIPLOT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPlotHeader {
    pub groups: Vec<String>,
    pub legend: LegendSource,
    /// The query with every placeholder replaced by the group columns.
    pub query: String,
}

impl MultiPlotHeader {
    pub fn parse(body: &str) -> Result<Self> {
        let missing = || {
            SpError::shape(
                "MULTIPLOT",
                "requires a group column list: MULTIPLOT(col,...) SELECT ...",
            )
        };

        let rest = body.trim_start().strip_prefix('(').ok_or_else(missing)?;
        let (list, query) = rest.split_once(')').ok_or_else(missing)?;

        let (list, legend) = match list.split_once('|').map(|(l, s)| (l, s.trim())) {
            None => (list, LegendSource::Groups),
            Some((list, "title")) => (list, LegendSource::Title),
            Some((list, "ptitle")) => (list, LegendSource::PTitle),
            Some((_, other)) => {
                return Err(SpError::shape(
                    "MULTIPLOT",
                    format!("unknown legend column '{}', use title or ptitle", other),
                ))
            }
        };

        let groups: Vec<String> = list.split(',').map(|g| g.trim().to_string()).collect();
        if groups.iter().any(String::is_empty) {
            return Err(missing());
        }

        let query = query.trim();
        if query.is_empty() {
            return Err(SpError::shape(
                "MULTIPLOT",
                "requires a query after the group column list",
            ));
        }

        Ok(Self {
            query: query.replace(PLACEHOLDER, &groups.join(",")),
            groups,
            legend,
        })
    }
}

/// One coordinate with optional symmetric error terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: String,
    pub y: String,
    pub xerr: Option<String>,
    pub yerr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub legend: String,
    /// True if the legend came from `ptitle` and must be LaTeX-escaped.
    /// Gnuplot titles are always escaped.
    pub escape_legend: bool,
    pub points: Vec<Point>,
}

/// All series of one MULTIPLOT result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPlot {
    pub series: Vec<Series>,
    /// True if the result had an `xerr` or `yerr` column.
    pub has_errors: bool,
}

fn require(cursor: &dyn Cursor, name: &str, what: &str) -> Result<usize> {
    find_col(cursor, name).ok_or_else(|| {
        SpError::shape(
            "MULTIPLOT",
            format!("result contains no '{}' column{}.", name, what),
        )
    })
}

/// Group the rows of `cursor` into series.
pub fn group(header: &MultiPlotHeader, cursor: &mut dyn Cursor) -> Result<MultiPlot> {
    let colx = require(cursor, "x", "")?;
    let coly = require(cursor, "y", "")?;
    let colxerr = find_col(cursor, "xerr");
    let colyerr = find_col(cursor, "yerr");

    let groupcols = header
        .groups
        .iter()
        .map(|g| require(cursor, g, ", which is a MULTIPLOT group field"))
        .collect::<Result<Vec<_>>>()?;

    let coltitle = match header.legend.column() {
        Some(name) => Some(require(cursor, name, ", which is the MULTIPLOT legend")?),
        None => None,
    };

    let mut series: Vec<Series> = Vec::new();
    let mut last: Option<Vec<String>> = None;

    while cursor.step()? {
        if cursor.is_null(colx) || cursor.is_null(coly) {
            warn!(
                "MULTIPLOT: skipping row {} with NULL x or y",
                cursor.current_row().unwrap_or_default()
            );
            continue;
        }

        let key: Vec<String> = groupcols.iter().map(|&j| cursor.text(j).to_string()).collect();

        if last.as_ref() != Some(&key) {
            let legend = match coltitle {
                Some(j) => cursor.text(j).to_string(),
                None => header
                    .groups
                    .iter()
                    .zip(&key)
                    .map(|(g, v)| format!("{}={}", g, v))
                    .collect::<Vec<_>>()
                    .join(","),
            };
            debug!("MULTIPLOT series {}: {}", series.len(), legend);
            series.push(Series {
                legend,
                escape_legend: header.legend == LegendSource::PTitle,
                points: Vec::new(),
            });
            last = Some(key);
        }

        let err = |col: Option<usize>| col.map(|j| cursor.text(j).to_string());
        let point = Point {
            x: cursor.text(colx).to_string(),
            y: cursor.text(coly).to_string(),
            xerr: err(colxerr),
            yerr: err(colyerr),
        };
        if let Some(current) = series.last_mut() {
            current.points.push(point);
        }
    }

    Ok(MultiPlot {
        series,
        has_errors: colxerr.is_some() || colyerr.is_some(),
    })
}
