//! LaTeX output: pgfplots `\addplot` coordinates, legend entries and `\def`
//! macros.

use crate::directive::Directive;
use crate::document::Document;
use crate::errors::{Result, SpError};
use crate::merge::{gobble, reconcile, AddPlotLine, Extractor, LatexMacroLine, LegendLine, Wrap};
use crate::shape::multiplot::Point;
use crate::shape::{Dialect, MacroDef, MultiPlot, Series};
use crate::text::{collapse_ws, latex_escape};

#[derive(Debug, Default)]
pub struct Latex;

/// ` (a,b) (c,d)` from result rows.
fn coordinates(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            let values: Vec<String> = row.iter().map(|v| collapse_ws(v)).collect();
            format!(" ({})", values.join(","))
        })
        .collect()
}

fn point(p: &Point, with_errors: bool) -> String {
    if with_errors {
        format!(
            " ({},{}) +- ({},{})",
            p.x,
            p.y,
            p.xerr.as_deref().unwrap_or("0"),
            p.yerr.as_deref().unwrap_or("0")
        )
    } else {
        format!(" ({},{})", p.x, p.y)
    }
}

fn legend(series: &Series) -> String {
    if series.escape_legend {
        latex_escape(&series.legend)
    } else {
        series.legend.clone()
    }
}

/// Keep only ASCII letters; TeX control sequences cannot hold anything else.
fn macro_name(column: &str) -> Result<String> {
    let name: String = column.chars().filter(char::is_ascii_alphabetic).collect();
    if name.is_empty() {
        return Err(SpError::shape(
            "DEFMACRO",
            format!("column '{}' does not yield a LaTeX macro name", column),
        ));
    }
    Ok(name)
}

impl Dialect for Latex {
    fn plot(&mut self, doc: &mut Document, d: &Directive, rows: &[Vec<String>]) -> Result<usize> {
        let ln = d.insert_line;
        let coords = coordinates(rows);

        let next = match doc.get(ln).and_then(|line| AddPlotLine.extract(line)) {
            Some(Wrap { head, tail }) => {
                let line = format!("{}{} {}", head, coords, tail);
                doc.replace(ln, ln + 1, d.indent, vec![line], "PLOT")
            }
            None => {
                let line = format!("\\addplot coordinates {{{} }};", coords);
                doc.replace(ln, ln, d.indent, vec![line], "PLOT")
            }
        };
        Ok(next)
    }

    fn multiplot(&mut self, doc: &mut Document, d: &Directive, plot: &MultiPlot) -> Result<usize> {
        let ln = d.insert_line;

        // old entries: an \addplot line, optionally followed by its legend
        let mut old: Vec<(Wrap, Option<Wrap>)> = Vec::new();
        let mut eln = ln;
        while let Some(addplot) = doc.get(eln).and_then(|line| AddPlotLine.extract(line)) {
            let legend = doc.get(eln + 1).and_then(|line| LegendLine.extract(line));
            eln += if legend.is_some() { 2 } else { 1 };
            old.push((addplot, legend));
        }

        let lines = reconcile(&old, &plot.series, |_, series, deco| {
            let coords: String = series.points.iter().map(|p| point(p, plot.has_errors)).collect();
            let legend = legend(series);
            match deco {
                Some((addplot, old_legend)) => vec![
                    format!("{}{} {}", addplot.head, coords, addplot.tail),
                    match old_legend {
                        Some(w) => format!("{}{}{}", w.head, legend, w.tail),
                        None => format!("\\addlegendentry{{{}}};", legend),
                    },
                ],
                None => vec![
                    format!("\\addplot coordinates {{{} }};", coords),
                    format!("\\addlegendentry{{{}}};", legend),
                ],
            }
        });

        Ok(doc.replace(ln, eln, d.indent, lines, "MULTIPLOT"))
    }

    fn defmacro(&mut self, doc: &mut Document, d: &Directive, defs: &[MacroDef]) -> Result<usize> {
        let ln = d.insert_line;
        let lines = defs
            .iter()
            .map(|def| Ok(format!("\\def\\{}{{{}}}", macro_name(&def.name)?, def.value)))
            .collect::<Result<Vec<_>>>()?;

        let (end, _) = gobble(doc, ln, &LatexMacroLine);
        Ok(doc.replace(ln, end, d.indent, lines, "DEFMACRO"))
    }
}
