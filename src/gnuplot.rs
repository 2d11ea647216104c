//! Gnuplot output: data blocks in a companion data file, `plot` statements
//! referencing them by index, and variable assignments.

use std::fmt::Write as _;

use crate::directive::Directive;
use crate::document::Document;
use crate::errors::{Result, SpError};
use crate::merge::{gobble, reconcile, Extractor, GnuplotMacroLine, GnuplotPlotEntry, GnuplotPlotHeader};
use crate::shape::{Dialect, MacroDef, MultiPlot};
use crate::text::{gnuplot_escape, is_number};

const DEFAULT_STYLE: &str = " with linespoints";

// ============================================================================
// DATA FILE
// ============================================================================

/// The companion data file, accumulated in memory during a document run.
///
/// Each PLOT result and each MULTIPLOT series becomes one dataset, addressed in
/// gnuplot by its zero-based `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    name: String,
    contents: String,
    next_index: usize,
}

impl DataFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: String::new(),
            next_index: 0,
        }
    }

    /// `<stem>-data.txt` for a document path, `stdin-data.txt` for stdin.
    pub fn name_for(document: &str) -> String {
        let file = document.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(document);
        let stem = match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        };
        let stem = if stem.is_empty() || stem == "-" { "stdin" } else { stem };
        format!("{}-data.txt", stem)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Start a block with a rule line and the generating directive.
    fn header(&mut self, text: &str) {
        let _ = write!(self.contents, "{}\n# {}\n#\n", "#".repeat(80), text);
    }

    fn comment(&mut self, text: &str) {
        let _ = writeln!(self.contents, "# {}", text);
    }

    fn row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let cells: Vec<&str> = cells.iter().map(AsRef::as_ref).collect();
        self.contents.push_str(&cells.join("\t"));
        self.contents.push('\n');
    }

    /// Close the current dataset and return its index.
    fn finish_dataset(&mut self) -> usize {
        self.contents.push_str("\n\n");
        self.next_index += 1;
        self.next_index - 1
    }
}

// ============================================================================
// PLOT STATEMENT REWRITE
// ============================================================================

/// A dataset referenced by the rewritten plot statement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dataset {
    index: usize,
    title: Option<String>,
}

/// The gnuplot dialect, owning the data file of the current document.
#[derive(Debug)]
pub struct Gnuplot {
    data: DataFile,
}

impl Gnuplot {
    pub fn new(data_file: impl Into<String>) -> Self {
        Self {
            data: DataFile::new(data_file),
        }
    }

    pub fn data_file(&self) -> &DataFile {
        &self.data
    }

    pub fn into_data_file(self) -> DataFile {
        self.data
    }

    fn entry(&self, dataset: &Dataset, style: &str) -> String {
        let mut line = format!("    '{}' index {}", self.data.name, dataset.index);
        if let Some(title) = &dataset.title {
            let _ = write!(line, " title \"{}\"", title);
        }
        line.push_str(style);
        line
    }

    /// Replace the `plot \` statement after the directive, keeping the
    /// styling of existing entries, or insert a new one.
    fn plot_rewrite(&self, doc: &mut Document, d: &Directive, datasets: &[Dataset], desc: &str) -> usize {
        let ln = d.insert_line;

        let (end, styles) = match doc.get(ln).filter(|line| GnuplotPlotHeader.matches(line)) {
            None => (ln, Vec::new()),
            Some(_) => {
                let mut eln = ln + 1;
                let mut styles = Vec::new();
                while let Some(entry) = doc.get(eln).and_then(|line| GnuplotPlotEntry.extract(line)) {
                    eln += 1;
                    styles.push(entry.style);
                    if !entry.continued {
                        break;
                    }
                }
                (eln, styles)
            }
        };

        let mut lines = Vec::with_capacity(datasets.len() + 1);
        if !datasets.is_empty() {
            lines.push("plot \\".to_string());
            let last = datasets.len() - 1;
            lines.extend(reconcile(&styles, datasets, |i, dataset, style| {
                let mut line = self.entry(dataset, style.map_or(DEFAULT_STYLE, String::as_str));
                if i != last {
                    line.push_str(", \\");
                }
                vec![line]
            }));
        }

        doc.replace(ln, end, d.indent, lines, desc)
    }
}

/// Quote values gnuplot would not read as numbers.
fn macro_value(value: &str) -> String {
    if is_number(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Reduce a column name to a gnuplot identifier.
fn macro_name(column: &str) -> Result<String> {
    let mut name: String = column
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        return Err(SpError::shape(
            "DEFMACRO",
            format!("column '{}' does not yield a gnuplot variable name", column),
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    Ok(name)
}

impl Dialect for Gnuplot {
    fn plot(&mut self, doc: &mut Document, d: &Directive, rows: &[Vec<String>]) -> Result<usize> {
        self.data.header(&format!("PLOT {}", d.body));
        for row in rows {
            self.data.row(row);
        }
        let index = self.data.finish_dataset();

        let datasets = [Dataset { index, title: None }];
        Ok(self.plot_rewrite(doc, d, &datasets, "PLOT"))
    }

    fn multiplot(&mut self, doc: &mut Document, d: &Directive, plot: &MultiPlot) -> Result<usize> {
        self.data.header(&d.command);

        let mut datasets = Vec::with_capacity(plot.series.len());
        for series in &plot.series {
            let index = self.data.next_index;
            self.data.comment(&format!("index {} {}", index, series.legend));
            for p in &series.points {
                let mut cells = vec![p.x.as_str(), p.y.as_str()];
                cells.extend(p.xerr.as_deref());
                cells.extend(p.yerr.as_deref());
                self.data.row(&cells);
            }
            self.data.finish_dataset();

            datasets.push(Dataset {
                index,
                title: Some(gnuplot_escape(&series.legend)),
            });
        }

        Ok(self.plot_rewrite(doc, d, &datasets, "MULTIPLOT"))
    }

    fn defmacro(&mut self, doc: &mut Document, d: &Directive, defs: &[MacroDef]) -> Result<usize> {
        let ln = d.insert_line;
        let lines = defs
            .iter()
            .map(|def| Ok(format!("{} = {}", macro_name(&def.name)?, macro_value(&def.value))))
            .collect::<Result<Vec<_>>>()?;

        let (end, _) = gobble(doc, ln, &GnuplotMacroLine);
        Ok(doc.replace(ln, end, d.indent, lines, "DEFMACRO"))
    }
}
