//! Recognizing previously generated fragment lines and merging their
//! hand-authored decoration into freshly computed content.
//!
//! Every fragment kind has an [`Extractor`] that matches one old line and
//! captures what must survive regeneration. The computed values themselves are
//! never read back from old lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Document;

// ============================================================================
// EXTRACTORS
// ============================================================================

/// Recognizes one kind of generated line and captures its decoration.
pub trait Extractor {
    type Decoration;

    fn extract(&self, line: &str) -> Option<Self::Decoration>;

    fn matches(&self, line: &str) -> bool {
        self.extract(line).is_some()
    }
}

/// Text around the computed core of a line: `head` + core + `tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrap {
    pub head: String,
    pub tail: String,
}

fn wrap_from(re: &Regex, line: &str) -> Option<Wrap> {
    let caps = re.captures(line)?;
    Some(Wrap {
        head: caps[1].to_string(),
        tail: caps[2].to_string(),
    })
}

static ADDPLOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(\\addplot.*coordinates \{)[^}]+(\};.*)$").expect("valid regex")
});

static LEGEND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(\\addlegendentry\{).*(\};.*)$").expect("valid regex")
});

static TABULAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*\\\\(.*)$").expect("valid regex"));

static LATEX_MACRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*\\def\\").expect("valid regex"));

static GNUPLOT_MACRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^=]+ = .*$").expect("valid regex"));

static GNUPLOT_PLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*plot.*\\[ \t]*$").expect("valid regex"));

static GNUPLOT_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[ \t]*'[^']+' index [0-9]+( title "(?:[^"\\]|\\.)*")?( .*?)(, \\)?[ \t]*$"#)
        .expect("valid regex")
});

/// `\addplot[...] coordinates { ... };...` keeps everything outside the braces.
pub struct AddPlotLine;

impl Extractor for AddPlotLine {
    type Decoration = Wrap;

    fn extract(&self, line: &str) -> Option<Wrap> {
        wrap_from(&ADDPLOT, line)
    }
}

/// `\addlegendentry{...};...` keeps the command and its trailing text.
pub struct LegendLine;

impl Extractor for LegendLine {
    type Decoration = Wrap;

    fn extract(&self, line: &str) -> Option<Wrap> {
        wrap_from(&LEGEND, line)
    }
}

/// TABULAR rows keep the text after the last `\\`, e.g. `\hline`.
pub struct TabularRow;

impl Extractor for TabularRow {
    type Decoration = String;

    fn extract(&self, line: &str) -> Option<String> {
        TABULAR_SUFFIX.captures(line).map(|caps| caps[1].to_string())
    }
}

/// TABTABLE rows carry no decoration; every old row is replaced.
pub struct TabTableRow;

impl Extractor for TabTableRow {
    type Decoration = String;

    fn extract(&self, _line: &str) -> Option<String> {
        Some(String::new())
    }
}

/// `\def\name{value}` lines written by LaTeX DEFMACRO.
pub struct LatexMacroLine;

impl Extractor for LatexMacroLine {
    type Decoration = ();

    fn extract(&self, line: &str) -> Option<()> {
        LATEX_MACRO.is_match(line).then_some(())
    }
}

/// `name = value` lines written by gnuplot DEFMACRO.
pub struct GnuplotMacroLine;

impl Extractor for GnuplotMacroLine {
    type Decoration = ();

    fn extract(&self, line: &str) -> Option<()> {
        GNUPLOT_MACRO.is_match(line).then_some(())
    }
}

/// Header of a multi-line gnuplot `plot \` statement.
pub struct GnuplotPlotHeader;

impl Extractor for GnuplotPlotHeader {
    type Decoration = ();

    fn extract(&self, line: &str) -> Option<()> {
        GNUPLOT_PLOT.is_match(line).then_some(())
    }
}

/// Decoration of one `'<file>' index <n> ...` entry of a gnuplot plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotEntry {
    /// Styling after the index and title, e.g. ` with lines lw 2`.
    pub style: String,
    /// True if the line ends with `, \` and the statement continues.
    pub continued: bool,
}

pub struct GnuplotPlotEntry;

impl Extractor for GnuplotPlotEntry {
    type Decoration = PlotEntry;

    fn extract(&self, line: &str) -> Option<PlotEntry> {
        let caps = GNUPLOT_ENTRY.captures(line)?;
        Some(PlotEntry {
            style: caps.get(2).map_or("", |m| m.as_str()).to_string(),
            continued: caps.get(3).is_some(),
        })
    }
}

// ============================================================================
// SCANNING AND RECONCILING
// ============================================================================

/// Consume consecutive lines from `ln` on that `x` matches. Returns the first
/// unmatched line and the captured decorations.
pub fn gobble<X: Extractor>(doc: &Document, ln: usize, x: &X) -> (usize, Vec<X::Decoration>) {
    let mut end = ln;
    let mut found = Vec::new();
    while let Some(deco) = doc.get(end).and_then(|line| x.extract(line)) {
        found.push(deco);
        end += 1;
    }
    (end, found)
}

/// Pair new entry `i` with old decoration `i`. Entries beyond the old count
/// are rendered with `None`; surplus old decorations are dropped.
pub fn reconcile<E, D, F>(old: &[D], entries: &[E], mut render: F) -> Vec<String>
where
    F: FnMut(usize, &E, Option<&D>) -> Vec<String>,
{
    entries
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| render(i, entry, old.get(i)))
        .collect()
}
