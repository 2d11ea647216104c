//! Small string tools shared by the document, shaping and reformat modules.

use unicode_segmentation::UnicodeSegmentation;

/// Blank characters as understood by the comment and clause scanners.
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Shorten `text` to at most `width` characters, replacing the tail by `...`.
pub fn shorten(text: &str, width: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = graphemes[..keep].concat();
    out.push_str("...");
    out
}

/// Split at runs of whitespace, dropping empty pieces.
pub fn split_ws(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Collapse every whitespace run into a single space and trim the ends.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a cell text as a finite floating point number.
///
/// Only plain decimal notation is accepted (`12`, `-3.5`, `.25e-3`); words
/// such as `inf` or `NaN`, which `f64::from_str` would take, are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let first = text.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }
    if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// True if the cell text is a number in plain decimal notation.
pub fn is_number(text: &str) -> bool {
    parse_number(text).is_some()
}

/// Escape the characters LaTeX treats specially.
pub fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a string for use inside a double-quoted gnuplot string.
pub fn gnuplot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
