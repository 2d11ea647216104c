//! The line buffer: a document as a mutable sequence of text lines.
//!
//! Directives never hold indices into a [`Document`] across a mutation.
//! [`Document::replace`] returns the net change in line count, and callers
//! derive their next scan position from that value.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, SpError};

pub mod comment;

pub use comment::{CommentBlock, CommentStyle};

// ============================================================================
// DOCUMENT KIND
// ============================================================================

/// The two document dialects the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Latex,
    Gnuplot,
}

impl DocumentKind {
    /// The single comment character carrying directives.
    pub fn comment_char(self) -> char {
        match self {
            DocumentKind::Latex => '%',
            DocumentKind::Gnuplot => '#',
        }
    }

    pub fn comment_style(self) -> CommentStyle {
        CommentStyle::new(self.comment_char())
    }

    /// Detect the kind from a file name suffix.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "tex" | "latex" | "ltx" => Some(DocumentKind::Latex),
            "gp" | "gpi" | "gnu" | "plt" | "plot" | "gnuplot" => Some(DocumentKind::Gnuplot),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DocumentKind::Latex => "latex",
            DocumentKind::Gnuplot => "gnuplot",
        }
    }
}

// ============================================================================
// LINE BUFFER
// ============================================================================

/// Ordered, randomly indexable lines of a text document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split text into lines. A trailing newline does not produce an empty
    /// last line.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    /// Read a complete stream line-wise.
    pub fn read_from<R: BufRead>(reader: R, name: &str) -> Result<Self> {
        let lines = reader
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| SpError::io(name, e))?;
        Ok(Self { lines })
    }

    /// Write all lines, each terminated by a newline.
    pub fn write_to<W: Write>(&self, mut writer: W, name: &str) -> Result<()> {
        for line in &self.lines {
            writeln!(writer, "{}", line).map_err(|e| SpError::io(name, e))?;
        }
        writer.flush().map_err(|e| SpError::io(name, e))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, i: usize) -> &str {
        &self.lines[i]
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.lines.get(i).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Byte offset of the start of line `i` in [`Document::to_text`].
    pub fn byte_offset(&self, i: usize) -> usize {
        self.lines.iter().take(i).map(|l| l.len() + 1).sum()
    }

    /// Replace lines `[begin, end)` with `content`, each line prefixed by
    /// `indent` spaces. Returns the first line after the new content.
    pub fn replace(
        &mut self,
        begin: usize,
        end: usize,
        indent: usize,
        content: Vec<String>,
        desc: &str,
    ) -> usize {
        debug_assert!(begin <= end && end <= self.lines.len());

        if begin == end {
            debug!("Inserting {} at line {}", desc, begin);
        } else {
            debug!("Replace lines [{},{}) with {}", begin, end, desc);
        }

        let pad = " ".repeat(indent);
        let added = content.len();
        let content = content.into_iter().map(|l| {
            if indent == 0 {
                l
            } else {
                format!("{}{}", pad, l)
            }
        });
        self.lines.splice(begin..end, content);

        begin + added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_next_line() {
        let mut doc = Document::from_text("a\nb\nc\n");
        let next = doc.replace(1, 2, 0, vec!["x".into(), "y".into(), "z".into()], "TEST");
        assert_eq!(next, 4);
        assert_eq!(doc.lines(), &["a", "x", "y", "z", "c"]);

        let next = doc.replace(1, 4, 2, vec!["q".into()], "TEST");
        assert_eq!(next, 2);
        assert_eq!(doc.lines(), &["a", "  q", "c"]);
    }

    #[test]
    fn test_insert_and_text_round_trip() {
        let mut doc = Document::from_text("first\nlast\n");
        doc.replace(1, 1, 4, vec!["one".into(), "two".into()], "TEST");
        assert_eq!(doc.to_text(), "first\n    one\n    two\nlast\n");
    }

    #[test]
    fn test_empty_content_inserts_nothing() {
        let mut doc = Document::from_text("a\n");
        assert_eq!(doc.replace(0, 0, 0, Vec::new(), "TEST"), 0);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(DocumentKind::detect(Path::new("paper.tex")), Some(DocumentKind::Latex));
        assert_eq!(DocumentKind::detect(Path::new("speed.plot")), Some(DocumentKind::Gnuplot));
        assert_eq!(DocumentKind::detect(Path::new("README")), None);
    }

    #[test]
    fn test_byte_offset() {
        let doc = Document::from_text("ab\ncde\nf\n");
        assert_eq!(doc.byte_offset(0), 0);
        assert_eq!(doc.byte_offset(2), 7);
    }
}
