//! Comment-block collection.
//!
//! A directive lives in a comment whose marker is the first non-blank
//! character of the line. A command spanning several lines starts with the
//! marker doubled (`%% TABULAR SELECT ...`); following lines carrying the
//! doubled marker at the same column are appended to it.

use super::Document;
use crate::text::is_blank;

/// A collected comment command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Trimmed command text, continuation lines concatenated.
    pub text: String,
    /// Column of the comment marker.
    pub indent: usize,
    /// First line of the block.
    pub start: usize,
    /// First line after the block.
    pub next: usize,
}

/// Recognizes comment lines of one document dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStyle {
    marker: char,
}

impl CommentStyle {
    pub fn new(marker: char) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    /// Column of the comment marker if `line` starts (after blanks) with
    /// `rep` consecutive markers.
    pub fn comment_indent(&self, line: &str, rep: usize) -> Option<usize> {
        let indent = line.len() - line.trim_start_matches(is_blank).len();
        let rest = &line[indent..];
        let mut chars = rest.chars();
        for _ in 0..rep {
            if chars.next() != Some(self.marker) {
                return None;
            }
        }
        Some(indent)
    }

    pub fn is_comment_line(&self, line: &str) -> bool {
        self.comment_indent(line, 1).is_some()
    }

    /// Find the next comment line at or after `ln`, returning it only if its
    /// trimmed text starts with `prefix`.
    pub fn scan_for_comment(&self, doc: &Document, ln: usize, prefix: &str) -> Option<usize> {
        let cln = (ln..doc.len()).find(|&i| self.is_comment_line(doc.line(i)))?;
        let line = doc.line(cln);
        let indent = self.comment_indent(line, 1)?;
        let comment = line[indent + self.marker.len_utf8()..].trim();
        comment.starts_with(prefix).then_some(cln)
    }

    /// Try to collect a comment block at `ln`. Returns `None` if the line is
    /// not a comment; the caller then advances by one line.
    pub fn collect(&self, doc: &Document, ln: usize) -> Option<CommentBlock> {
        let line = doc.get(ln)?;
        let indent = self.comment_indent(line, 1)?;
        let width = self.marker.len_utf8();

        let mut cmd = line[indent + width..].to_string();
        let mut next = ln + 1;

        if cmd.starts_with(self.marker) {
            cmd.drain(..width);

            while next < doc.len() && self.comment_indent(doc.line(next), 2) == Some(indent) {
                cmd.push_str(&doc.line(next)[indent + 2 * width..]);
                next += 1;
            }
        }

        Some(CommentBlock {
            text: cmd.trim().to_string(),
            indent,
            start: ln,
            next,
        })
    }
}
