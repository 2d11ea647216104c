//! Directive recognition and RANGE gating.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use crate::document::CommentBlock;

// ============================================================================
// KEYWORDS
// ============================================================================

/// The fixed directive vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Range,
    Sql,
    ImportData,
    Connect,
    TextTable,
    Plot,
    MultiPlot,
    Tabular,
    TabTable,
    DefMacro,
}

impl Keyword {
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "RANGE" => Keyword::Range,
            "SQL" => Keyword::Sql,
            "IMPORT-DATA" => Keyword::ImportData,
            "CONNECT" => Keyword::Connect,
            "TEXTTABLE" => Keyword::TextTable,
            "PLOT" => Keyword::Plot,
            "MULTIPLOT" => Keyword::MultiPlot,
            "TABULAR" => Keyword::Tabular,
            "TABTABLE" => Keyword::TabTable,
            "DEFMACRO" | "MACRO" => Keyword::DefMacro,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Range => "RANGE",
            Keyword::Sql => "SQL",
            Keyword::ImportData => "IMPORT-DATA",
            Keyword::Connect => "CONNECT",
            Keyword::TextTable => "TEXTTABLE",
            Keyword::Plot => "PLOT",
            Keyword::MultiPlot => "MULTIPLOT",
            Keyword::Tabular => "TABULAR",
            Keyword::TabTable => "TABTABLE",
            Keyword::DefMacro => "DEFMACRO",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a command into its leading keyword (the longest run of `A-Z`, `-`
/// and `_`) and the body after one separator character.
pub fn split_keyword(command: &str) -> (&str, &str) {
    let end = command
        .find(|c: char| !(c.is_ascii_uppercase() || c == '-' || c == '_'))
        .unwrap_or(command.len());
    let word = &command[..end];
    let rest = &command[end..];
    let body = match rest.chars().next() {
        Some(c) if c.is_whitespace() => &rest[c.len_utf8()..],
        _ => rest,
    };
    (word, body)
}

// ============================================================================
// DIRECTIVE
// ============================================================================

/// A recognized directive, consumed once by its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub keyword: Keyword,
    /// Full command text including the keyword.
    pub command: String,
    /// Text after the keyword.
    pub body: String,
    /// Line of the comment block.
    pub start_line: usize,
    /// First line after the comment block; generated content goes here.
    pub insert_line: usize,
    /// Column of the comment marker.
    pub indent: usize,
}

/// Result of classifying a comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Directive(Directive),
    /// Uppercase comment text that might be a misspelled keyword.
    Unknown(String),
    /// Ordinary comment.
    Plain,
}

impl Directive {
    pub fn classify(block: &CommentBlock) -> Classified {
        let (word, body) = split_keyword(&block.text);
        match Keyword::parse(word) {
            Some(keyword) => Classified::Directive(Directive {
                keyword,
                command: block.text.clone(),
                body: body.to_string(),
                start_line: block.start,
                insert_line: block.next,
                indent: block.indent,
            }),
            None if word.len() >= 4 && !word.starts_with('-') => {
                Classified::Unknown(word.to_string())
            }
            None => Classified::Plain,
        }
    }
}

// ============================================================================
// RANGE GATE
// ============================================================================

/// Enables and disables directive processing through `RANGE BEGIN/END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeGate {
    allowed: BTreeSet<String>,
    active: bool,
}

impl RangeGate {
    /// Without an allow-list every directive is active; with one, only
    /// directives inside a listed RANGE are.
    pub fn new(allowed: Option<BTreeSet<String>>) -> Self {
        match allowed {
            Some(allowed) => Self {
                allowed,
                active: false,
            },
            None => Self {
                allowed: BTreeSet::new(),
                active: true,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply a `RANGE BEGIN <name>` / `RANGE END <name>` body.
    pub fn apply(&mut self, body: &str) {
        let mut words = body.split_whitespace();
        let (op, name) = match (words.next(), words.next()) {
            (Some(op), Some(name)) => (op, name),
            _ => {
                warn!("RANGE needs BEGIN or END and a name: {}", body);
                return;
            }
        };

        if !self.allowed.contains(name) {
            info!("RANGE {} {} not selected", op, name);
            return;
        }

        match op {
            "BEGIN" => {
                info!("RANGE BEGIN {}: processing enabled", name);
                self.active = true;
            }
            "END" => {
                info!("RANGE END {}: processing disabled", name);
                self.active = false;
            }
            other => warn!("unknown RANGE operation {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> CommentBlock {
        CommentBlock {
            text: text.to_string(),
            indent: 0,
            start: 4,
            next: 5,
        }
    }

    #[test]
    fn test_split_keyword() {
        assert_eq!(split_keyword("SQL CREATE TABLE t (a INT)"), ("SQL", "CREATE TABLE t (a INT)"));
        assert_eq!(split_keyword("IMPORT-DATA -1 t f.txt"), ("IMPORT-DATA", "-1 t f.txt"));
        assert_eq!(split_keyword("MULTIPLOT(g) SELECT"), ("MULTIPLOT", "(g) SELECT"));
        assert_eq!(split_keyword("TEXTTABLE"), ("TEXTTABLE", ""));
    }

    #[test]
    fn test_classify() {
        match Directive::classify(&block("PLOT SELECT x, y FROM t")) {
            Classified::Directive(d) => {
                assert_eq!(d.keyword, Keyword::Plot);
                assert_eq!(d.body, "SELECT x, y FROM t");
                assert_eq!(d.insert_line, 5);
            }
            other => panic!("expected directive, got {:?}", other),
        }
        assert_eq!(
            Directive::classify(&block("PLOTT SELECT 1")),
            Classified::Unknown("PLOTT".into())
        );
        assert_eq!(Directive::classify(&block("END TABULAR SELECT 1")), Classified::Plain);
        assert_eq!(Directive::classify(&block("---- rule")), Classified::Plain);
        assert_eq!(Directive::classify(&block("some prose")), Classified::Plain);
    }

    #[test]
    fn test_gate_without_filter_stays_active() {
        let mut gate = RangeGate::new(None);
        assert!(gate.is_active());
        gate.apply("BEGIN foo");
        gate.apply("END foo");
        assert!(gate.is_active());
    }

    #[test]
    fn test_gate_with_filter() {
        let mut gate = RangeGate::new(Some(["foo".to_string()].into_iter().collect()));
        assert!(!gate.is_active());
        gate.apply("BEGIN bar");
        assert!(!gate.is_active());
        gate.apply("BEGIN foo");
        assert!(gate.is_active());
        gate.apply("END foo");
        assert!(!gate.is_active());
    }
}
