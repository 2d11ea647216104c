//! Lexical layer of the REFORMAT clause: keywords, selector arguments,
//! `=value` / `(balanced text)` values and number ranges.

use std::collections::BTreeSet;

use crate::errors::{Result, SpError};
use crate::text::is_blank;

/// Cursor over a clause string.
#[derive(Debug, Clone)]
pub(crate) struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_blanks(&mut self) {
        while self.peek().is_some_and(is_blank) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.text[start..self.pos]
    }

    /// Next alphanumeric keyword, `None` at the end of the clause.
    pub fn keyword(&mut self) -> Result<Option<&'a str>> {
        self.skip_blanks();
        match self.peek() {
            None => Ok(None),
            Some(c) if c.is_ascii_alphanumeric() => {
                Ok(Some(self.take_while(|c| c.is_ascii_alphanumeric())))
            }
            Some(c) => Err(SpError::reformat(format!(
                "unexpected character '{}' in \"{}\"",
                c, self.text
            ))),
        }
    }

    /// Selector argument of `col`/`row`: text up to `=` or `(`.
    pub fn argument(&mut self) -> &'a str {
        self.skip_blanks();
        self.take_while(|c| c != '=' && c != '(')
    }

    /// Value after a key: ` value`, ` (values)`, `=value` or `=(values)`.
    pub fn value(&mut self) -> Result<&'a str> {
        self.skip_blanks();
        if self.peek() == Some('=') {
            self.bump();
            self.skip_blanks();
        }
        self.bare_or_balanced()
    }

    /// Value that must be introduced by `=`; `None` leaves the scanner
    /// positioned before the next key.
    pub fn assigned_value(&mut self) -> Result<Option<&'a str>> {
        let save = self.pos;
        self.skip_blanks();
        if self.peek() != Some('=') {
            self.pos = save;
            return Ok(None);
        }
        self.bump();
        self.skip_blanks();
        self.bare_or_balanced().map(Some)
    }

    fn bare_or_balanced(&mut self) -> Result<&'a str> {
        if self.peek() == Some('(') {
            self.bump();
            let inner = balanced(self.rest())?;
            self.pos += inner.len() + 1;
            Ok(inner)
        } else {
            Ok(self.take_while(|c| !is_blank(c)))
        }
    }
}

/// Text up to the `)` closing an already opened parenthesis.
pub(crate) fn balanced(text: &str) -> Result<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Ok(&text[..i]),
            ')' => depth -= 1,
            _ => {}
        }
    }
    Err(SpError::reformat("unbalanced parentheses in REFORMAT() clause"))
}

/// Parse a list of numbers and inclusive ranges such as `3,4 - 7,10-11`.
pub fn parse_numbers(text: &str) -> Result<BTreeSet<usize>> {
    let invalid = |what: &str| SpError::reformat(format!("{} in number range \"{}\"", what, text));

    let mut out = BTreeSet::new();
    for item in text.split(',') {
        let (first, second) = match item.split_once('-') {
            Some((a, b)) => (a.trim(), Some(b.trim())),
            None => (item.trim(), None),
        };

        let parse = |s: &str| -> Result<usize> {
            if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid(&format!("invalid number '{}'", s)));
            }
            s.parse::<usize>().map_err(|_| invalid("number too large"))
        };

        let lo = parse(first)?;
        match second {
            None => {
                out.insert(lo);
            }
            Some(second) => {
                let hi = parse(second)?;
                if lo > hi {
                    return Err(invalid(&format!("reversed range {}-{}", lo, hi)));
                }
                out.extend(lo..=hi);
            }
        }
    }
    Ok(out)
}
