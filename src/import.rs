//! IMPORT-DATA: loading `RESULT key=value ...` lines into a table.
//!
//! Benchmark programs print lines such as
//!
//! ```text
//! RESULT algo=quicksort size=1024 time=0.0123
//! ```
//!
//! and the importer creates a table with one column per key, choosing the
//! narrowest column type (BIGINT, DOUBLE PRECISION, VARCHAR) that holds every
//! value seen for that key.

use std::collections::HashSet;
use std::fs;
use std::io::BufRead;

use clap::Parser;
use tracing::{debug, info};

use crate::backend::QueryBackend;
use crate::errors::{Result, SpError};

// ============================================================================
// OPTIONS
// ============================================================================

/// Options shared by the IMPORT-DATA directive and the `import` subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
pub struct ImportOptions {
    /// Take field types from the first line and stream the rest.
    #[arg(short = '1')]
    pub first_line: bool,

    /// Process all lines, regardless of the RESULT marker.
    #[arg(short = 'a')]
    pub all_lines: bool,

    /// Name unnamed fields col<N> instead of using them as boolean keys.
    #[arg(short = 'C')]
    pub col_numbers: bool,

    /// Drop duplicate lines.
    #[arg(short = 'D')]
    pub no_duplicates: bool,

    /// Log the generated statements.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Table to (re)create.
    pub table: String,

    /// Files to read.
    pub files: Vec<String>,
}

impl ImportOptions {
    /// Parse the body of an IMPORT-DATA directive.
    pub fn from_directive(body: &str) -> Result<Self> {
        let args = std::iter::once("IMPORT-DATA").chain(body.split_whitespace());
        Self::try_parse_from(args).map_err(|e| SpError::usage(e.to_string()))
    }
}

/// Read the lines of every file in `files`.
pub fn read_files(files: &[String]) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for file in files {
        let text = fs::read_to_string(file)
            .map_err(|e| SpError::import(format!("error reading {}: {}", file, e)))?;
        lines.extend(text.lines().map(str::to_string));
    }
    Ok(lines)
}

/// Read all lines of a stream.
pub fn read_stream<R: BufRead>(reader: R) -> Result<Vec<String>> {
    reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| SpError::import(format!("error reading input: {}", e)))
}

// ============================================================================
// IMPORTER
// ============================================================================

/// Loads source lines into a table; the engine treats it as opaque.
pub trait Importer {
    /// Import `lines` into `options.table`, returning the number of rows.
    fn import(
        &mut self,
        backend: &mut dyn QueryBackend,
        lines: &[String],
        options: &ImportOptions,
        temporary: bool,
    ) -> Result<usize>;
}

/// Column type, ordered from most generic to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldType {
    Varchar,
    Double,
    Integer,
}

impl FieldType {
    pub fn detect(value: &str) -> Self {
        let digits = |s: &str| s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let sign = |c: char| c == '+' || c == '-';

        let unsigned = value.strip_prefix(sign).unwrap_or(value);
        let int = digits(unsigned);
        let rest = &unsigned[int..];

        if rest.is_empty() {
            return if int > 0 { FieldType::Integer } else { FieldType::Varchar };
        }

        let Some(frac) = rest.strip_prefix('.') else {
            return FieldType::Varchar;
        };
        let mantissa = int + digits(frac);
        let rest = &frac[digits(frac)..];
        if mantissa == 0 {
            return FieldType::Varchar;
        }
        if rest.is_empty() {
            return FieldType::Double;
        }

        let Some(exp) = rest.strip_prefix(|c: char| c == 'e' || c == 'E') else {
            return FieldType::Varchar;
        };
        let exp = exp.strip_prefix(sign).unwrap_or(exp);
        if digits(exp) > 0 && exp[digits(exp)..].is_empty() {
            FieldType::Double
        } else {
            FieldType::Varchar
        }
    }

    pub fn sql_name(self) -> &'static str {
        match self {
            FieldType::Varchar => "VARCHAR",
            FieldType::Double => "DOUBLE PRECISION",
            FieldType::Integer => "BIGINT",
        }
    }
}

/// Offset of the key=value part if `line` is a RESULT line.
fn result_offset(line: &str) -> Option<usize> {
    ["RESULT", "// RESULT", "# RESULT"].iter().find_map(|marker| {
        let rest = line.strip_prefix(marker)?;
        rest.starts_with(|c: char| c == ' ' || c == '\t').then_some(marker.len() + 1)
    })
}

/// Split at tabs if the line has any, else at spaces.
fn split_fields(text: &str) -> Vec<&str> {
    let sep = if text.contains('\t') { '\t' } else { ' ' };
    text.split(sep).collect()
}

fn split_key_value(field: &str, col: usize, col_numbers: bool) -> (String, String) {
    match field.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None if col_numbers => (format!("col{}", col), field.to_string()),
        None => (field.to_string(), "1".to_string()),
    }
}

/// The default importer for RESULT lines.
#[derive(Debug, Default)]
pub struct ResultLineImporter;

impl ResultLineImporter {
    fn parse_line(line: &str, options: &ImportOptions) -> Option<Vec<(String, String)>> {
        let offset = match result_offset(line) {
            Some(offset) => offset,
            None if options.all_lines => 0,
            None => return None,
        };

        Some(
            split_fields(&line[offset..])
                .into_iter()
                .enumerate()
                .filter(|(_, field)| !field.is_empty())
                .map(|(col, field)| split_key_value(field, col, options.col_numbers))
                .collect(),
        )
    }
}

impl Importer for ResultLineImporter {
    fn import(
        &mut self,
        backend: &mut dyn QueryBackend,
        lines: &[String],
        options: &ImportOptions,
        temporary: bool,
    ) -> Result<usize> {
        let table = &options.table;
        let mut fields: Vec<(String, FieldType)> = Vec::new();
        let mut rows = Vec::new();
        let mut seen = HashSet::new();

        for line in lines {
            let Some(row) = Self::parse_line(line, options) else {
                continue;
            };
            if options.no_duplicates && !seen.insert(line.as_str()) {
                debug!("Dropping duplicate {}", line);
                continue;
            }

            if !options.first_line || rows.is_empty() {
                for (key, value) in &row {
                    let t = FieldType::detect(value);
                    match fields.iter_mut().find(|(k, _)| k == key) {
                        Some((_, known)) => *known = (*known).min(t),
                        None => fields.push((key.clone(), t)),
                    }
                }
            }
            rows.push(row);
        }

        if fields.is_empty() {
            return Err(SpError::import(format!(
                "no RESULT lines found for table \"{}\"",
                table
            )));
        }

        let quoted = backend.quote_identifier(table);
        if backend.exists_table(table)? {
            info!("Table {} exists. Replacing data.", quoted);
            backend.execute(&format!("DROP TABLE {}", quoted))?;
        }

        let create = format!(
            "CREATE {}TABLE {} ({})",
            if temporary { "TEMPORARY " } else { "" },
            quoted,
            fields
                .iter()
                .map(|(k, t)| format!("{} {}", backend.quote_identifier(k), t.sql_name()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        if options.verbose >= 1 {
            info!("{}", create);
        }
        backend.execute(&create)?;

        for row in &rows {
            let columns: Vec<String> = row.iter().map(|(k, _)| backend.quote_identifier(k)).collect();
            let marks: Vec<String> = (0..row.len()).map(|i| backend.placeholder(i)).collect();
            let insert = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quoted,
                columns.join(","),
                marks.join(",")
            );
            if options.verbose >= 2 {
                info!("{}", insert);
            }
            let values: Vec<String> = row.iter().map(|(_, v)| v.clone()).collect();
            backend.query(&insert, &values)?;
        }

        info!("Imported {} rows of data into table {}", rows.len(), quoted);
        Ok(rows.len())
    }
}
