//! Command-line arguments of `sp-process`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::document::DocumentKind;
use crate::import::ImportOptions;

#[derive(Debug, Parser)]
#[command(
    name = "sp-process",
    version,
    about = "Process SQL directives embedded in LaTeX and Gnuplot comments."
)]
pub struct SpArgs {
    /// Increase log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Database connection string.
    #[arg(short = 'D', long, env = "SQLPLOT_DATABASE", default_value = "")]
    pub database: String,

    /// Change into this directory before doing anything else.
    #[arg(short = 'W', long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Document type, required when reading stdin or unknown suffixes.
    #[arg(short, long, value_enum)]
    pub filetype: Option<FileType>,

    /// Write the processed documents here, concatenated in input order,
    /// instead of in place (`-` = stdout).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compare the processed output with the --output file instead of writing it.
    #[arg(short = 'C', long, requires = "output")]
    pub check: bool,

    /// Only process directives inside these RANGE blocks.
    #[arg(short = 'R', long = "range", value_name = "NAME")]
    pub ranges: Vec<String>,

    /// Documents or directories to process; stdin if none.
    pub files: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import RESULT lines from files or stdin into a database table.
    #[command(alias = "import-data")]
    Import(ImportOptions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileType {
    Latex,
    Gnuplot,
}

impl From<FileType> for DocumentKind {
    fn from(filetype: FileType) -> Self {
        match filetype {
            FileType::Latex => DocumentKind::Latex,
            FileType::Gnuplot => DocumentKind::Gnuplot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_args() {
        let args = SpArgs::try_parse_from([
            "sp-process", "-vv", "-f", "gnuplot", "-R", "a", "-R", "b", "-o", "out.gp", "-C", "in.gp",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.filetype, Some(FileType::Gnuplot));
        assert_eq!(args.ranges, vec!["a", "b"]);
        assert!(args.check);
        assert_eq!(args.files, vec![PathBuf::from("in.gp")]);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_check_requires_output() {
        assert!(SpArgs::try_parse_from(["sp-process", "-C", "doc.tex"]).is_err());
    }

    #[test]
    fn test_parse_import_subcommand() {
        let args = SpArgs::try_parse_from(["sp-process", "-D", "x.db", "import-data", "-D", "stats", "r.txt"]).unwrap();
        assert_eq!(args.database, "x.db");
        match args.command {
            Some(Command::Import(opts)) => {
                assert!(opts.no_duplicates);
                assert_eq!(opts.table, "stats");
                assert_eq!(opts.files, vec!["r.txt"]);
            }
            other => panic!("expected import, got {:?}", other),
        }
    }
}
