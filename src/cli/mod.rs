//! The `sp-process` command-line interface.
//!
//! Resolves input files, runs each through the [`Engine`] and writes the
//! results in place, or concatenated to `--output`, or checks them against it.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::backend::connect;
use crate::cli::args::{Command, SpArgs};
use crate::document::{Document, DocumentKind};
use crate::engine::{Engine, EngineConfig, Processed};
use crate::errors::{Result, SpError};
use crate::import::{read_files, read_stream, ImportOptions};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> miette::Result<()> {
    let args = SpArgs::parse();
    init_logging(args.verbose);

    if let Some(dir) = &args.work_dir {
        std::env::set_current_dir(dir).map_err(|e| SpError::io(dir.display().to_string(), e))?;
    }

    let mut engine = Engine::new(connect(&args.database)?);

    match &args.command {
        Some(Command::Import(options)) => handle_import(&mut engine, &args, options)?,
        None => handle_process(&mut engine, &args)?,
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// IMPORT
// ============================================================================

fn handle_import(engine: &mut Engine, args: &SpArgs, options: &ImportOptions) -> Result<()> {
    if args.database.trim().is_empty() {
        warn!("importing into an in-memory database, use -D to keep the data");
    }

    let lines = if options.files.is_empty() {
        read_stream(io::stdin().lock())?
    } else {
        read_files(&options.files)?
    };
    engine.import(&lines, options)?;
    Ok(())
}

// ============================================================================
// DOCUMENT PROCESSING
// ============================================================================

fn handle_process(engine: &mut Engine, args: &SpArgs) -> Result<()> {
    let config = EngineConfig {
        ranges: (!args.ranges.is_empty()).then(|| args.ranges.iter().cloned().collect()),
        data_file: None,
    };

    if args.files.is_empty() {
        let kind = args
            .filetype
            .map(DocumentKind::from)
            .ok_or_else(|| SpError::usage("reading from stdin requires --filetype"))?;
        let mut doc = Document::read_from(io::stdin().lock(), "stdin")?;
        let processed = engine.process("stdin", kind, &mut doc, &config)?;

        let target = args.output.clone().unwrap_or_else(|| PathBuf::from("-"));
        emit_text(args.check, &target, &doc.to_text())?;
        return emit_data(args.check, Path::new(""), processed);
    }

    // with --output every document is appended to the one target, in order
    let mut combined = String::new();

    for path in expand_inputs(&args.files)? {
        let kind = match args.filetype {
            Some(filetype) => filetype.into(),
            None => DocumentKind::detect(&path).ok_or_else(|| SpError::UnknownFileType {
                path: path.display().to_string(),
            })?,
        };

        let name = path.display().to_string();
        let file = File::open(&path).map_err(|e| SpError::io(&name, e))?;
        let mut doc = Document::read_from(BufReader::new(file), &name)?;
        let processed = engine.process(&name, kind, &mut doc, &config)?;

        match &args.output {
            Some(target) => {
                let anchor = if target == Path::new("-") { &path } else { target };
                emit_data(args.check, parent_dir(anchor), processed)?;
                combined.push_str(&doc.to_text());
            }
            None => {
                emit_text(args.check, &path, &doc.to_text())?;
                emit_data(args.check, parent_dir(&path), processed)?;
            }
        }
        info!("Processed {}", name);
    }

    match &args.output {
        Some(target) => emit_text(args.check, target, &combined),
        None => Ok(()),
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

/// Expand directories to the files below them with a recognized suffix.
fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                SpError::io(path.display().to_string(), io::Error::new(io::ErrorKind::Other, e))
            })?;
            if entry.file_type().is_file() && DocumentKind::detect(entry.path()).is_some() {
                inputs.push(entry.into_path());
            }
        }
    }
    Ok(inputs)
}

fn emit_text(check: bool, target: &Path, text: &str) -> Result<()> {
    if check {
        output::check_output(target, text)
    } else {
        output::write_output(target, text)
    }
}

/// Write or check the gnuplot data file of a document, if it has one.
fn emit_data(check: bool, data_dir: &Path, processed: Processed) -> Result<()> {
    match processed.data_file.filter(|data| !data.is_empty()) {
        Some(data) => emit_text(check, &data_dir.join(data.name()), data.contents()),
        None => Ok(()),
    }
}
