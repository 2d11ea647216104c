//! The document processor.
//!
//! [`Engine::process`] walks a [`Document`] top to bottom, collects comment
//! blocks, and hands every recognized directive to its handler. Handlers
//! rewrite the lines following their directive in place and return the line
//! where scanning resumes, so generated output is never mistaken for a new
//! directive.
//!
//! One call to `process` is one transaction on the current backend: it is
//! committed when the document completes and rolled back on the first error.

use std::collections::BTreeSet;

use miette::NamedSource;
use tracing::{debug, info, warn};

use crate::backend::{connect, QueryBackend};
use crate::directive::{Classified, Directive, Keyword, RangeGate};
use crate::document::{CommentStyle, Document, DocumentKind};
use crate::errors::{Result, SpError};
use crate::gnuplot::{DataFile, Gnuplot};
use crate::import::{read_files, ImportOptions, Importer, ResultLineImporter};
use crate::latex::Latex;
use crate::reformat::Reformat;
use crate::shape::multiplot::{self, MultiPlotHeader};
use crate::shape::tabular::{TABTABLE, TABULAR};
use crate::shape::{defmacro, plot_rows, texttable, Dialect};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Per-document settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// RANGE names to process. `None` processes the whole document.
    pub ranges: Option<BTreeSet<String>>,
    /// Name of the gnuplot data file referenced by `plot` statements. Derived
    /// from the document name when unset.
    pub data_file: Option<String>,
}

/// What a document run produced besides the rewritten lines.
#[derive(Debug, Default)]
pub struct Processed {
    /// The companion data file of a gnuplot document.
    pub data_file: Option<DataFile>,
}

// ============================================================================
// ENGINE CONTEXT
// ============================================================================

enum Output {
    Latex(Latex),
    Gnuplot(Gnuplot),
}

impl Output {
    fn dialect(&mut self) -> &mut dyn Dialect {
        match self {
            Output::Latex(latex) => latex,
            Output::Gnuplot(gnuplot) => gnuplot,
        }
    }
}

/// State living for exactly one document.
struct EngineContext<'a> {
    name: &'a str,
    style: CommentStyle,
    gate: RangeGate,
    output: Output,
}

impl<'a> EngineContext<'a> {
    fn new(name: &'a str, kind: DocumentKind, config: &EngineConfig) -> Self {
        let output = match kind {
            DocumentKind::Latex => Output::Latex(Latex),
            DocumentKind::Gnuplot => {
                let data_file = config
                    .data_file
                    .clone()
                    .unwrap_or_else(|| DataFile::name_for(name));
                Output::Gnuplot(Gnuplot::new(data_file))
            }
        };
        Self {
            name,
            style: kind.comment_style(),
            gate: RangeGate::new(config.ranges.clone()),
            output,
        }
    }

    fn finish(self) -> Processed {
        match self.output {
            Output::Latex(_) => Processed::default(),
            Output::Gnuplot(gnuplot) => Processed {
                data_file: Some(gnuplot.into_data_file()),
            },
        }
    }

    /// Attach the document source to an error raised by `directive`.
    fn directive_error(&self, doc: &Document, directive: &Directive, cause: SpError) -> SpError {
        let offset = doc.byte_offset(directive.start_line);
        let len = doc.get(directive.start_line).map_or(0, str::len);
        SpError::Directive {
            keyword: directive.keyword.to_string(),
            line: directive.start_line + 1,
            command: directive.command.clone(),
            src: NamedSource::new(self.name, doc.to_text()),
            span: (offset, len).into(),
            cause: Box::new(cause),
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Processes documents against a database connection.
pub struct Engine {
    backend: Box<dyn QueryBackend>,
    importer: Box<dyn Importer>,
}

impl Engine {
    pub fn new(backend: Box<dyn QueryBackend>) -> Self {
        Self {
            backend,
            importer: Box::new(ResultLineImporter),
        }
    }

    /// Replace the importer used by IMPORT-DATA.
    pub fn with_importer(mut self, importer: Box<dyn Importer>) -> Self {
        self.importer = importer;
        self
    }

    pub fn backend_mut(&mut self) -> &mut dyn QueryBackend {
        self.backend.as_mut()
    }

    /// Import lines through the configured importer, outside any document.
    pub fn import(&mut self, lines: &[String], options: &ImportOptions) -> Result<usize> {
        self.backend.begin()?;
        let imported = self
            .importer
            .import(self.backend.as_mut(), lines, options, false);
        self.finish_transaction(imported)
    }

    /// Run every directive of `doc`, rewriting it in place.
    pub fn process(
        &mut self,
        name: &str,
        kind: DocumentKind,
        doc: &mut Document,
        config: &EngineConfig,
    ) -> Result<Processed> {
        info!("Processing {} document {}", kind.name(), name);

        let mut ctx = EngineContext::new(name, kind, config);
        self.backend.begin()?;
        let outcome = self.run(&mut ctx, doc);
        self.finish_transaction(outcome)?;
        Ok(ctx.finish())
    }

    fn finish_transaction<T>(&mut self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.backend.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.backend.rollback() {
                    warn!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    fn run(&mut self, ctx: &mut EngineContext<'_>, doc: &mut Document) -> Result<()> {
        let mut ln = 0;

        while ln < doc.len() {
            let Some(block) = ctx.style.collect(doc, ln) else {
                ln += 1;
                continue;
            };
            ln = block.next;

            let directive = match Directive::classify(&block) {
                Classified::Directive(directive) => directive,
                Classified::Unknown(word) => {
                    warn!("line {}: maybe unknown keyword {}", block.start + 1, word);
                    continue;
                }
                Classified::Plain => continue,
            };

            if directive.keyword == Keyword::Range {
                ctx.gate.apply(&directive.body);
                continue;
            }
            if !ctx.gate.is_active() {
                debug!("Skipping {} outside of selected ranges", directive.keyword);
                continue;
            }

            info!("{} {}", ctx.style.marker(), directive.command);
            ln = self
                .dispatch(ctx, doc, &directive)
                .map_err(|e| ctx.directive_error(doc, &directive, e))?;
        }

        Ok(())
    }

    fn dispatch(
        &mut self,
        ctx: &mut EngineContext<'_>,
        doc: &mut Document,
        d: &Directive,
    ) -> Result<usize> {
        match d.keyword {
            Keyword::Range => Ok(d.insert_line),
            Keyword::Sql => {
                self.backend.execute(&d.body)?;
                info!("SQL command successful.");
                Ok(d.insert_line)
            }
            Keyword::ImportData => {
                let options = ImportOptions::from_directive(&d.body)?;
                if options.files.is_empty() {
                    return Err(SpError::usage("IMPORT-DATA requires at least one input file"));
                }
                let lines = read_files(&options.files)?;
                self.importer
                    .import(self.backend.as_mut(), &lines, &options, true)?;
                Ok(d.insert_line)
            }
            Keyword::Connect => {
                let backend = connect(&d.body)?;
                self.backend.commit()?;
                self.backend = backend;
                self.backend.begin()?;
                Ok(d.insert_line)
            }
            Keyword::TextTable => {
                let table = self.backend.query(&d.body, &[])?.materialize()?;
                Ok(texttable::rewrite(doc, ctx.style, d, &table))
            }
            Keyword::Tabular | Keyword::TabTable => {
                let (mut reformat, query) = Reformat::parse_query(&d.body)?;
                let table = self.backend.query(&query, &[])?.materialize()?;
                reformat.prepare(&table);

                let style = if d.keyword == Keyword::Tabular { TABULAR } else { TABTABLE };
                Ok(style.rewrite(doc, ctx.style, d, &table, &reformat))
            }
            Keyword::Plot => {
                let mut cursor = self.backend.query(&d.body, &[])?;
                let rows = plot_rows(cursor.as_mut())?;
                debug!("--> {} points", rows.len());
                ctx.output.dialect().plot(doc, d, &rows)
            }
            Keyword::MultiPlot => {
                let header = MultiPlotHeader::parse(&d.body)?;
                let mut cursor = self.backend.query(&header.query, &[])?;
                let plot = multiplot::group(&header, cursor.as_mut())?;
                debug!("--> {} series", plot.series.len());
                ctx.output.dialect().multiplot(doc, d, &plot)
            }
            Keyword::DefMacro => {
                let (mut reformat, query) = Reformat::parse_query(&d.body)?;
                let table = self.backend.query(&query, &[])?.materialize()?;
                reformat.prepare(&table);
                let defs = defmacro::collect(&table, &reformat)?;
                ctx.output.dialect().defmacro(doc, d, &defs)
            }
        }
    }
}
