//! JSON-serializable summaries of analysed sources, printed by the CLI.

use serde::Serialize;

use crate::{
    context::AnalysisContext,
    diagnostics::{Diagnostic, Severity},
    syntax::{DirectiveKind, LineColumn, LineInfo, SourceKind},
    vfs::Source,
};

#[derive(Debug, Clone, Serialize)]
pub struct DirectiveEdge {
    pub kind: DirectiveKind,
    pub uri: String,
    /// The source the URI resolves to, if it resolves at all.
    pub target: Option<Source>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEntry {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub at: LineColumn,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub kind: SourceKind,
    pub library_name: Option<String>,
    pub tokens: usize,
    pub directives: Vec<DirectiveEdge>,
    pub diagnostics: Vec<DiagnosticEntry>,
    /// Set when the pipeline failed for this source.
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectReport {
    pub sources: Vec<SourceReport>,
    pub libraries: usize,
    pub parts: usize,
    pub unknown: usize,
    pub index_locations: usize,
}

impl ProjectReport {
    /// Reports on every available source of `context`, analysing whatever
    /// is not cached yet.
    pub fn build(context: &AnalysisContext) -> Self {
        let mut report = ProjectReport::default();
        for source in context.available_sources() {
            let entry = source_report(context, &source);
            match entry.kind {
                SourceKind::Library => report.libraries += 1,
                SourceKind::Part => report.parts += 1,
                SourceKind::Unknown => report.unknown += 1,
            }
            report.sources.push(entry);
        }
        report.index_locations = context.index().internal_location_count_in(context);
        report
    }
}

fn source_report(
    context: &AnalysisContext,
    source: &Source,
) -> SourceReport {
    let mut report = SourceReport {
        source: source.clone(),
        kind: context.get_or_compute_kind_of(source),
        library_name: None,
        tokens: 0,
        directives: Vec::new(),
        diagnostics: Vec::new(),
        failure: None,
    };
    let factory = context.source_factory();
    let analysed = context.scan(source).and_then(|tokens| {
        report.tokens = tokens.token_count();
        let info = context.directives(source)?;
        report.library_name = info.library_name.clone();
        report.directives = info
            .directives
            .iter()
            .map(|directive| DirectiveEdge {
                kind: directive.kind,
                uri: directive.uri.clone(),
                target: factory.resolve_uri(source, &directive.uri),
            })
            .collect();
        let errors = context.errors(source)?;
        let lines = LineInfo::new(tokens.source());
        report.diagnostics = errors.iter().map(|error| diagnostic_entry(error, &lines, tokens.source())).collect();
        Ok(())
    });
    if let Err(err) = analysed {
        report.failure = Some(err.to_string());
    }
    report
}

fn diagnostic_entry(
    diagnostic: &Diagnostic,
    lines: &LineInfo,
    text: &str,
) -> DiagnosticEntry {
    DiagnosticEntry {
        code: diagnostic.code.name(),
        severity: diagnostic.code.severity(),
        message: diagnostic.message(),
        at: lines.location(text, diagnostic.offset),
    }
}
