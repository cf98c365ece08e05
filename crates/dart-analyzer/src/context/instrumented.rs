use std::{sync::Arc, time::Instant};

use super::{
    AnalysisContext, ChangeResult, ChangeSet,
    perf::{ContextPerf, Operation},
};
use crate::{
    ast::ParsedUnit,
    diagnostics::Diagnostic,
    element::{ContextId, ContextIdentity, Element, ElementLocation, ElementLookup, LibraryModel},
    error::AnalysisError,
    resolver::ResolvedUnit,
    syntax::{SourceKind, TokenStream},
    vfs::{Source, SourceContainer},
};

/// Times every call into the wrapped context. Reports the wrapped
/// context's identity, so the index treats both as one.
pub struct InstrumentedAnalysisContext {
    basis: Arc<AnalysisContext>,
    perf: ContextPerf,
}

impl InstrumentedAnalysisContext {
    pub fn new(basis: Arc<AnalysisContext>) -> Self {
        Self {
            basis,
            perf: ContextPerf::default(),
        }
    }

    pub fn basis(&self) -> &Arc<AnalysisContext> {
        &self.basis
    }

    pub fn log_summary(&self) {
        self.perf.log_summary();
    }

    /// Number of timed calls to [`Self::resolve`] so far.
    pub fn resolve_calls(&self) -> u64 {
        self.perf.calls(Operation::Resolve)
    }

    fn timed<T>(
        &self,
        operation: Operation,
        call: impl FnOnce(&AnalysisContext) -> Result<T, AnalysisError>,
    ) -> Result<T, AnalysisError> {
        let started = Instant::now();
        let result = call(&self.basis);
        self.perf.record(operation, started.elapsed(), result.is_err());
        result
    }

    fn timed_infallible<T>(
        &self,
        operation: Operation,
        call: impl FnOnce(&AnalysisContext) -> T,
    ) -> T {
        let started = Instant::now();
        let result = call(&self.basis);
        self.perf.record(operation, started.elapsed(), false);
        result
    }

    pub fn get_or_compute_kind_of(
        &self,
        source: &Source,
    ) -> SourceKind {
        self.timed_infallible(Operation::Kind, |basis| basis.get_or_compute_kind_of(source))
    }

    pub fn scan(
        &self,
        source: &Source,
    ) -> Result<Arc<TokenStream>, AnalysisError> {
        self.timed(Operation::Scan, |basis| basis.scan(source))
    }

    pub fn parse(
        &self,
        source: &Source,
    ) -> Result<Arc<ParsedUnit>, AnalysisError> {
        self.timed(Operation::Parse, |basis| basis.parse(source))
    }

    pub fn library_model(
        &self,
        library: &Source,
    ) -> Result<Arc<LibraryModel>, AnalysisError> {
        self.timed(Operation::LibraryModel, |basis| basis.library_model(library))
    }

    pub fn resolve(
        &self,
        unit: &Source,
        library: &Source,
    ) -> Result<Arc<ResolvedUnit>, AnalysisError> {
        self.timed(Operation::Resolve, |basis| basis.resolve(unit, library))
    }

    pub fn errors(
        &self,
        source: &Source,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        self.timed(Operation::Errors, |basis| basis.errors(source))
    }

    pub fn changed(
        &self,
        changes: ChangeSet,
    ) -> ChangeResult {
        self.timed_infallible(Operation::Changed, |basis| basis.changed(changes))
    }

    /// Extracts from the basis and wraps the result.
    pub fn extract_analysis_context(
        &self,
        container: &dyn SourceContainer,
    ) -> Result<InstrumentedAnalysisContext, AnalysisError> {
        let extracted = self.timed(Operation::Extract, |basis| basis.extract_analysis_context(container))?;
        Ok(Self::new(Arc::new(extracted)))
    }

    /// Merges the basis of `other` into this basis.
    pub fn merge_analysis_context(
        &self,
        other: &InstrumentedAnalysisContext,
    ) -> Result<usize, AnalysisError> {
        self.timed(Operation::Merge, |basis| basis.merge_analysis_context(&other.basis))
    }

    pub fn available_sources(&self) -> Vec<Source> {
        self.basis.available_sources()
    }

    pub fn discard(&self) {
        self.log_summary();
        self.basis.discard();
    }
}

impl ContextIdentity for InstrumentedAnalysisContext {
    fn context_id(&self) -> ContextId {
        self.basis.id()
    }
}

impl ElementLookup for InstrumentedAnalysisContext {
    fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<Element> {
        self.basis.element_at(location)
    }
}
