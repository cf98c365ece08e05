//! Per-context supervision of the analysis pipeline.
//!
//! An [`AnalysisContext`] owns a set of sources and caches, for each, the
//! results of every pipeline stage: contents, tokens, directives, parsed
//! unit, library models and resolution. Queries compute lazily and cache;
//! changes only invalidate. Work runs outside the state lock on `Arc`
//! snapshots, and results computed while an invalidation happened are
//! returned but never cached.

mod change;
mod instrumented;
mod perf;
mod scheduler;

use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use dashmap::DashMap;
use tracing::{debug, warn};

pub use change::{ChangeResult, ChangeSet};
pub use instrumented::InstrumentedAnalysisContext;
pub use scheduler::{AnalysisScheduler, SchedulerStatus};

use crate::{
    ast::{ParsedUnit, parse_unit},
    config::AnalysisSettings,
    diagnostics::{Diagnostic, scan_errors},
    element::{
        ContextId, ContextIdentity, Element, ElementLocation, ElementLookup, LibraryModel, ModelSet, declare_library,
        link_library,
    },
    error::AnalysisError,
    index::{MemoryIndexStore, index_unit},
    resolver::{ElementResolver, ResolvedUnit},
    syntax::{DirectiveInfo, DirectiveKind, Edit, PartOf, SourceKind, TokenStream, rescan},
    vfs::{Source, SourceContainer, SourceFactory, SourceSet},
};

const CORE_LIBRARY: &str = "dart:core";

/// Produces syntax trees from token streams.
pub trait UnitParser: Send + Sync {
    fn parse(
        &self,
        source: &Source,
        tokens: &TokenStream,
    ) -> ParsedUnit;
}

/// The crate's own recursive-descent parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUnitParser;

impl UnitParser for DefaultUnitParser {
    fn parse(
        &self,
        _source: &Source,
        tokens: &TokenStream,
    ) -> ParsedUnit {
        parse_unit(tokens)
    }
}

#[derive(Default)]
struct SourceEntry {
    /// Added explicitly rather than reached through a directive.
    explicit: bool,
    contents: Option<Arc<str>>,
    tokens: Option<Arc<TokenStream>>,
    /// Tokens of the previous text and the edit that produced the current one.
    pending_edit: Option<(Arc<TokenStream>, Edit)>,
    directives: Option<Arc<DirectiveInfo>>,
    parsed: Option<Arc<ParsedUnit>>,
    resolved: Option<Arc<ResolvedUnit>>,
    resolution_errors: Option<Arc<[Diagnostic]>>,
}

impl SourceEntry {
    fn kind(&self) -> Option<SourceKind> {
        self.directives.as_ref().map(|info| info.source_kind())
    }

    fn clear_resolution(&mut self) {
        self.resolved = None;
        self.resolution_errors = None;
    }

    /// Drops everything derived from the text. Keeps the old tokens around
    /// when `edit` says how the text changed.
    fn clear_contents(
        &mut self,
        edit: Option<Edit>,
    ) {
        self.pending_edit = match (edit, self.tokens.take(), self.pending_edit.take()) {
            (Some(edit), Some(tokens), None) => Some((tokens, edit)),
            _ => None,
        };
        self.contents = None;
        self.directives = None;
        self.parsed = None;
        self.clear_resolution();
    }
}

#[derive(Default)]
struct LibraryEntry {
    declared: Option<Arc<LibraryModel>>,
    linked: Option<Arc<LibraryModel>>,
}

struct ContextState {
    factory: SourceFactory,
    entries: HashMap<Source, SourceEntry>,
    libraries: HashMap<Source, LibraryEntry>,
    /// Bumped by every invalidation; results computed under an older epoch
    /// are not cached.
    epoch: u64,
    discarded: bool,
}

impl ContextState {
    fn new(factory: SourceFactory) -> Self {
        Self {
            factory,
            entries: HashMap::new(),
            libraries: HashMap::new(),
            epoch: 0,
            discarded: false,
        }
    }

    fn entry(
        &mut self,
        source: &Source,
    ) -> &mut SourceEntry {
        self.entries.entry(source.clone()).or_default()
    }

    /// Sources whose results depend on any of `roots`, `roots` included.
    fn affected(
        &self,
        roots: &[Source],
    ) -> BTreeSet<Source> {
        let core = Source::parse(CORE_LIBRARY).ok();
        let mut dependents: HashMap<Source, Vec<Source>> = HashMap::new();
        for (source, entry) in &self.entries {
            let Some(info) = &entry.directives else {
                continue;
            };
            for directive in &info.directives {
                let Some(target) = self.factory.resolve_uri(source, &directive.uri) else {
                    continue;
                };
                if directive.kind == DirectiveKind::Part {
                    // The part resolves against its library's model.
                    dependents.entry(source.clone()).or_default().push(target.clone());
                }
                dependents.entry(target).or_default().push(source.clone());
            }
            if let Some(core) = &core
                && info.source_kind() == SourceKind::Library
                && source != core
            {
                dependents.entry(core.clone()).or_default().push(source.clone());
            }
        }

        let mut affected = BTreeSet::new();
        let mut queue: VecDeque<Source> = roots.iter().cloned().collect();
        while let Some(source) = queue.pop_front() {
            if !affected.insert(source.clone()) {
                continue;
            }
            if let Some(next) = dependents.get(&source) {
                queue.extend(next.iter().cloned());
            }
        }
        affected
    }

    fn explicit_sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> =
            self.entries.iter().filter(|(_, entry)| entry.explicit).map(|(source, _)| source.clone()).collect();
        sources.sort();
        sources
    }
}

/// The analysis state of one set of sources.
pub struct AnalysisContext {
    id: ContextId,
    state: Mutex<ContextState>,
    pipeline_locks: DashMap<Source, Arc<Mutex<()>>>,
    index: Arc<MemoryIndexStore>,
    parser: Arc<dyn UnitParser>,
    incremental_scanning: bool,
    indexing: bool,
}

impl std::fmt::Debug for AnalysisContext {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("AnalysisContext").field("id", &self.id).finish_non_exhaustive()
    }
}

impl AnalysisContext {
    pub fn new(
        factory: SourceFactory,
        index: Arc<MemoryIndexStore>,
    ) -> Self {
        Self {
            id: ContextId::next(),
            state: Mutex::new(ContextState::new(factory)),
            pipeline_locks: DashMap::new(),
            index,
            parser: Arc::new(DefaultUnitParser),
            incremental_scanning: true,
            indexing: true,
        }
    }

    /// Applies the scanner and indexing switches of `settings`.
    pub fn with_settings(
        mut self,
        settings: &AnalysisSettings,
    ) -> Self {
        self.incremental_scanning = settings.scanner.incremental;
        self.indexing = settings.indexing.enable;
        self
    }

    pub fn with_parser(
        mut self,
        parser: Arc<dyn UnitParser>,
    ) -> Self {
        self.parser = parser;
        self
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn index(&self) -> &Arc<MemoryIndexStore> {
        &self.index
    }

    pub fn source_factory(&self) -> SourceFactory {
        self.lock_state().factory.clone()
    }

    /// Replaces the factory and invalidates every cached result.
    pub fn set_source_factory(
        &self,
        factory: SourceFactory,
    ) {
        let mut state = self.lock_state();
        state.factory = factory;
        for entry in state.entries.values_mut() {
            entry.clear_contents(None);
        }
        state.libraries.clear();
        state.epoch += 1;
        self.index.clear_context(&self.id);
        debug!("[context] {}: source factory replaced", self.id.get());
    }

    // ── state plumbing ──────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self) -> Result<MutexGuard<'_, ContextState>, AnalysisError> {
        let state = self.lock_state();
        if state.discarded {
            return Err(AnalysisError::Discarded);
        }
        Ok(state)
    }

    fn pipeline_lock(
        &self,
        source: &Source,
    ) -> Arc<Mutex<()>> {
        self.pipeline_locks.entry(source.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn cached<T>(
        &self,
        source: &Source,
        read: impl FnOnce(&SourceEntry) -> Option<T>,
    ) -> Result<Option<T>, AnalysisError> {
        Ok(self.live()?.entries.get(source).and_then(read))
    }

    fn epoch(&self) -> Result<u64, AnalysisError> {
        Ok(self.live()?.epoch)
    }

    /// Applies `write` to the entry of `source` unless the state moved on
    /// since `epoch`.
    fn store(
        &self,
        epoch: u64,
        source: &Source,
        write: impl FnOnce(&mut SourceEntry),
    ) {
        let mut state = self.lock_state();
        if state.epoch == epoch && !state.discarded {
            write(state.entry(source));
        }
    }

    fn store_library(
        &self,
        epoch: u64,
        library: &Source,
        write: impl FnOnce(&mut LibraryEntry),
    ) {
        let mut state = self.lock_state();
        if state.epoch == epoch && !state.discarded {
            write(state.libraries.entry(library.clone()).or_default());
        }
    }

    // ── inventory ───────────────────────────────────────────────────────

    /// Whether `source` was added to this context and can be read.
    pub fn source_available(
        &self,
        source: &Source,
    ) -> bool {
        let Ok(state) = self.live() else {
            return false;
        };
        state.entries.get(source).is_some_and(|entry| entry.explicit) && state.factory.exists(source)
    }

    /// Added sources, sorted.
    pub fn available_sources(&self) -> Vec<Source> {
        self.live().map(|state| state.explicit_sources()).unwrap_or_default()
    }

    /// The cached kind of `source`, if it was computed.
    pub fn known_kind_of(
        &self,
        source: &Source,
    ) -> Option<SourceKind> {
        self.cached(source, SourceEntry::kind).ok().flatten()
    }

    pub fn get_or_compute_kind_of(
        &self,
        source: &Source,
    ) -> SourceKind {
        match self.directives(source) {
            Ok(info) => info.source_kind(),
            Err(err) => {
                debug!("[context] kind of {} is unknown: {}", source.short_name(), err);
                SourceKind::Unknown
            },
        }
    }

    // ── pipeline ────────────────────────────────────────────────────────

    pub fn contents(
        &self,
        source: &Source,
    ) -> Result<Arc<str>, AnalysisError> {
        let (factory, epoch) = {
            let state = self.live()?;
            if let Some(text) = state.entries.get(source).and_then(|entry| entry.contents.clone()) {
                return Ok(text);
            }
            (state.factory.clone(), state.epoch)
        };
        let text = factory.contents(source)?;
        self.store(epoch, source, |entry| entry.contents = Some(text.clone()));
        Ok(text)
    }

    /// Tokens of `source`. After an edited change only the affected region
    /// is re-lexed.
    pub fn scan(
        &self,
        source: &Source,
    ) -> Result<Arc<TokenStream>, AnalysisError> {
        if let Some(tokens) = self.cached(source, |entry| entry.tokens.clone())? {
            return Ok(tokens);
        }
        let lock = self.pipeline_lock(source);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tokens) = self.cached(source, |entry| entry.tokens.clone())? {
            return Ok(tokens);
        }
        let epoch = self.epoch()?;
        let pending = self.cached(source, |entry| entry.pending_edit.clone())?.filter(|_| self.incremental_scanning);
        let text = self.contents(source)?;
        let tokens = match pending {
            Some((old, edit)) => match rescan(&old, text.clone(), edit) {
                Ok(result) => {
                    debug!(
                        "[rescan] {}: relexed {} tokens, {} removed",
                        source.short_name(),
                        result.relexed,
                        result.removed_tokens
                    );
                    result.stream
                },
                Err(err) => {
                    debug!("[rescan] {}: {}; scanning in full", source.short_name(), err);
                    TokenStream::scan(text)
                },
            },
            None => TokenStream::scan(text),
        };
        let tokens = Arc::new(tokens);
        self.store(epoch, source, |entry| {
            entry.tokens = Some(tokens.clone());
            entry.pending_edit = None;
        });
        Ok(tokens)
    }

    pub fn directives(
        &self,
        source: &Source,
    ) -> Result<Arc<DirectiveInfo>, AnalysisError> {
        if let Some(info) = self.cached(source, |entry| entry.directives.clone())? {
            return Ok(info);
        }
        let epoch = self.epoch()?;
        let tokens = self.scan(source)?;
        let info = Arc::new(DirectiveInfo::scan(&tokens));
        self.store(epoch, source, |entry| entry.directives = Some(info.clone()));
        Ok(info)
    }

    pub fn parse(
        &self,
        source: &Source,
    ) -> Result<Arc<ParsedUnit>, AnalysisError> {
        if let Some(parsed) = self.cached(source, |entry| entry.parsed.clone())? {
            return Ok(parsed);
        }
        let epoch = self.epoch()?;
        let tokens = self.scan(source)?;
        let lock = self.pipeline_lock(source);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parsed) = self.cached(source, |entry| entry.parsed.clone())? {
            return Ok(parsed);
        }
        let parsed = Arc::new(self.parser.parse(source, &tokens));
        self.store(epoch, source, |entry| entry.parsed = Some(parsed.clone()));
        Ok(parsed)
    }

    /// The declared, unlinked model of `library` and its parts.
    fn declared_model(
        &self,
        library: &Source,
    ) -> Result<Arc<LibraryModel>, AnalysisError> {
        {
            let state = self.live()?;
            if let Some(model) = state.libraries.get(library).and_then(|entry| entry.declared.clone()) {
                return Ok(model);
            }
        }
        let epoch = self.epoch()?;
        let info = self.directives(library)?;
        if info.source_kind() != SourceKind::Library {
            return Err(AnalysisError::NotALibrary(library.clone()));
        }
        let factory = self.source_factory();
        let mut units = vec![(library.clone(), self.parse(library)?)];
        for part in info.of_kind(DirectiveKind::Part) {
            let Some(part_source) = factory.resolve_uri(library, &part.uri) else {
                continue;
            };
            match self.parse(&part_source) {
                Ok(parsed) => units.push((part_source, parsed)),
                Err(err) => debug!("[context] skipping part {}: {}", part_source.short_name(), err),
            }
        }
        let borrowed: Vec<_> = units.iter().map(|(source, parsed)| (source.clone(), &parsed.unit)).collect();
        let model = Arc::new(declare_library(self.id, library, &borrowed));
        self.store_library(epoch, library, |entry| entry.declared = Some(model.clone()));
        Ok(model)
    }

    /// Declared models of `library` and every library it reaches through
    /// imports and exports, plus `dart:core`. Only `library` itself must
    /// succeed.
    fn declared_closure(
        &self,
        library: &Source,
    ) -> Result<HashMap<Source, Arc<LibraryModel>>, AnalysisError> {
        let factory = self.source_factory();
        let mut models = HashMap::new();
        models.insert(library.clone(), self.declared_model(library)?);
        let mut queue: VecDeque<Source> = VecDeque::from([library.clone()]);
        if let Ok(core) = Source::parse(CORE_LIBRARY)
            && &core != library
            && factory.exists(&core)
        {
            queue.push_back(core);
        }
        let mut seen: HashSet<Source> = queue.iter().cloned().collect();
        while let Some(current) = queue.pop_front() {
            if !models.contains_key(&current) {
                match self.declared_model(&current) {
                    Ok(model) => {
                        models.insert(current.clone(), model);
                    },
                    Err(err) => {
                        debug!("[context] {} unavailable: {}", current.short_name(), err);
                        continue;
                    },
                }
            }
            let Ok(info) = self.directives(&current) else {
                continue;
            };
            for directive in &info.directives {
                if directive.kind == DirectiveKind::Part {
                    continue;
                }
                if let Some(target) = factory.resolve_uri(&current, &directive.uri)
                    && seen.insert(target.clone())
                {
                    queue.push_back(target);
                }
            }
        }
        Ok(models)
    }

    /// The linked model of `library`.
    pub fn library_model(
        &self,
        library: &Source,
    ) -> Result<Arc<LibraryModel>, AnalysisError> {
        if let Some(model) = self.library_model_or_none(library) {
            return Ok(model);
        }
        let epoch = self.epoch()?;
        let declared = self.declared_closure(library)?;
        let Some(model) = declared.get(library) else {
            return Err(AnalysisError::NotALibrary(library.clone()));
        };
        let linked = Arc::new(link_library(model, &declared));
        self.store_library(epoch, library, |entry| entry.linked = Some(linked.clone()));
        Ok(linked)
    }

    /// The linked model of `library` if it is cached.
    pub fn library_model_or_none(
        &self,
        library: &Source,
    ) -> Option<Arc<LibraryModel>> {
        let state = self.live().ok()?;
        state.libraries.get(library).and_then(|entry| entry.linked.clone())
    }

    /// Linked models of everything `library` can see.
    fn visible_models(
        &self,
        library: &Source,
    ) -> Result<ModelSet, AnalysisError> {
        let mut models = ModelSet::new();
        for source in self.declared_closure(library)?.into_keys() {
            match self.library_model(&source) {
                Ok(model) => models.insert(model),
                Err(err) => debug!("[context] {} not linked: {}", source.short_name(), err),
            }
        }
        Ok(models)
    }

    /// Binds the identifiers of `unit`, one of the units of `library`, and
    /// records the unit's relationships in the index.
    pub fn resolve(
        &self,
        unit: &Source,
        library: &Source,
    ) -> Result<Arc<ResolvedUnit>, AnalysisError> {
        self.resolve_with_errors(unit, library).map(|(resolved, _)| resolved)
    }

    fn resolve_with_errors(
        &self,
        unit: &Source,
        library: &Source,
    ) -> Result<(Arc<ResolvedUnit>, Arc<[Diagnostic]>), AnalysisError> {
        let cached = |entry: &SourceEntry| entry.resolved.clone().zip(entry.resolution_errors.clone());
        if let Some(resolution) = self.cached(unit, cached)? {
            return Ok(resolution);
        }
        let epoch = self.epoch()?;
        let parsed = self.parse(unit)?;
        let model = self.library_model(library)?;
        if !model.units.contains(unit) {
            return Err(AnalysisError::NotALibrary(library.clone()));
        }
        let models = self.visible_models(library)?;

        let lock = self.pipeline_lock(unit);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(resolution) = self.cached(unit, cached)? {
            return Ok(resolution);
        }
        let mut errors = Vec::new();
        let resolved = Arc::new(ElementResolver::resolve(&parsed.unit, unit, &model, &models, &mut errors));
        let errors: Arc<[Diagnostic]> = errors.into();

        let mut state = self.lock_state();
        if state.epoch == epoch && !state.discarded {
            self.index.remove_locations_in(&self.id, unit);
            if self.indexing {
                index_unit(&self.index, &parsed.unit, &resolved, &model);
            }
            let entry = state.entry(unit);
            entry.resolved = Some(resolved.clone());
            entry.resolution_errors = Some(errors.clone());
        }
        Ok((resolved, errors))
    }

    /// Resolves every unit of `library`.
    pub fn resolve_library(
        &self,
        library: &Source,
    ) -> Result<Vec<Arc<ResolvedUnit>>, AnalysisError> {
        let model = self.library_model(library)?;
        model.units.iter().map(|unit| self.resolve(unit, library)).collect()
    }

    /// The library `unit` belongs to: itself for a library, the library
    /// naming it in a `part` directive for a part.
    pub fn library_of(
        &self,
        unit: &Source,
    ) -> Result<Option<Source>, AnalysisError> {
        let info = self.directives(unit)?;
        let Some(part_of) = &info.part_of else {
            return Ok(Some(unit.clone()));
        };
        let factory = self.source_factory();
        let candidates = self.live()?.explicit_sources();
        for candidate in candidates {
            let Ok(candidate_info) = self.directives(&candidate) else {
                continue;
            };
            if candidate_info.part_of.is_some() {
                continue;
            }
            let names_unit = candidate_info
                .of_kind(DirectiveKind::Part)
                .any(|part| factory.resolve_uri(&candidate, &part.uri).as_ref() == Some(unit));
            if names_unit {
                return Ok(Some(candidate));
            }
        }
        Ok(match part_of {
            PartOf::Uri(uri) => factory.resolve_uri(unit, uri),
            PartOf::Name(_) => None,
        })
    }

    /// Lexical and syntactic problems of `source`.
    pub fn parsing_errors(
        &self,
        source: &Source,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let tokens = self.scan(source)?;
        let parsed = self.parse(source)?;
        let mut errors = scan_errors(&tokens);
        errors.extend(parsed.errors.iter().cloned());
        Ok(errors)
    }

    /// Problems found while binding the identifiers of `source`. Empty for
    /// a part whose library is unknown.
    pub fn resolution_errors(
        &self,
        source: &Source,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        if let Some(errors) = self.cached(source, |entry| entry.resolution_errors.clone())? {
            return Ok(errors.to_vec());
        }
        let Some(library) = self.library_of(source)? else {
            return Ok(Vec::new());
        };
        let (_, errors) = self.resolve_with_errors(source, &library)?;
        Ok(errors.to_vec())
    }

    /// Every diagnostic of `source`, ordered by offset.
    pub fn errors(
        &self,
        source: &Source,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let mut errors = self.parsing_errors(source)?;
        errors.extend(self.resolution_errors(source)?);
        errors.sort_by_key(|error| error.offset);
        Ok(errors)
    }

    /// Diagnostics of `source` from cached results only. Fails with
    /// [`AnalysisError::NotYetAvailable`] until `source` was scanned, parsed
    /// and resolved, which a part without a known library never is.
    pub fn computed_errors(
        &self,
        source: &Source,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let computed = self.cached(source, |entry| {
            Some((entry.tokens.clone()?, entry.parsed.clone()?, entry.resolution_errors.clone()?))
        })?;
        let Some((tokens, parsed, resolution)) = computed else {
            return Err(AnalysisError::NotYetAvailable {
                file: source.clone(),
                what: "errors",
            });
        };
        let mut errors = scan_errors(&tokens);
        errors.extend(parsed.errors.iter().cloned());
        errors.extend(resolution.iter().cloned());
        errors.sort_by_key(|error| error.offset);
        Ok(errors)
    }

    /// Runs the whole pipeline for `source`.
    pub fn analyze(
        &self,
        source: &Source,
    ) -> Result<SourceKind, AnalysisError> {
        let kind = self.directives(source)?.source_kind();
        self.errors(source)?;
        Ok(kind)
    }

    pub fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<Element> {
        let library = Source::parse(location.library_uri()).ok()?;
        let model = self.library_model(&library).ok()?;
        model.element_at(location).cloned()
    }

    // ── changes ─────────────────────────────────────────────────────────

    pub fn source_changed(
        &self,
        source: &Source,
    ) -> ChangeResult {
        self.changed(ChangeSet::new().changed(source.clone()))
    }

    pub fn source_edited(
        &self,
        source: &Source,
        edit: Edit,
    ) -> ChangeResult {
        self.changed(ChangeSet::new().edited(source.clone(), edit))
    }

    pub fn source_deleted(
        &self,
        source: &Source,
    ) -> ChangeResult {
        self.changed(ChangeSet::new().removed(source.clone()))
    }

    pub fn sources_deleted(
        &self,
        container: Arc<dyn SourceContainer>,
    ) -> ChangeResult {
        self.changed(ChangeSet::new().removed_container(container))
    }

    /// Applies `changes`, invalidating every cached result that depends on
    /// a changed or removed source.
    pub fn changed(
        &self,
        changes: ChangeSet,
    ) -> ChangeResult {
        let Ok(mut state) = self.live() else {
            return ChangeResult::default();
        };
        for source in &changes.added {
            state.entry(source).explicit = true;
        }

        let mut removed: Vec<Source> = changes.removed.clone();
        for container in &changes.removed_containers {
            removed.extend(state.entries.keys().filter(|source| container.contains(source)).cloned());
        }
        removed.sort();
        removed.dedup();

        let edits: HashMap<Source, Option<Edit>> = changes.changed.iter().cloned().collect();
        let mut roots: Vec<Source> = edits.keys().cloned().collect();
        roots.extend(removed.iter().cloned());
        let affected = state.affected(&roots);

        let mut to_resolve = Vec::new();
        for source in &affected {
            let Some(entry) = state.entries.get_mut(source) else {
                continue;
            };
            if entry.explicit && entry.kind() != Some(SourceKind::Part) && !removed.contains(source) {
                to_resolve.push(source.clone());
            }
            match edits.get(source) {
                Some(edit) => entry.clear_contents(*edit),
                None => entry.clear_resolution(),
            }
            self.index.remove_source(&self.id, source);
        }
        for source in &affected {
            state.libraries.remove(source);
        }
        for source in &removed {
            state.entries.remove(source);
            self.pipeline_locks.remove(source);
        }
        state.epoch += 1;

        let result = ChangeResult {
            invalidated: affected.into_iter().collect(),
            to_resolve,
            removed,
        };
        debug!(
            "[context] {}: {} invalidated, {} to resolve, {} removed",
            self.id.get(),
            result.invalidated.len(),
            result.to_resolve.len(),
            result.removed.len()
        );
        result
    }

    /// Libraries whose resolution a change to `changed` would invalidate.
    pub fn sources_to_resolve(
        &self,
        changed: &[Source],
    ) -> Vec<Source> {
        let Ok(state) = self.live() else {
            return Vec::new();
        };
        state
            .affected(changed)
            .into_iter()
            .filter(|source| {
                state.entries.get(source).is_some_and(|entry| entry.explicit && entry.kind() != Some(SourceKind::Part))
            })
            .collect()
    }

    /// Drops resolutions, library models and index entries, keeping
    /// contents, tokens and parsed units.
    pub fn clear_resolution(&self) {
        let mut state = self.lock_state();
        for entry in state.entries.values_mut() {
            entry.clear_resolution();
        }
        state.libraries.clear();
        state.epoch += 1;
        self.index.clear_context(&self.id);
    }

    /// Releases every cached result and removes this context from the
    /// index. Later queries fail with [`AnalysisError::Discarded`].
    pub fn discard(&self) {
        let mut state = self.lock_state();
        state.discarded = true;
        state.entries.clear();
        state.libraries.clear();
        state.epoch += 1;
        self.pipeline_locks.clear();
        self.index.remove_context(&self.id);
        debug!("[context] {}: discarded", self.id.get());
    }

    // ── extraction and merging ──────────────────────────────────────────

    /// Moves the sources in `container`, with their index entries, into a
    /// new context sharing this one's factory, index and parser.
    pub fn extract_analysis_context(
        &self,
        container: &dyn SourceContainer,
    ) -> Result<AnalysisContext, AnalysisError> {
        let mut state = self.live()?;
        let extracted = AnalysisContext {
            id: ContextId::next(),
            state: Mutex::new(ContextState::new(state.factory.clone())),
            pipeline_locks: DashMap::new(),
            index: self.index.clone(),
            parser: self.parser.clone(),
            incremental_scanning: self.incremental_scanning,
            indexing: self.indexing,
        };
        let moved: Vec<Source> = state.entries.keys().filter(|source| container.contains(source)).cloned().collect();
        let affected = state.affected(&moved);

        self.index.move_sources(&self.id, &extracted.id, container);
        {
            let mut target = extracted.lock_state();
            for source in &moved {
                if let Some(mut entry) = state.entries.remove(source) {
                    entry.clear_resolution();
                    target.entries.insert(source.clone(), entry);
                }
            }
        }
        for source in affected.iter().filter(|source| !moved.contains(*source)) {
            if let Some(entry) = state.entries.get_mut(source) {
                entry.clear_resolution();
            }
            self.index.remove_source(&self.id, source);
        }
        for source in &affected {
            state.libraries.remove(source);
        }
        state.epoch += 1;
        debug!("[context] {}: extracted {} sources into {}", self.id.get(), moved.len(), extracted.id.get());
        Ok(extracted)
    }

    /// Moves every source of `other`, with its index entries, into this
    /// context and discards `other`. Returns the number of sources moved.
    /// Leaves `other` untouched when this context was discarded.
    pub fn merge_analysis_context(
        &self,
        other: &AnalysisContext,
    ) -> Result<usize, AnalysisError> {
        if other.id == self.id {
            return Ok(0);
        }
        // Both states are locked in id order.
        let (mut state, mut other_state) = if self.id < other.id {
            let state = self.live()?;
            (state, other.lock_state())
        } else {
            let other_state = other.lock_state();
            (self.live()?, other_state)
        };
        other_state.discarded = true;
        other_state.libraries.clear();
        other_state.epoch += 1;
        let entries = std::mem::take(&mut other_state.entries);
        drop(other_state);
        other.pipeline_locks.clear();
        let moved: SourceSet = entries.keys().cloned().collect();

        self.index.move_sources(&other.id, &self.id, &moved);
        self.index.remove_context(&other.id);
        let roots: Vec<Source> = moved.iter().cloned().collect();
        for (source, mut entry) in entries {
            entry.clear_resolution();
            let explicit = entry.explicit;
            let slot = state.entry(&source);
            entry.explicit |= slot.explicit;
            if explicit || slot.contents.is_none() {
                *slot = entry;
            }
        }
        for source in state.affected(&roots) {
            if let Some(entry) = state.entries.get_mut(&source) {
                entry.clear_resolution();
            }
            if !moved.contains(&source) {
                self.index.remove_source(&self.id, &source);
            }
            state.libraries.remove(&source);
        }
        state.epoch += 1;
        if roots.is_empty() {
            warn!("[context] {}: merged an empty context {}", self.id.get(), other.id.get());
        }
        debug!("[context] {}: merged {} sources from {}", self.id.get(), roots.len(), other.id.get());
        Ok(roots.len())
    }
}

impl ContextIdentity for AnalysisContext {
    fn context_id(&self) -> ContextId {
        self.id
    }
}

impl ElementLookup for AnalysisContext {
    fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<Element> {
        AnalysisContext::element_at(self, location)
    }
}

#[cfg(test)]
#[path = "../../tests/src/context/context_tests.rs"]
mod tests;
