use std::{
    collections::{HashMap, HashSet},
    io::{Read, Write},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::{debug, warn};

use super::{
    Location, Relationship,
    codec::{self, LocationData, RecordData},
};
use crate::{
    element::{ContextId, Element, ElementLocation, ElementLookup},
    error::IndexError,
    vfs::{Source, SourceContainer},
};

pub use crate::element::ContextIdentity;

type RelationKey = (Element, Relationship);

/// Records keyed by elements owned by one context.
#[derive(Debug, Default)]
struct ContextBucket {
    relations: HashMap<RelationKey, Vec<Location>>,
    /// For each source of this context, the keys (in any bucket) whose
    /// element or one of whose locations comes from that source.
    sources: HashMap<Source, HashSet<(ContextId, RelationKey)>>,
}

#[derive(Debug, Default)]
struct StoreState {
    buckets: HashMap<ContextId, ContextBucket>,
    removed: HashSet<ContextId>,
}

impl StoreState {
    fn bucket(
        &mut self,
        context: ContextId,
    ) -> &mut ContextBucket {
        self.buckets.entry(context).or_default()
    }

    fn record(
        &mut self,
        element: Element,
        relationship: Relationship,
        location: Location,
    ) -> bool {
        let Some(location_source) = location.element.source().cloned() else {
            return false;
        };
        let owner = element.context();
        let location_context = location.element.context();
        if self.removed.contains(&owner) || self.removed.contains(&location_context) {
            return false;
        }
        let key = (element, relationship);
        if let Some(element_source) = key.0.source().cloned() {
            self.bucket(owner).sources.entry(element_source).or_default().insert((owner, key.clone()));
        }
        self.bucket(location_context).sources.entry(location_source).or_default().insert((owner, key.clone()));
        self.bucket(owner).relations.entry(key).or_default().push(location);
        true
    }

    fn unlink(
        &mut self,
        context: ContextId,
        source: &Source,
        entry: &(ContextId, RelationKey),
    ) {
        if let Some(bucket) = self.buckets.get_mut(&context)
            && let Some(keys) = bucket.sources.get_mut(source)
        {
            keys.remove(entry);
            if keys.is_empty() {
                bucket.sources.remove(source);
            }
        }
    }

    /// Drops the reverse entries of a key that no longer has locations:
    /// the one under its element's source and one per former location.
    fn unlink_key(
        &mut self,
        owner: ContextId,
        key: &RelationKey,
        locations: &[Location],
    ) {
        let entry = (owner, key.clone());
        if let Some(source) = key.0.source() {
            self.unlink(owner, source, &entry);
        }
        for location in locations {
            if let Some(source) = location.element.source() {
                self.unlink(location.element.context(), source, &entry);
            }
        }
    }

    /// Drops the reverse entries other buckets hold for keys of a bucket
    /// that is going away.
    fn unlink_bucket(
        &mut self,
        context: ContextId,
        bucket: &ContextBucket,
    ) {
        for (key, locations) in &bucket.relations {
            let entry = (context, key.clone());
            for location in locations.iter().filter(|location| location.element.context() != context) {
                if let Some(source) = location.element.source() {
                    self.unlink(location.element.context(), source, &entry);
                }
            }
        }
    }

    /// Detaches every record touching `source` of `context`: keys declared
    /// there lose all their locations, other keys lose the locations found
    /// there. Returns what was detached.
    fn take_source(
        &mut self,
        context: ContextId,
        source: &Source,
    ) -> Vec<(RelationKey, Vec<Location>)> {
        let Some(keys) = self.buckets.get_mut(&context).and_then(|bucket| bucket.sources.remove(source)) else {
            return Vec::new();
        };
        let in_source = |element: &Element| element.context() == context && element.source() == Some(source);
        let mut taken = Vec::new();
        for (owner, key) in keys {
            if in_source(&key.0) {
                let Some(locations) = self.buckets.get_mut(&owner).and_then(|bucket| bucket.relations.remove(&key))
                else {
                    continue;
                };
                self.unlink_key(owner, &key, &locations);
                taken.push((key, locations));
                continue;
            }
            let Some(locations) = self.buckets.get_mut(&owner).and_then(|bucket| bucket.relations.get_mut(&key))
            else {
                continue;
            };
            let (detached, kept): (Vec<_>, Vec<_>) =
                std::mem::take(locations).into_iter().partition(|location| in_source(&location.element));
            let emptied = kept.is_empty();
            *locations = kept;
            if emptied {
                if let Some(bucket) = self.buckets.get_mut(&owner) {
                    bucket.relations.remove(&key);
                }
                self.unlink_key(owner, &key, &[]);
            }
            if !detached.is_empty() {
                taken.push((key, detached));
            }
        }
        taken
    }

    /// Drops the locations found in `source` of `context`. Keys declared
    /// there keep the locations other sources contributed. Returns the
    /// number of locations dropped.
    fn take_locations(
        &mut self,
        context: ContextId,
        source: &Source,
    ) -> usize {
        let Some(keys) = self.buckets.get_mut(&context).and_then(|bucket| bucket.sources.remove(source)) else {
            return 0;
        };
        let in_source = |element: &Element| element.context() == context && element.source() == Some(source);
        let mut dropped = 0;
        let mut still_declared = HashSet::new();
        for (owner, key) in keys {
            let Some(locations) = self.buckets.get_mut(&owner).and_then(|bucket| bucket.relations.get_mut(&key))
            else {
                continue;
            };
            let before = locations.len();
            locations.retain(|location| !in_source(&location.element));
            dropped += before - locations.len();
            if !locations.is_empty() {
                if in_source(&key.0) {
                    still_declared.insert((owner, key));
                }
                continue;
            }
            if let Some(bucket) = self.buckets.get_mut(&owner) {
                bucket.relations.remove(&key);
            }
            self.unlink_key(owner, &key, &[]);
        }
        if !still_declared.is_empty() {
            self.bucket(context).sources.insert(source.clone(), still_declared);
        }
        dropped
    }

    fn location_count(&self) -> usize {
        self.buckets.values().map(ContextBucket::location_count).sum()
    }
}

impl ContextBucket {
    fn location_count(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }
}

/// In-memory relationship index shared by every analysis context.
///
/// Records are bucketed by the context owning the element they are keyed
/// by. Removing a context drops its bucket together with every location,
/// in other buckets, whose element it owned; afterwards that context is
/// remembered as removed and anything recorded against it is ignored.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    state: RwLock<StoreState>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records that `element` relates to `location`. Ignored when the
    /// location has no source or either side belongs to a removed context.
    /// Returns whether the location was stored.
    pub fn record_relationship(
        &self,
        element: &Element,
        relationship: Relationship,
        location: Location,
    ) -> bool {
        self.write().record(element.clone(), relationship, location)
    }

    pub fn get_relationships(
        &self,
        element: &Element,
        relationship: Relationship,
    ) -> Vec<Location> {
        let state = self.read();
        state
            .buckets
            .get(&element.context())
            .and_then(|bucket| bucket.relations.get(&(element.clone(), relationship)))
            .cloned()
            .unwrap_or_default()
    }

    pub fn remove_context(
        &self,
        context: &(impl ContextIdentity + ?Sized),
    ) {
        let context = context.context_id();
        let mut state = self.write();
        state.removed.insert(context);
        let Some(bucket) = state.buckets.remove(&context) else {
            return;
        };
        state.unlink_bucket(context, &bucket);
        let mut foreign = 0;
        for (owner, key) in bucket.sources.values().flatten() {
            if *owner == context {
                continue;
            }
            let Some(locations) = state.buckets.get_mut(owner).and_then(|other| other.relations.get_mut(key)) else {
                continue;
            };
            let before = locations.len();
            locations.retain(|location| location.element.context() != context);
            foreign += before - locations.len();
            if locations.is_empty() {
                if let Some(other) = state.buckets.get_mut(owner) {
                    other.relations.remove(key);
                }
                state.unlink_key(*owner, key, &[]);
            }
        }
        debug!(
            "[index] removed context {}: {} keys, {} foreign locations",
            context.get(),
            bucket.relations.len(),
            foreign
        );
    }

    /// Drops every record of `context` without tombstoning it.
    pub fn clear_context(
        &self,
        context: &(impl ContextIdentity + ?Sized),
    ) {
        let context = context.context_id();
        let mut state = self.write();
        let sources: Vec<Source> =
            state.buckets.get(&context).map(|bucket| bucket.sources.keys().cloned().collect()).unwrap_or_default();
        for source in sources {
            state.take_source(context, &source);
        }
        if let Some(bucket) = state.buckets.remove(&context) {
            state.unlink_bucket(context, &bucket);
        }
    }

    pub fn remove_source(
        &self,
        context: &(impl ContextIdentity + ?Sized),
        source: &Source,
    ) {
        let context = context.context_id();
        let taken = self.write().take_source(context, source);
        if !taken.is_empty() {
            debug!("[index] removed {} records of {}", taken.len(), source.short_name());
        }
    }

    /// Drops only the locations `source` of `context` contributed, keeping
    /// what other sources recorded against its declarations. Used before a
    /// source is indexed again.
    pub fn remove_locations_in(
        &self,
        context: &(impl ContextIdentity + ?Sized),
        source: &Source,
    ) -> usize {
        self.write().take_locations(context.context_id(), source)
    }

    pub fn remove_sources(
        &self,
        context: &(impl ContextIdentity + ?Sized),
        container: &dyn SourceContainer,
    ) {
        let context = context.context_id();
        let mut state = self.write();
        for source in sources_in(&state, context, container) {
            state.take_source(context, &source);
        }
    }

    /// Re-homes every record touching a source in `container` from one
    /// context to another, in one step.
    pub fn move_sources(
        &self,
        from: &(impl ContextIdentity + ?Sized),
        to: &(impl ContextIdentity + ?Sized),
        container: &dyn SourceContainer,
    ) {
        let (from, to) = (from.context_id(), to.context_id());
        let mut state = self.write();
        let sources = sources_in(&state, from, container);
        let moves = |element: &Element| {
            if element.context() == from && element.source().is_some_and(|source| container.contains(source)) {
                element.with_context(to)
            } else {
                element.clone()
            }
        };
        let mut moved = 0;
        for source in &sources {
            for ((element, relationship), locations) in state.take_source(from, source) {
                let element = moves(&element);
                for location in locations {
                    let location = Location {
                        element: moves(&location.element),
                        ..location
                    };
                    moved += usize::from(state.record(element.clone(), relationship, location));
                }
            }
        }
        debug!("[index] moved {} locations of {} sources to context {}", moved, sources.len(), to.get());
    }

    /// Writes every record keyed by an element of `context`.
    pub fn write_index(
        &self,
        context: &(impl ContextIdentity + ?Sized),
        sink: &mut dyn Write,
    ) -> Result<(), IndexError> {
        let context = context.context_id();
        let records = {
            let state = self.read();
            let mut records: Vec<RecordData> = state
                .buckets
                .get(&context)
                .map(|bucket| {
                    bucket
                        .relations
                        .iter()
                        .map(|((element, relationship), locations)| RecordData {
                            element: element.location().encode(),
                            relationship: *relationship,
                            locations: locations
                                .iter()
                                .map(|location| LocationData {
                                    element: location.element.location().encode(),
                                    offset: location.offset,
                                    length: location.length,
                                    prefix: location.import_prefix.clone(),
                                })
                                .collect(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            records.sort_by(|a, b| (&a.element, a.relationship).cmp(&(&b.element, b.relationship)));
            records
        };
        codec::encode(&records, sink)?;
        debug!("[index] wrote {} records of context {}", records.len(), context.get());
        Ok(())
    }

    /// Restores records persisted by [`Self::write_index`] into the context
    /// of `lookup`. Nothing is committed unless the whole stream decodes;
    /// records whose elements no longer exist are skipped.
    pub fn read_index(
        &self,
        lookup: &dyn ElementLookup,
        source: &mut dyn Read,
    ) -> Result<usize, IndexError> {
        let records = codec::decode(source)?;
        let resolve = |encoded: &str| -> Result<Option<Element>, IndexError> {
            let location = ElementLocation::decode(encoded)
                .ok_or_else(|| IndexError::Malformed("empty element location".to_string()))?;
            Ok(lookup.element_at(&location))
        };

        let mut staged = Vec::new();
        let mut skipped = 0;
        for record in records {
            let Some(element) = resolve(&record.element)? else {
                skipped += record.locations.len();
                continue;
            };
            for location in record.locations {
                let Some(location_element) = resolve(&location.element)? else {
                    skipped += 1;
                    continue;
                };
                staged.push((element.clone(), record.relationship, Location {
                    element: location_element,
                    offset: location.offset,
                    length: location.length,
                    import_prefix: location.prefix,
                }));
            }
        }

        let mut state = self.write();
        let mut committed = 0;
        for (element, relationship, location) in staged {
            committed += usize::from(state.record(element, relationship, location));
        }
        drop(state);
        if skipped > 0 {
            warn!("[index] skipped {} locations with unknown elements", skipped);
        }
        debug!("[index] read {} locations into context {}", committed, lookup.context_id().get());
        Ok(committed)
    }

    pub fn internal_location_count(&self) -> usize {
        self.read().location_count()
    }

    pub fn internal_location_count_in(
        &self,
        context: &(impl ContextIdentity + ?Sized),
    ) -> usize {
        self.read().buckets.get(&context.context_id()).map_or(0, ContextBucket::location_count)
    }

    pub fn internal_key_count(&self) -> usize {
        self.read().buckets.values().map(|bucket| bucket.relations.len()).sum()
    }
}

fn sources_in(
    state: &StoreState,
    context: ContextId,
    container: &dyn SourceContainer,
) -> Vec<Source> {
    state
        .buckets
        .get(&context)
        .map(|bucket| bucket.sources.keys().filter(|source| container.contains(source)).cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/src/index/store_tests.rs"]
mod tests;
