use std::collections::{HashMap, HashSet};

use super::*;
use crate::{
    element::ElementKind,
    index::{INDEX_FORMAT_VERSION, read_summary},
    vfs::SourceSet,
};

fn source(uri: &str) -> Source {
    Source::parse(uri).expect("valid uri")
}

fn element(
    context: ContextId,
    uri: &str,
    name: &str,
    offset: usize,
) -> Element {
    let location = ElementLocation::library(uri).child(uri).child(name);
    Element::new(ElementKind::Function, name, location, context, Some(source(uri)), offset)
}

fn synthetic(context: ContextId) -> Element {
    Element::new(ElementKind::Library, "synthetic", ElementLocation::library("dart:synthetic"), context, None, 0)
}

struct Lookup {
    context: ContextId,
    elements: HashMap<ElementLocation, Element>,
}

impl Lookup {
    fn new(
        context: ContextId,
        elements: &[&Element],
    ) -> Self {
        Self {
            context,
            elements: elements
                .iter()
                .map(|element| (element.location().clone(), element.with_context(context)))
                .collect(),
        }
    }
}

impl ContextIdentity for Lookup {
    fn context_id(&self) -> ContextId {
        self.context
    }
}

impl ElementLookup for Lookup {
    fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<Element> {
        self.elements.get(location).cloned()
    }
}

#[test]
fn records_and_queries_relationships() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let callee = element(context, "file:///a.dart", "callee", 0);
    let caller = element(context, "file:///b.dart", "caller", 0);
    store.record_relationship(&callee, Relationship::IsInvokedBy, Location::new(caller.clone(), 10, 6));
    store.record_relationship(&callee, Relationship::IsInvokedBy, Location::new(caller.clone(), 30, 6));
    store.record_relationship(&callee, Relationship::IsReferencedBy, Location::new(caller, 50, 6));

    let invoked = store.get_relationships(&callee, Relationship::IsInvokedBy);
    let mut offsets: Vec<usize> = invoked.iter().map(|location| location.offset).collect();
    offsets.sort_unstable();
    assert_eq!(offsets, [10, 30]);
    assert_eq!(store.get_relationships(&callee, Relationship::IsReadBy), []);
    assert_eq!(store.internal_key_count(), 2);
    assert_eq!(store.internal_location_count(), 3);
}

#[test]
fn locations_without_a_source_are_ignored() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let callee = element(context, "file:///a.dart", "callee", 0);
    store.record_relationship(&callee, Relationship::IsReferencedBy, Location::new(synthetic(context), 0, 1));
    assert_eq!(store.internal_location_count(), 0);
}

#[test]
fn removing_a_context_drops_both_endpoints() {
    let store = MemoryIndexStore::new();
    let (first, second) = (ContextId::next(), ContextId::next());
    let a = element(first, "file:///a.dart", "a", 0);
    let b = element(second, "file:///b.dart", "b", 0);
    let c = element(second, "file:///c.dart", "c", 0);
    // keyed in `second`, located in `first`
    store.record_relationship(&b, Relationship::IsReferencedBy, Location::new(a.clone(), 1, 1));
    store.record_relationship(&b, Relationship::IsReferencedBy, Location::new(c.clone(), 2, 1));
    // keyed in `first`, located in `second`
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(c.clone(), 3, 1));
    assert_eq!(store.internal_location_count_in(&first), 1);
    assert_eq!(store.internal_location_count_in(&second), 2);

    store.remove_context(&first);
    assert_eq!(store.internal_location_count_in(&first), 0);
    assert_eq!(store.get_relationships(&a, Relationship::IsInvokedBy), []);
    let remaining = store.get_relationships(&b, Relationship::IsReferencedBy);
    assert_eq!(remaining, [Location::new(c.clone(), 2, 1)]);
    assert_eq!(store.internal_location_count(), 1);

    // Recording against the removed context, on either side, is a no-op.
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(c.clone(), 4, 1));
    store.record_relationship(&c, Relationship::IsInvokedBy, Location::new(a, 5, 1));
    assert_eq!(store.internal_location_count(), 1);

    store.remove_context(&second);
    assert_eq!(store.internal_location_count(), 0);
    assert_eq!(store.internal_key_count(), 0);
}

#[test]
fn removing_a_source_drops_its_declarations_and_references() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    let b = element(context, "file:///b.dart", "b", 0);
    let c = element(context, "file:///c.dart", "c", 0);
    store.record_relationship(&a, Relationship::IsReferencedBy, Location::new(b.clone(), 1, 1));
    store.record_relationship(&c, Relationship::IsReferencedBy, Location::new(b.clone(), 2, 1));
    store.record_relationship(&c, Relationship::IsReferencedBy, Location::new(a.clone(), 3, 1));

    store.remove_source(&context, &source("file:///a.dart"));
    assert_eq!(store.get_relationships(&a, Relationship::IsReferencedBy), []);
    assert_eq!(store.get_relationships(&c, Relationship::IsReferencedBy), [Location::new(b, 2, 1)]);

    let rest: SourceSet = [source("file:///b.dart"), source("file:///c.dart")].into_iter().collect();
    store.remove_sources(&context, &rest);
    assert_eq!(store.internal_location_count(), 0);
}

#[test]
fn moved_sources_change_owner() {
    let store = MemoryIndexStore::new();
    let (from, to) = (ContextId::next(), ContextId::next());
    let a = element(from, "file:///a.dart", "a", 0);
    let b = element(from, "file:///b.dart", "b", 0);
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(b.clone(), 7, 1));
    store.record_relationship(&b, Relationship::IsReferencedBy, Location::new(b.clone(), 9, 1));

    let moved: SourceSet = [source("file:///a.dart")].into_iter().collect();
    store.move_sources(&from, &to, &moved);

    let a_moved = a.with_context(to);
    assert_eq!(store.get_relationships(&a, Relationship::IsInvokedBy), []);
    assert_eq!(store.get_relationships(&a_moved, Relationship::IsInvokedBy), [Location::new(b.clone(), 7, 1)]);
    assert_eq!(store.get_relationships(&b, Relationship::IsReferencedBy).len(), 1);
    assert_eq!(store.internal_location_count_in(&to), 1);
    assert_eq!(store.internal_location_count_in(&from), 1);
}

#[test]
fn persisted_index_round_trips() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    let b = element(context, "file:///b.dart", "b;with;separators", 4);
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(b.clone(), 12, 1));
    store.record_relationship(&a, Relationship::IsReferencedBy, Location::new(b.clone(), 20, 1).with_prefix("p"));

    let mut bytes = Vec::new();
    store.write_index(&context, &mut bytes).expect("write");
    assert_eq!(bytes[..4], INDEX_FORMAT_VERSION.to_be_bytes());

    let restored = MemoryIndexStore::new();
    let target = ContextId::next();
    let lookup = Lookup::new(target, &[&a, &b]);
    let committed = restored.read_index(&lookup, &mut bytes.as_slice()).expect("read");
    assert_eq!(committed, 2);

    let (a, b) = (a.with_context(target), b.with_context(target));
    assert_eq!(restored.get_relationships(&a, Relationship::IsInvokedBy), [Location::new(b.clone(), 12, 1)]);
    assert_eq!(restored.get_relationships(&a, Relationship::IsReferencedBy), [
        Location::new(b, 20, 1).with_prefix("p")
    ]);
}

#[test]
fn unknown_elements_are_skipped_on_read() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    let gone = element(context, "file:///gone.dart", "gone", 0);
    store.record_relationship(&a, Relationship::IsReferencedBy, Location::new(gone.clone(), 1, 1));
    store.record_relationship(&a, Relationship::IsReferencedBy, Location::new(a.clone(), 2, 1));
    let mut bytes = Vec::new();
    store.write_index(&context, &mut bytes).expect("write");

    let restored = MemoryIndexStore::new();
    let lookup = Lookup::new(context, &[&a]);
    assert_eq!(restored.read_index(&lookup, &mut bytes.as_slice()).expect("read"), 1);
}

#[test]
fn incompatible_versions_are_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&99_i32.to_be_bytes());
    bytes.extend_from_slice(&0_i32.to_be_bytes());
    let store = MemoryIndexStore::new();
    let lookup = Lookup::new(ContextId::next(), &[]);
    let err = store.read_index(&lookup, &mut bytes.as_slice()).expect_err("version mismatch");
    assert!(matches!(err, IndexError::IncompatibleFormat { found: 99, .. }), "{err}");
}

#[test]
fn truncated_streams_leave_the_store_untouched() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    for offset in 0..3 {
        store.record_relationship(&a, Relationship::IsReadBy, Location::new(a.clone(), offset, 1));
    }
    let mut bytes = Vec::new();
    store.write_index(&context, &mut bytes).expect("write");

    let restored = MemoryIndexStore::new();
    let lookup = Lookup::new(context, &[&a]);
    for cut in [2, 6, bytes.len() - 1] {
        let err = restored.read_index(&lookup, &mut &bytes[..cut]).expect_err("truncated");
        assert!(matches!(err, IndexError::Truncated), "cut at {cut}: {err}");
    }
    assert_eq!(restored.internal_location_count(), 0);
}

#[test]
fn summaries_count_keys_and_locations() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    store.record_relationship(&a, Relationship::IsReadBy, Location::new(a.clone(), 1, 1));
    store.record_relationship(&a, Relationship::IsWrittenBy, Location::new(a.clone(), 2, 1));
    store.record_relationship(&a, Relationship::IsWrittenBy, Location::new(a.clone(), 3, 1));
    let mut bytes = Vec::new();
    store.write_index(&context, &mut bytes).expect("write");
    let summary = read_summary(&mut bytes.as_slice()).expect("summary");
    assert_eq!((summary.keys, summary.locations), (2, 3));
}

fn reverse_entries(store: &MemoryIndexStore) -> usize {
    store.read().buckets.values().flat_map(|bucket| bucket.sources.values()).map(HashSet::len).sum()
}

#[test]
fn removing_locations_keeps_what_other_sources_recorded() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    let b = element(context, "file:///b.dart", "b", 0);
    let c = element(context, "file:///c.dart", "c", 0);
    store.record_relationship(&a, Relationship::IsDefinedBy, Location::new(a.clone(), 0, 1));
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(b.clone(), 4, 1));
    store.record_relationship(&c, Relationship::IsReferencedBy, Location::new(a.clone(), 8, 1));

    assert_eq!(store.remove_locations_in(&context, &source("file:///a.dart")), 2);
    assert_eq!(store.get_relationships(&a, Relationship::IsDefinedBy), []);
    assert_eq!(store.get_relationships(&a, Relationship::IsInvokedBy), [Location::new(b.clone(), 4, 1)]);
    assert_eq!(store.get_relationships(&c, Relationship::IsReferencedBy), []);

    // Keys declared in a.dart are still purged with it.
    store.remove_source(&context, &source("file:///a.dart"));
    assert_eq!(store.internal_location_count(), 0);
    assert_eq!(reverse_entries(&store), 0);
}

#[test]
fn dropped_keys_leave_no_reverse_entries() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let a = element(context, "file:///a.dart", "a", 0);
    let b = element(context, "file:///b.dart", "b", 0);
    let c = element(context, "file:///c.dart", "c", 0);
    store.record_relationship(&a, Relationship::IsReferencedBy, Location::new(b.clone(), 1, 1));
    store.record_relationship(&c, Relationship::IsReferencedBy, Location::new(b.clone(), 2, 1));
    assert_eq!(reverse_entries(&store), 4);

    store.remove_source(&context, &source("file:///a.dart"));
    assert_eq!(reverse_entries(&store), 2);
    store.remove_source(&context, &source("file:///b.dart"));
    assert_eq!(reverse_entries(&store), 0);
    assert!(store.read().buckets.values().all(|bucket| bucket.sources.is_empty()));
}

#[test]
fn removed_contexts_leave_no_reverse_entries_behind() {
    let store = MemoryIndexStore::new();
    let (first, second) = (ContextId::next(), ContextId::next());
    let a = element(first, "file:///a.dart", "a", 0);
    let b = element(second, "file:///b.dart", "b", 0);
    let c = element(second, "file:///c.dart", "c", 0);
    store.record_relationship(&b, Relationship::IsReferencedBy, Location::new(a.clone(), 1, 1));
    store.record_relationship(&b, Relationship::IsReferencedBy, Location::new(c.clone(), 2, 1));
    store.record_relationship(&a, Relationship::IsInvokedBy, Location::new(c.clone(), 3, 1));

    store.remove_context(&first);
    // Only `b`, under b.dart and c.dart, remains.
    assert_eq!(reverse_entries(&store), 2);
    store.clear_context(&second);
    assert_eq!(reverse_entries(&store), 0);
}

#[test]
fn recording_reports_whether_the_location_was_stored() {
    let store = MemoryIndexStore::new();
    let (live, removed) = (ContextId::next(), ContextId::next());
    let a = element(live, "file:///a.dart", "a", 0);
    let gone = element(removed, "file:///gone.dart", "gone", 0);
    assert!(store.record_relationship(&a, Relationship::IsReadBy, Location::new(a.clone(), 1, 1)));
    assert!(!store.record_relationship(&a, Relationship::IsReadBy, Location::new(synthetic(live), 2, 1)));
    store.remove_context(&removed);
    assert!(!store.record_relationship(&a, Relationship::IsReadBy, Location::new(gone.clone(), 3, 1)));
    assert!(!store.record_relationship(&gone, Relationship::IsReadBy, Location::new(a, 4, 1)));
    assert_eq!(store.internal_location_count(), 1);
}

#[test]
fn oversized_strings_are_rejected_on_write() {
    let store = MemoryIndexStore::new();
    let context = ContextId::next();
    let long = element(context, "file:///a.dart", &"x".repeat(1 << 20), 0);
    store.record_relationship(&long, Relationship::IsReadBy, Location::new(long.clone(), 1, 1));
    let err = store.write_index(&context, &mut Vec::new()).expect_err("string over the limit");
    assert!(matches!(err, IndexError::Malformed(_)), "{err}");
}
