//! Context-partitioned index of relationships between elements and the
//! places that define, reference, invoke, read or write them.

mod codec;
mod contributor;
mod location;
mod relationship;
mod store;

pub use codec::{INDEX_FORMAT_VERSION, IndexSummary, read_summary};
pub use contributor::index_unit;
pub use location::Location;
pub use relationship::Relationship;
pub use store::{ContextIdentity, MemoryIndexStore};
