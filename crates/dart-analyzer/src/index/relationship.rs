use serde::Serialize;

/// How a location relates to the element a record is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Relationship {
    IsDefinedBy,
    IsReferencedBy,
    IsReferencedByQualified,
    IsInvokedBy,
    IsInvokedByQualified,
    IsReadBy,
    IsWrittenBy,
    IsExtendedBy,
    IsImplementedBy,
    IsMixedInBy,
}

impl Relationship {
    pub const ALL: [Relationship; 10] = [
        Relationship::IsDefinedBy,
        Relationship::IsReferencedBy,
        Relationship::IsReferencedByQualified,
        Relationship::IsInvokedBy,
        Relationship::IsInvokedByQualified,
        Relationship::IsReadBy,
        Relationship::IsWrittenBy,
        Relationship::IsExtendedBy,
        Relationship::IsImplementedBy,
        Relationship::IsMixedInBy,
    ];

    /// Stable identifier used by the persisted index format.
    pub fn id(self) -> &'static str {
        match self {
            Relationship::IsDefinedBy => "is-defined-by",
            Relationship::IsReferencedBy => "is-referenced-by",
            Relationship::IsReferencedByQualified => "is-referenced-by-qualified",
            Relationship::IsInvokedBy => "is-invoked-by",
            Relationship::IsInvokedByQualified => "is-invoked-by-qualified",
            Relationship::IsReadBy => "is-read-by",
            Relationship::IsWrittenBy => "is-written-by",
            Relationship::IsExtendedBy => "is-extended-by",
            Relationship::IsImplementedBy => "is-implemented-by",
            Relationship::IsMixedInBy => "is-mixed-in-by",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|relationship| relationship.id() == id)
    }
}
