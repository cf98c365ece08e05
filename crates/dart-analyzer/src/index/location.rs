use crate::element::Element;

/// Where a relationship occurs: the element whose body contains the
/// reference, plus the referencing range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub element: Element,
    pub offset: usize,
    pub length: usize,
    /// Import prefix qualifying the reference, as in `p.A`.
    pub import_prefix: Option<String>,
}

impl Location {
    pub fn new(
        element: Element,
        offset: usize,
        length: usize,
    ) -> Self {
        Self {
            element,
            offset,
            length,
            import_prefix: None,
        }
    }

    pub fn with_prefix(
        mut self,
        prefix: impl Into<String>,
    ) -> Self {
        self.import_prefix = Some(prefix.into());
        self
    }
}
