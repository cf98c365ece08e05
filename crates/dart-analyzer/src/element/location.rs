use std::{fmt, sync::Arc};

use serde::{Serialize, Serializer};

/// Structural key of an element: `[library uri, unit uri, name, ...]`.
///
/// Two elements computed by different passes over the same declaration have
/// equal locations. The encoded form joins components with `;` and doubles
/// any `;` inside a component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementLocation {
    components: Arc<[String]>,
}

impl ElementLocation {
    pub fn new(components: Vec<String>) -> Self {
        Self {
            components: components.into(),
        }
    }

    pub fn library(uri: &str) -> Self {
        Self::new(vec![uri.to_string()])
    }

    pub fn child(
        &self,
        component: impl Into<String>,
    ) -> Self {
        let mut components = self.components.to_vec();
        components.push(component.into());
        Self::new(components)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// URI of the library that declares the element.
    pub fn library_uri(&self) -> &str {
        self.components.first().map_or("", String::as_str)
    }

    pub fn unit_uri(&self) -> Option<&str> {
        self.components.get(1).map(String::as_str)
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(&component.replace(';', ";;"));
        }
        out
    }

    pub fn decode(encoded: &str) -> Option<Self> {
        if encoded.is_empty() {
            return None;
        }
        let mut components = Vec::new();
        let mut current = String::new();
        let mut chars = encoded.chars().peekable();
        while let Some(c) = chars.next() {
            if c != ';' {
                current.push(c);
            } else if chars.peek() == Some(&';') {
                chars.next();
                current.push(';');
            } else {
                components.push(std::mem::take(&mut current));
            }
        }
        components.push(current);
        Some(Self::new(components))
    }
}

impl fmt::Display for ElementLocation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for ElementLocation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ElementLocation({})", self.encode())
    }
}

impl Serialize for ElementLocation {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}
