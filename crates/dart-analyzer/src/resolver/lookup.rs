use std::collections::HashSet;

use crate::element::{ClassInfo, DartType, Element, ElementDetail, ElementModel};

/// First-match member lookup over the supertype graph.
///
/// Searches the class itself, then its mixins (last applied first), then its
/// interfaces depth-first, then its superclass. Every query carries its own
/// visited set, so cyclic hierarchies terminate. This does not model Dart's
/// real override rules; a member inherited through an interface can shadow
/// one from the superclass.
pub(crate) struct MemberLookup<'a> {
    models: &'a dyn ElementModel,
    /// Class used for unbounded type parameters.
    object: Option<&'a Element>,
}

impl<'a> MemberLookup<'a> {
    pub(crate) fn new(
        models: &'a dyn ElementModel,
        object: Option<&'a Element>,
    ) -> Self {
        Self {
            models,
            object,
        }
    }

    pub(crate) fn class_info(
        &self,
        class: &Element,
    ) -> Option<&'a ClassInfo> {
        self.models.info(class)?.class()
    }

    /// The class whose members a value of `ty` exposes.
    pub(crate) fn class_of(
        &self,
        ty: &DartType,
    ) -> Option<Element> {
        let mut seen = HashSet::new();
        let mut current = ty.clone();
        loop {
            match current {
                DartType::Interface(class) => return Some(class),
                DartType::TypeParameter(parameter) => {
                    if !seen.insert(parameter.clone()) {
                        return self.object.cloned();
                    }
                    let bound = match self.models.info(&parameter).map(|info| &info.detail) {
                        Some(ElementDetail::TypeParameter {
                            bound: Some(bound),
                        }) => bound.clone(),
                        _ => return self.object.cloned(),
                    };
                    current = bound;
                },
                _ => return None,
            }
        }
    }

    pub(crate) fn member(
        &self,
        ty: &DartType,
        name: &str,
    ) -> Option<Element> {
        let class = self.class_of(ty)?;
        self.member_of_class(&class, name)
    }

    pub(crate) fn member_of_class(
        &self,
        class: &Element,
        name: &str,
    ) -> Option<Element> {
        let mut visited = HashSet::new();
        self.search(class, name, &mut visited)
    }

    fn search(
        &self,
        class: &Element,
        name: &str,
        visited: &mut HashSet<Element>,
    ) -> Option<Element> {
        if !visited.insert(class.clone()) {
            return None;
        }
        let info = self.class_info(class)?;
        if let Some(member) = info.members.get(name) {
            return Some(member.clone());
        }
        let inherited = info.mixins.iter().rev().chain(&info.interfaces).chain(&info.supertype);
        for supertype in inherited {
            if let Some(found) = supertype.element().and_then(|next| self.search(next, name, visited)) {
                return Some(found);
            }
        }
        None
    }

    pub(crate) fn constructor(
        &self,
        class: &Element,
        name: &str,
    ) -> Option<Element> {
        self.class_info(class)?.constructors.get(name).cloned()
    }

    /// Supertype of `class`, as written or implied.
    pub(crate) fn supertype(
        &self,
        class: &Element,
    ) -> DartType {
        self.class_info(class).and_then(|info| info.supertype.clone()).unwrap_or(DartType::Dynamic)
    }
}
