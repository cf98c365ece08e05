use std::collections::HashMap;

use crate::element::Element;

/// Lexical frames from the innermost block outward to the enclosing class.
/// The library scope is consulted separately once these are exhausted.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
    frames: Vec<HashMap<String, Element>>,
}

impl Scopes {
    pub(crate) fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn define(
        &mut self,
        name: &str,
        element: &Element,
    ) {
        if name.is_empty() {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), element.clone());
        }
    }

    /// Defines every entry of a member table, keeping setter keys.
    pub(crate) fn define_all<'a>(
        &mut self,
        names: impl IntoIterator<Item = (&'a String, &'a Element)>,
    ) {
        if let Some(frame) = self.frames.last_mut() {
            frame.extend(names.into_iter().map(|(name, element)| (name.clone(), element.clone())));
        }
    }

    /// In setter context a frame's `name=` entry wins over `name`.
    pub(crate) fn lookup(
        &self,
        name: &str,
        setter: bool,
    ) -> Option<&Element> {
        let setter_key = setter.then(|| format!("{name}="));
        self.frames.iter().rev().find_map(|frame| {
            setter_key.as_ref().and_then(|key| frame.get(key)).or_else(|| frame.get(name))
        })
    }
}

/// What a label is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelTarget {
    Loop,
    Switch,
    SwitchMember,
    Statement,
}

#[derive(Debug)]
struct LabelEntry {
    name: String,
    element: Element,
    target: LabelTarget,
    function: usize,
}

pub(crate) enum LabelLookup<'a> {
    Found(&'a Element, LabelTarget),
    /// Declared, but in a function enclosing the current one.
    OuterFunction(&'a Element),
    Missing,
}

/// Labels in scope, innermost last. Each entry remembers the function
/// nesting depth it was declared at.
#[derive(Debug, Default)]
pub(crate) struct LabelScope {
    entries: Vec<LabelEntry>,
    function: usize,
}

impl LabelScope {
    pub(crate) fn enter_function(&mut self) {
        self.function += 1;
    }

    pub(crate) fn exit_function(&mut self) {
        self.function = self.function.saturating_sub(1);
    }

    pub(crate) fn mark(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn reset(
        &mut self,
        mark: usize,
    ) {
        self.entries.truncate(mark);
    }

    pub(crate) fn push(
        &mut self,
        name: &str,
        element: &Element,
        target: LabelTarget,
    ) {
        self.entries.push(LabelEntry {
            name: name.to_string(),
            element: element.clone(),
            target,
            function: self.function,
        });
    }

    pub(crate) fn lookup(
        &self,
        name: &str,
    ) -> LabelLookup<'_> {
        match self.entries.iter().rev().find(|entry| entry.name == name) {
            Some(entry) if entry.function == self.function => LabelLookup::Found(&entry.element, entry.target),
            Some(entry) => LabelLookup::OuterFunction(&entry.element),
            None => LabelLookup::Missing,
        }
    }
}
