//! Vertex and edge values as seen by the index layer.
//!
//! Elements are compared and hashed by identity (kind and id), so an index
//! entry keeps tracking an element while its properties change. The index
//! never mutates an element; it stores the value it is given and hands out
//! [`Element::detached`] copies.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collections::Dictionary;
use crate::types::{ElementId, PropValue};

/// Which registry an element type belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Graph vertices.
    Vertex,
    /// Graph edges.
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => write!(f, "vertex"),
            ElementKind::Edge => write!(f, "edge"),
        }
    }
}

/// Lifecycle state of an element.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Visible to queries.
    #[default]
    Active,
    /// Soft-deleted; skipped by scans.
    Removed,
}

/// Common surface of indexable graph elements.
pub trait Element: Clone + Eq + Hash + Send + Sync + 'static {
    /// Registry this element type is indexed in.
    const KIND: ElementKind;

    /// Identity of the element.
    fn id(&self) -> ElementId;

    /// Element label.
    fn label(&self) -> &str;

    /// Property dictionary.
    fn properties(&self) -> &Dictionary;

    /// Whether the element has been soft-deleted.
    fn is_removed(&self) -> bool;

    /// Copy whose property storage is not shared with `self`.
    fn detached(&self) -> Self;

    /// Shorthand for `self.properties().property(key)`.
    fn property(&self, key: &str) -> Option<&PropValue> {
        self.properties().property(key)
    }
}

/// Graph vertex.
#[derive(Clone, Debug)]
pub struct Vertex {
    id: ElementId,
    label: Arc<str>,
    properties: Dictionary,
    state: Lifecycle,
}

impl Vertex {
    /// Active vertex with no properties.
    pub fn new(id: u64, label: &str) -> Self {
        Self {
            id: ElementId(id),
            label: Arc::from(label),
            properties: Dictionary::empty(),
            state: Lifecycle::Active,
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Sets a property in place.
    pub fn set_property(&mut self, key: &str, value: impl Into<PropValue>) {
        let props = std::mem::take(&mut self.properties);
        self.properties = props.set_property(key, value);
    }

    /// Removes a property in place.
    pub fn remove_property(&mut self, key: &str) {
        let props = std::mem::take(&mut self.properties);
        self.properties = props.remove_property(key);
    }

    /// Marks the vertex soft-deleted.
    pub fn mark_removed(&mut self) {
        self.state = Lifecycle::Removed;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.state
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ElementKind::Vertex.hash(state);
        self.id.hash(state);
    }
}

impl Element for Vertex {
    const KIND: ElementKind = ElementKind::Vertex;

    fn id(&self) -> ElementId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn properties(&self) -> &Dictionary {
        &self.properties
    }

    fn is_removed(&self) -> bool {
        self.state == Lifecycle::Removed
    }

    fn detached(&self) -> Self {
        Self {
            id: self.id,
            label: Arc::clone(&self.label),
            properties: self.properties.copy_of(),
            state: self.state,
        }
    }
}

/// Directed graph edge.
#[derive(Clone, Debug)]
pub struct Edge {
    id: ElementId,
    label: Arc<str>,
    out_vertex: ElementId,
    in_vertex: ElementId,
    properties: Dictionary,
    state: Lifecycle,
}

impl Edge {
    /// Active edge `out_vertex -[label]-> in_vertex` with no properties.
    pub fn new(
        id: u64,
        label: &str,
        out_vertex: u64,
        in_vertex: u64,
    ) -> Self {
        Self {
            id: ElementId(id),
            label: Arc::from(label),
            out_vertex: ElementId(out_vertex),
            in_vertex: ElementId(in_vertex),
            properties: Dictionary::empty(),
            state: Lifecycle::Active,
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Sets a property in place.
    pub fn set_property(&mut self, key: &str, value: impl Into<PropValue>) {
        let props = std::mem::take(&mut self.properties);
        self.properties = props.set_property(key, value);
    }

    /// Removes a property in place.
    pub fn remove_property(&mut self, key: &str) {
        let props = std::mem::take(&mut self.properties);
        self.properties = props.remove_property(key);
    }

    /// Marks the edge soft-deleted.
    pub fn mark_removed(&mut self) {
        self.state = Lifecycle::Removed;
    }

    /// Tail vertex.
    pub fn out_vertex(&self) -> ElementId {
        self.out_vertex
    }

    /// Head vertex.
    pub fn in_vertex(&self) -> ElementId {
        self.in_vertex
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ElementKind::Edge.hash(state);
        self.id.hash(state);
    }
}

impl Element for Edge {
    const KIND: ElementKind = ElementKind::Edge;

    fn id(&self) -> ElementId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn properties(&self) -> &Dictionary {
        &self.properties
    }

    fn is_removed(&self) -> bool {
        self.state == Lifecycle::Removed
    }

    fn detached(&self) -> Self {
        Self {
            id: self.id,
            label: Arc::clone(&self.label),
            out_vertex: self.out_vertex,
            in_vertex: self.in_vertex,
            properties: self.properties.copy_of(),
            state: self.state,
        }
    }
}
