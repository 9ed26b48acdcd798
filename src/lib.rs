//! Compact collections and secondary property indexes for the Sombra graph engine.
//!
//! The crate is organised bottom-up:
//!
//! - [`collections`] holds the size-tiered copy-on-write primitives
//!   ([`CompactSet`], [`ClassifierMultiset`], [`Dictionary`]).
//! - [`model`] defines the vertex and edge values the indexes store.
//! - [`index`] builds per-key property indexes and the per-element-type
//!   [`IndexRegistry`] on top of the primitives, plus the linear-scan fallback.
//!
//! Readers never lock. Writers are serialized by a [`WriteLock`] whose
//! [`WritePermit`] must be presented to every index mutation.

#![warn(missing_docs)]

pub mod collections;
pub mod error;
pub mod index;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod options;
pub mod primitives;
pub mod types;

pub use collections::{
    ClassifierMultiset, CompactSet, DictTier, Dictionary, Elements, Slot, Tier,
};
pub use error::{IndexError, Result};
pub use index::{Index, IndexRegistry, RegistryWriter};
pub use model::{Edge, Element, ElementKind, Lifecycle, Vertex};
pub use primitives::concurrency::{Published, WriteLock, WritePermit};
pub use types::{ElementId, IndexValue, PropValue};
