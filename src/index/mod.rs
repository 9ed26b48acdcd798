//! Exact-match property indexes over graph elements.
//!
//! [`Index`] maps one property's values to the elements holding them;
//! [`IndexRegistry`] owns every index of one element type and fans element
//! mutations out to all of them. [`scan`] is the full-scan fallback for keys
//! without an index.

pub mod property;
pub mod registry;
pub mod scan;

pub use property::Index;
pub use registry::{IndexRegistry, RegistryWriter};
