//! Low-level primitives shared by the collections and the index layer.

/// Write serialization and reference-swap publication.
///
/// A [`concurrency::WriteLock`] hands out permits that index mutations demand,
/// and [`concurrency::Published`] lets readers load snapshots without locking.
pub mod concurrency;
