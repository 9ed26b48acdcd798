//! Size-tiered copy-on-write collections.
//!
//! All three structures pick their representation from their current size
//! only, and never change a representation another holder can still see.

pub mod compact_set;
pub mod dictionary;
pub mod multiset;

pub use compact_set::{size, CompactSet, Elements, Slot, Tier};
pub use dictionary::{DictTier, Dictionary};
pub use multiset::ClassifierMultiset;
