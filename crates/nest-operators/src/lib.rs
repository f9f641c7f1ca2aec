#![forbid(unsafe_code)]
//! nest-operators: the nest operator (key registry, sort registry, rollups)
//! and its grouping engine.
//!
//! Design intent:
//! - Pure and synchronous; no I/O, no shared state between calls.
//! - Leaves borrow the caller's records; nothing is copied or retained.
//! - Logging is opt-in through the `tracing` feature.

pub mod key;
pub mod nest;
pub mod result;
pub mod rollup;
pub mod sort;

pub use key::{KeyFn, KeyKind, KeySource};
pub use nest::NestOperator;
pub use result::{EntriesResult, Entry, Leaf, MapResult};
pub use rollup::Rollup;
pub use sort::{Comparator, SortKeyFn, SortSpec};
