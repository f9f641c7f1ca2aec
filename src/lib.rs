#![forbid(unsafe_code)]
//! nest: hierarchical grouping of in-memory records.
//!
//! Think of it as a multi-level SQL `GROUP BY` whose result is a tree. Keys
//! pick the level structure, optional sort specs order keys and leaf records,
//! and an optional rollup summarizes each leaf.
//!
//! ```
//! use nest::{NestOperator, Scalar};
//! use serde_json::json;
//!
//! let rows = vec![
//!     json!({"y": 1931, "v": "A"}),
//!     json!({"y": 1931, "v": "B"}),
//!     json!({"y": 1932, "v": "A"}),
//! ];
//!
//! let counts = NestOperator::new()
//!     .add_key("y")
//!     .set_rollup(|records: &[&serde_json::Value]| records.len())
//!     .map(&rows)?;
//!
//! let leaf = counts.get(&Scalar::I64(1931)).and_then(|g| g.as_leaf());
//! assert_eq!(leaf.and_then(|l| l.as_rollup()), Some(&2));
//! # Ok::<(), nest::Error>(())
//! ```

pub use nest_core::config::{
    FieldAccess, FieldRef, Fingerprint, LevelConfig, NestConfig, RollupConfig, SortConfig,
};
pub use nest_core::{impl_prop_lookup, Error, ItemLookup, PropLookup, Result, Scalar};
pub use nest_operators::{
    EntriesResult, Entry, KeyFn, KeyKind, KeySource, Leaf, MapResult, NestOperator, Rollup,
    SortSpec,
};

pub mod prelude {
    //! Everything needed to configure and run a nest.
    pub use nest_core::prelude::*;
    pub use nest_operators::{
        EntriesResult, Entry, KeyFn, Leaf, MapResult, NestOperator, Rollup, SortSpec,
    };
}
