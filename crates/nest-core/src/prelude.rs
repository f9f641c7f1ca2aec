//! Convenient re-exports for downstream crates.

pub use crate::config::{
    FieldAccess, FieldRef, Fingerprint, LevelConfig, NestConfig, RollupConfig, SortConfig,
};
pub use crate::error::{Error, Result};
pub use crate::types::{ItemLookup, PropLookup, Scalar};
