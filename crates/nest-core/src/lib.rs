#![forbid(unsafe_code)]
//! nest-core: key values, record lookups, errors, and declarative configs
//! shared by the nest operator.
//!
//! Keep this crate free of grouping logic; the engine lives in
//! `nest-operators`.

pub mod config;
pub mod error;
pub mod prelude;
pub mod types;

pub use error::{Error, Result};
pub use types::{ItemLookup, PropLookup, Scalar};
