//! The nest operator: multi-level grouping into a tree.
//!
//! Configure once, then call [`NestOperator::map`] or
//! [`NestOperator::entries`] on any number of datasets. The operator keeps no
//! reference to the data between calls; every call allocates its own buckets
//! and returns references into the caller's records.
//!
//! ```
//! use nest_core::Scalar;
//! use nest_operators::{NestOperator, SortSpec};
//! use serde_json::json;
//!
//! let yields = vec![
//!     json!({"year": 1931, "variety": "Manchuria"}),
//!     json!({"year": 1932, "variety": "Glabron"}),
//!     json!({"year": 1931, "variety": "Glabron"}),
//! ];
//!
//! let nest = NestOperator::new()
//!     .add_key("year")
//!     .set_sort_keys(SortSpec::descending())?
//!     .add_key("variety");
//!
//! let tree = nest.map(&yields)?;
//! assert_eq!(tree.keys(), [&Scalar::I64(1932), &Scalar::I64(1931)]);
//! # Ok::<(), nest_core::Error>(())
//! ```

use std::fmt;

use indexmap::IndexMap;

use nest_core::config::NestConfig;
use nest_core::{Error, ItemLookup, PropLookup, Result, Scalar};

use crate::key::{KeyFn, KeySource};
use crate::result::{EntriesResult, Entry, Leaf, MapResult};
use crate::rollup::Rollup;
use crate::sort::{key_order, order_keys, order_values, SortSpec};

/// Hierarchical grouping operator over records of type `T`, rolling leaves
/// up into `R` when a rollup is set.
///
/// Invariants:
/// - `sort_keys.len() == keys.len()`; a `None` slot keeps encounter order.
/// - Calls take `&self`; reconfiguration consumes the operator, so it cannot
///   overlap a running call.
pub struct NestOperator<T, R = Scalar> {
    keys: Vec<KeyFn<T>>,
    sort_keys: Vec<Option<SortSpec<Scalar>>>,
    sort_values: Option<SortSpec<T>>,
    rollup: Option<Rollup<T, R>>,
}

impl<T: 'static> NestOperator<T> {
    /// An operator with no keys: `map` and `entries` return the input as is.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            sort_keys: Vec::new(),
            sort_values: None,
            rollup: None,
        }
    }

    /// Build an operator from a declarative config.
    pub fn from_config(cfg: &NestConfig) -> Result<Self>
    where
        T: ItemLookup + PropLookup,
    {
        cfg.validate()?;

        let mut op = Self::new();
        for level in &cfg.levels {
            op = op.push_key(KeyFn::field(level.field.clone(), level.access));
            if let Some(sort) = &level.sort {
                op = op.set_sort_keys(SortSpec::new().with_reverse(sort.reverse))?;
            }
        }

        if let Some(sort) = &cfg.sort_values {
            let mut spec = SortSpec::new().with_reverse(sort.reverse);
            if let Some(by) = &sort.by {
                // A record without the sort field sorts as null.
                let key = KeyFn::<T>::field(by.clone(), sort.access);
                spec = spec.with_key(move |record: &T| key.extract(record).unwrap_or(Scalar::Null));
            }
            op = op.set_sort_values(spec);
        }

        if let Some(rollup) = &cfg.rollup {
            op = op.with_rollup(Rollup::from_config(rollup));
        }

        Ok(op)
    }
}

impl<T: 'static> Default for NestOperator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static, R: 'static> NestOperator<T, R> {
    /// Register the next level. A field name becomes a dictionary-style lookup.
    pub fn add_key(self, source: impl Into<KeySource<T>>) -> Self
    where
        T: ItemLookup,
    {
        let key = match source.into() {
            KeySource::Field(name) => KeyFn::item(name),
            KeySource::Func(key) => key,
        };
        self.push_key(key)
    }

    /// Register the next level. A field name becomes an attribute-style lookup.
    pub fn add_prop(self, source: impl Into<KeySource<T>>) -> Self
    where
        T: PropLookup,
    {
        let key = match source.into() {
            KeySource::Field(name) => KeyFn::prop(name),
            KeySource::Func(key) => key,
        };
        self.push_key(key)
    }

    /// Register the next level from a closure; no lookup trait required.
    pub fn add_key_fn<F, K>(self, f: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Into<Scalar> + 'static,
    {
        self.push_key(KeyFn::from_fn(f))
    }

    fn push_key(mut self, key: KeyFn<T>) -> Self {
        self.keys.push(key);
        self.sort_keys.push(None);
        self
    }

    /// Order the keys of the most recently added level.
    ///
    /// With a key extractor, a `comparator` on the spec compares the
    /// extracted values. Fails with [`Error::NoKeyLevel`] when no level
    /// exists yet.
    pub fn set_sort_keys(mut self, spec: SortSpec<Scalar>) -> Result<Self> {
        let slot = self.sort_keys.last_mut().ok_or(Error::NoKeyLevel)?;
        *slot = Some(key_order(spec));
        Ok(self)
    }

    /// Order leaf records. Has no effect while a rollup is set.
    ///
    /// Records have no natural order of their own: a spec with neither a
    /// comparator nor a key extractor keeps each leaf in input order, even
    /// with `reverse`. Use [`SortSpec::natural`] for `T: Ord`.
    pub fn set_sort_values(mut self, spec: SortSpec<T>) -> Self {
        self.sort_values = Some(spec);
        self
    }

    /// Replace each leaf's records with `f(records)`.
    pub fn set_rollup<R2, F>(self, f: F) -> NestOperator<T, R2>
    where
        F: Fn(&[&T]) -> R2 + Send + Sync + 'static,
        R2: 'static,
    {
        self.with_rollup(Rollup::new(f))
    }

    /// Like [`set_rollup`](Self::set_rollup) with a fallible summary.
    pub fn set_try_rollup<R2, F>(self, f: F) -> NestOperator<T, R2>
    where
        F: Fn(&[&T]) -> Result<R2> + Send + Sync + 'static,
        R2: 'static,
    {
        self.with_rollup(Rollup::try_new(f))
    }

    pub fn with_rollup<R2>(self, rollup: Rollup<T, R2>) -> NestOperator<T, R2> {
        NestOperator {
            keys: self.keys,
            sort_keys: self.sort_keys,
            sort_values: self.sort_values,
            rollup: Some(rollup),
        }
    }

    /// Drop the rollup; leaves go back to holding records.
    pub fn clear_rollup(mut self) -> Self {
        self.rollup = None;
        self
    }
}

impl<T, R> NestOperator<T, R> {
    /// Number of registered key levels.
    pub fn depth(&self) -> usize {
        self.keys.len()
    }

    /// Group `data` into nested ordered maps.
    ///
    /// Accepts anything iterable over `&T`: slices, `&Vec<T>`, or the
    /// `values()` of a keyed collection.
    pub fn map<'a, I>(&self, data: I) -> Result<MapResult<'a, T, R>>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let records: Vec<&'a T> = data.into_iter().collect();
        #[cfg(feature = "tracing")]
        tracing::trace!(levels = self.keys.len(), records = records.len(), "nest map");
        self.build_map(records, 0)
    }

    /// Group `data` into nested `(key, values)` entries.
    pub fn entries<'a, I>(&self, data: I) -> Result<EntriesResult<'a, T, R>>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let map = self.map(data)?;
        self.build_entries(map, 0)
    }

    fn build_map<'a>(&self, records: Vec<&'a T>, depth: usize) -> Result<MapResult<'a, T, R>> {
        let Some(key_fn) = self.keys.get(depth) else {
            return self.build_leaf(records).map(MapResult::Leaf);
        };

        let mut buckets: IndexMap<Scalar, Vec<&'a T>> = IndexMap::new();
        for record in records {
            let key = key_fn.extract(record)?;
            buckets.entry(key).or_default().push(record);
        }

        let sort = self.sort_keys.get(depth).and_then(Option::as_ref);
        #[cfg(feature = "tracing")]
        tracing::trace!(depth, groups = buckets.len(), sorted = sort.is_some(), "partitioned level");

        if let Some(spec) = sort {
            let order = order_keys(spec, buckets.keys().cloned().collect());
            let mut sorted = IndexMap::with_capacity(buckets.len());
            for key in order {
                if let Some(bucket) = buckets.swap_remove(&key) {
                    sorted.insert(key, bucket);
                }
            }
            buckets = sorted;
        }

        let mut groups = IndexMap::with_capacity(buckets.len());
        for (key, bucket) in buckets {
            let child = self.build_map(bucket, depth + 1)?;
            groups.insert(key, child);
        }
        Ok(MapResult::Groups(groups))
    }

    /// Rollup wins over value sort.
    fn build_leaf<'a>(&self, records: Vec<&'a T>) -> Result<Leaf<'a, T, R>> {
        if let Some(rollup) = &self.rollup {
            return rollup.apply(&records).map(Leaf::Rollup);
        }
        if let Some(spec) = &self.sort_values {
            return Ok(Leaf::Records(order_values(spec, records)));
        }
        Ok(Leaf::Records(records))
    }

    /// Convert a map built by this operator; each level's key sort is applied
    /// again to the entries, which leaves the (already sorted) order intact.
    fn build_entries<'a>(
        &self,
        map: MapResult<'a, T, R>,
        depth: usize,
    ) -> Result<EntriesResult<'a, T, R>> {
        match map {
            MapResult::Leaf(leaf) if depth >= self.keys.len() => Ok(EntriesResult::Leaf(leaf)),
            MapResult::Groups(groups) if depth < self.keys.len() => {
                let mut entries = Vec::with_capacity(groups.len());
                for (key, value) in groups {
                    entries.push(Entry {
                        key,
                        values: self.build_entries(value, depth + 1)?,
                    });
                }
                if let Some(spec) = self.sort_keys.get(depth).and_then(Option::as_ref) {
                    entries = spec.sort_by_spec(entries, |e| &e.key, Scalar::cmp);
                }
                Ok(EntriesResult::Entries(entries))
            }
            _ => Err(Error::Invariant(format!(
                "map shape does not match {} key level(s) at depth {depth}",
                self.keys.len()
            ))),
        }
    }
}

impl<T, R> Clone for NestOperator<T, R> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            sort_keys: self.sort_keys.clone(),
            sort_values: self.sort_values.clone(),
            rollup: self.rollup.clone(),
        }
    }
}

impl<T, R> fmt::Debug for NestOperator<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestOperator")
            .field("keys", &self.keys)
            .field("sort_keys", &self.sort_keys)
            .field("sort_values", &self.sort_values)
            .field("rollup", &self.rollup)
            .finish()
    }
}
