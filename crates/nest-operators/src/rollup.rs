//! Leaf rollups: summarize a leaf's records into a single value.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use nest_core::config::RollupConfig;
use nest_core::{Error, ItemLookup, PropLookup, Result, Scalar};

use crate::key::KeyFn;

type RollupFn<T, R> = dyn Fn(&[&T]) -> Result<R> + Send + Sync;

pub struct Rollup<T, R> {
    name: &'static str,
    apply: Arc<RollupFn<T, R>>,
}

impl<T: 'static, R: 'static> Rollup<T, R> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[&T]) -> R + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            apply: Arc::new(move |records: &[&T]| Ok(f(records))),
        }
    }

    /// A rollup that may fail; its error aborts the grouping call unchanged.
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&[&T]) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            apply: Arc::new(f),
        }
    }
}

impl<T, R> Rollup<T, R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, records: &[&T]) -> Result<R> {
        (self.apply)(records)
    }
}

impl<T: 'static> Rollup<T, Scalar> {
    /// Number of records in the leaf.
    pub fn count() -> Self {
        Self {
            name: "count",
            apply: Arc::new(|records: &[&T]| Ok(Scalar::from(records.len()))),
        }
    }

    /// Number of distinct non-null key values.
    pub fn count_distinct(key: KeyFn<T>) -> Self {
        Self {
            name: "count_distinct",
            apply: Arc::new(move |records: &[&T]| {
                let mut seen = HashSet::new();
                for record in records {
                    let value = key.extract(record)?;
                    if !value.is_null() {
                        seen.insert(value);
                    }
                }
                Ok(Scalar::from(seen.len()))
            }),
        }
    }

    /// Sum of the values; `I64` while every value is integral, `F64` once a
    /// float (or an integer overflow) shows up. Nulls count as zero.
    pub fn sum(key: KeyFn<T>) -> Self {
        Self {
            name: "sum",
            apply: Arc::new(move |records: &[&T]| {
                let mut int_sum: i64 = 0;
                let mut float_sum: f64 = 0.0;
                let mut is_float = false;
                for record in records {
                    match key.extract(record)? {
                        Scalar::Null => {}
                        Scalar::I32(v) => add_int(&mut int_sum, &mut float_sum, &mut is_float, v as i64),
                        Scalar::I64(v) => add_int(&mut int_sum, &mut float_sum, &mut is_float, v),
                        Scalar::F32(v) => {
                            is_float = true;
                            float_sum += v as f64;
                        }
                        Scalar::F64(v) => {
                            is_float = true;
                            float_sum += v;
                        }
                        other => return Err(non_numeric("sum", &other)),
                    }
                }
                Ok(if is_float {
                    Scalar::F64(int_sum as f64 + float_sum)
                } else {
                    Scalar::I64(int_sum)
                })
            }),
        }
    }

    /// Arithmetic mean of the non-null values; `Null` when there are none.
    pub fn mean(key: KeyFn<T>) -> Self {
        Self {
            name: "mean",
            apply: Arc::new(move |records: &[&T]| {
                let mut total = 0.0;
                let mut n = 0usize;
                for record in records {
                    let value = key.extract(record)?;
                    if value.is_null() {
                        continue;
                    }
                    total += value.as_f64().ok_or_else(|| non_numeric("mean", &value))?;
                    n += 1;
                }
                Ok(if n == 0 {
                    Scalar::Null
                } else {
                    Scalar::F64(total / n as f64)
                })
            }),
        }
    }

    /// Smallest non-null value in `Scalar` order.
    pub fn min(key: KeyFn<T>) -> Self {
        Self {
            name: "min",
            apply: Arc::new(move |records: &[&T]| extreme(&key, records, std::cmp::Ordering::Less)),
        }
    }

    /// Largest non-null value in `Scalar` order.
    pub fn max(key: KeyFn<T>) -> Self {
        Self {
            name: "max",
            apply: Arc::new(move |records: &[&T]| {
                extreme(&key, records, std::cmp::Ordering::Greater)
            }),
        }
    }

    pub fn from_config(cfg: &RollupConfig) -> Self
    where
        T: ItemLookup + PropLookup,
    {
        let key = |f: &nest_core::config::FieldRef| KeyFn::field(f.field.clone(), f.access);
        match cfg {
            RollupConfig::Count => Self::count(),
            RollupConfig::CountDistinct(f) => Self::count_distinct(key(f)),
            RollupConfig::Sum(f) => Self::sum(key(f)),
            RollupConfig::Mean(f) => Self::mean(key(f)),
            RollupConfig::Min(f) => Self::min(key(f)),
            RollupConfig::Max(f) => Self::max(key(f)),
        }
    }
}

impl<T, R> Clone for Rollup<T, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<T, R> fmt::Debug for Rollup<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rollup").field(&self.name).finish()
    }
}

fn add_int(int_sum: &mut i64, float_sum: &mut f64, is_float: &mut bool, v: i64) {
    match int_sum.checked_add(v) {
        Some(s) => *int_sum = s,
        None => {
            *is_float = true;
            *float_sum += v as f64;
        }
    }
}

fn extreme<T>(key: &KeyFn<T>, records: &[&T], want: std::cmp::Ordering) -> Result<Scalar> {
    let mut best: Option<Scalar> = None;
    for record in records {
        let value = key.extract(record)?;
        if value.is_null() {
            continue;
        }
        let replace = match &best {
            None => true,
            Some(cur) => value.cmp(cur) == want,
        };
        if replace {
            best = Some(value);
        }
    }
    Ok(best.unwrap_or(Scalar::Null))
}

fn non_numeric(op: &str, value: &Scalar) -> Error {
    Error::Rollup(format!("{op}: non-numeric value '{value}'"))
}
