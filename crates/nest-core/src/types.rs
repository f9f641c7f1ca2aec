//! Key values and record access.
//!
//! `Scalar` is the single key type every nesting level produces. It carries a
//! total order and a hash that agrees with equality, so it can sit in hash
//! maps and be sorted without callers thinking about floats.
//!
//! Records are opaque to the engine. Field-name keys reach into them through
//! one of two lookup traits: [`ItemLookup`] (dictionary-style, `record["f"]`)
//! and [`PropLookup`] (attribute-style, `record.f`).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value; `None` for non-numeric variants and `Null`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I32(v) => Some(*v as f64),
            Scalar::I64(v) => Some(*v as f64),
            Scalar::F32(v) => Some(*v as f64),
            Scalar::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::I32(v) => Some(*v as i64),
            Scalar::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Plain JSON rendering (`1931`, `"A"`, `null`), unlike the tagged serde form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::I32(i) => Value::from(*i),
            Scalar::I64(i) => Value::from(*i),
            Scalar::F32(f) => serde_json::Number::from_f64(*f as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::F64(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Bin(b) => Value::Array(b.iter().map(|x| Value::from(*x)).collect()),
        }
    }

    /// Rank of the variant, used to order values of different types. All
    /// numeric variants share one rank and compare by value.
    fn type_order(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::I32(_) | Scalar::I64(_) | Scalar::F32(_) | Scalar::F64(_) => 2,
            Scalar::Str(_) => 3,
            Scalar::Bin(_) => 4,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::I32(v) => Some(Number::Int(*v as i64)),
            Scalar::I64(v) => Some(Number::Int(*v)),
            Scalar::F32(v) => Some(Number::Float(*v as f64)),
            Scalar::F64(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }
}

/// Numeric view shared by the integer and float variants.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

/// 2^63, the first f64 above `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Number {
    fn cmp(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Float(a), Number::Float(b)) => cmp_floats(a, b),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(b, a).reverse(),
        }
    }

    /// The integer equal to this number, if any. `-0.0` maps to `0`.
    fn as_exact_int(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::Float(f) if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) => {
                Some(f as i64)
            }
            Number::Float(_) => None,
        }
    }
}

/// NaNs are equal to each other and greater than every number; `-0.0 == 0.0`.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison without rounding `i` through f64.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // `whole` lies in [-2^63, 2^63), so the cast is exact.
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => cmp_floats(whole, f),
        ord => ord,
    }
}

/// Total order: nulls first, then booleans, numbers, strings and bytes.
/// Numbers compare by value across the integer and float variants, so
/// `I64(1) == F64(1.0)` and `I32(3) > F64(2.5)`.
impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        use Scalar::*;
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.cmp(b);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(x), Bool(y)) => x.cmp(y),
            (Str(x), Str(y)) => x.cmp(y),
            (Bin(x), Bin(y)) => x.cmp(y),
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.type_order());
        if let Some(n) = self.as_number() {
            // Integral values hash as integers so `I64(1)` and `F64(1.0)`
            // land in the same bucket; NaNs share one canonical pattern.
            match (n.as_exact_int(), n) {
                (Some(i), _) => {
                    state.write_u8(0);
                    i.hash(state);
                }
                (None, Number::Float(f)) if f.is_nan() => state.write_u8(2),
                (None, Number::Float(f)) => {
                    state.write_u8(1);
                    f.to_bits().hash(state);
                }
                (None, Number::Int(i)) => i.hash(state),
            }
            return;
        }
        match self {
            Scalar::Bool(b) => b.hash(state),
            Scalar::Str(s) => s.hash(state),
            Scalar::Bin(b) => b.hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bin(bytes) => write!(f, "{bytes:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::I32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::I64(v as i64)
    }
}

impl From<usize> for Scalar {
    fn from(v: usize) -> Self {
        i64::try_from(v)
            .map(Scalar::I64)
            .unwrap_or(Scalar::F64(v as f64))
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl From<&String> for Scalar {
    fn from(v: &String) -> Self {
        Scalar::Str(v.clone())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bin(v)
    }
}

impl<V: Into<Scalar>> From<Option<V>> for Scalar {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// JSON numbers become `I64` when integral and in range, `F64` otherwise.
/// Arrays and objects key by their compact JSON text.
impl From<&serde_json::Value> for Scalar {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::I64(i),
                None => Scalar::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Scalar::Str(s.clone()),
            other => Scalar::Str(other.to_string()),
        }
    }
}

/// Dictionary-style field access (`record["field"]`).
pub trait ItemLookup {
    fn get_item(&self, name: &str) -> Option<Scalar>;
}

/// Attribute-style field access (`record.field`).
///
/// Implement by hand, or with [`impl_prop_lookup!`](crate::impl_prop_lookup)
/// for plain structs.
pub trait PropLookup {
    fn get_prop(&self, name: &str) -> Option<Scalar>;
}

impl ItemLookup for HashMap<String, Scalar> {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        self.get(name).cloned()
    }
}

impl ItemLookup for BTreeMap<String, Scalar> {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        self.get(name).cloned()
    }
}

impl ItemLookup for IndexMap<String, Scalar> {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        self.get(name).cloned()
    }
}

/// Positional access; `name` must parse as an index.
impl ItemLookup for Vec<Scalar> {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        let idx = name.parse::<usize>().ok()?;
        self.get(idx).cloned()
    }
}

impl ItemLookup for serde_json::Map<String, serde_json::Value> {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        self.get(name).map(Scalar::from)
    }
}

/// Object field by name, or array element when `name` is an index.
impl ItemLookup for serde_json::Value {
    fn get_item(&self, name: &str) -> Option<Scalar> {
        json_child(self, name).map(Scalar::from)
    }
}

/// Dotted attribute paths (`"site.name"`) walk nested objects and arrays.
impl PropLookup for serde_json::Value {
    fn get_prop(&self, name: &str) -> Option<Scalar> {
        let mut cur = self;
        for part in name.split('.') {
            cur = json_child(cur, part)?;
        }
        Some(Scalar::from(cur))
    }
}

fn json_child<'v>(value: &'v serde_json::Value, name: &str) -> Option<&'v serde_json::Value> {
    use serde_json::Value;
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(items) => items.get(name.parse::<usize>().ok()?),
        _ => None,
    }
}

/// Implement [`PropLookup`](crate::types::PropLookup) for a struct by listing
/// the fields that may serve as keys. Each field must be `Clone` and
/// convertible into [`Scalar`](crate::types::Scalar).
///
/// ```
/// use nest_core::impl_prop_lookup;
/// use nest_core::types::{PropLookup, Scalar};
///
/// struct Yield { year: i64, site: String }
/// impl_prop_lookup!(Yield { year, site });
///
/// let y = Yield { year: 1931, site: "Morris".into() };
/// assert_eq!(y.get_prop("year"), Some(Scalar::I64(1931)));
/// assert_eq!(y.get_prop("variety"), None);
/// ```
#[macro_export]
macro_rules! impl_prop_lookup {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::types::PropLookup for $ty {
            fn get_prop(&self, name: &str) -> Option<$crate::types::Scalar> {
                match name {
                    $(stringify!($field) => Some($crate::types::Scalar::from(self.$field.clone())),)*
                    _ => None,
                }
            }
        }
    };
}
