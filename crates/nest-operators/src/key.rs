//! Key functions: one per nesting level, each mapping a record to a `Scalar`.

use std::fmt;
use std::sync::Arc;

use nest_core::config::FieldAccess;
use nest_core::{Error, ItemLookup, PropLookup, Result, Scalar};

type ExtractFn<T> = dyn Fn(&T) -> Result<Scalar> + Send + Sync;

/// Where a key function came from; used for `Debug` output only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
    Item(String),
    Prop(String),
    Custom,
}

/// A key-extraction function `(&T) -> Result<Scalar>`.
///
/// Field-name keys and closure keys share this one shape, so the engine
/// never cares how a level was registered.
pub struct KeyFn<T> {
    kind: KeyKind,
    extract: Arc<ExtractFn<T>>,
}

impl<T: 'static> KeyFn<T> {
    /// Dictionary-style lookup; a record without the field fails with
    /// [`Error::MissingField`].
    pub fn item(name: impl Into<String>) -> Self
    where
        T: ItemLookup,
    {
        let name = name.into();
        let field = name.clone();
        Self {
            kind: KeyKind::Item(name),
            extract: Arc::new(move |record: &T| {
                record.get_item(&field).ok_or_else(|| Error::MissingField {
                    field: field.clone(),
                })
            }),
        }
    }

    /// Attribute-style lookup; a record without the attribute fails with
    /// [`Error::MissingAttribute`].
    pub fn prop(name: impl Into<String>) -> Self
    where
        T: PropLookup,
    {
        let name = name.into();
        let attr = name.clone();
        Self {
            kind: KeyKind::Prop(name),
            extract: Arc::new(move |record: &T| {
                record
                    .get_prop(&attr)
                    .ok_or_else(|| Error::MissingAttribute { attr: attr.clone() })
            }),
        }
    }

    /// Lookup chosen at runtime, as declarative configs do.
    pub fn field(name: impl Into<String>, access: FieldAccess) -> Self
    where
        T: ItemLookup + PropLookup,
    {
        match access {
            FieldAccess::Item => Self::item(name),
            FieldAccess::Prop => Self::prop(name),
        }
    }

    pub fn from_fn<F, K>(f: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Into<Scalar> + 'static,
    {
        Self {
            kind: KeyKind::Custom,
            extract: Arc::new(move |record: &T| Ok(f(record).into())),
        }
    }

    /// A closure that may fail; its error reaches the caller of `map`/`entries` as is.
    pub fn try_from_fn<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<Scalar> + Send + Sync + 'static,
    {
        Self {
            kind: KeyKind::Custom,
            extract: Arc::new(f),
        }
    }
}

impl<T> KeyFn<T> {
    pub fn kind(&self) -> &KeyKind {
        &self.kind
    }

    pub fn extract(&self, record: &T) -> Result<Scalar> {
        (self.extract)(record)
    }
}

impl<T> Clone for KeyFn<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<T> fmt::Debug for KeyFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyFn").field(&self.kind).finish()
    }
}

/// Argument of `add_key`/`add_prop`: a field name, or a ready key function.
pub enum KeySource<T> {
    Field(String),
    Func(KeyFn<T>),
}

impl<T> From<&str> for KeySource<T> {
    fn from(name: &str) -> Self {
        KeySource::Field(name.to_string())
    }
}

impl<T> From<String> for KeySource<T> {
    fn from(name: String) -> Self {
        KeySource::Field(name)
    }
}

impl<T> From<KeyFn<T>> for KeySource<T> {
    fn from(key: KeyFn<T>) -> Self {
        KeySource::Func(key)
    }
}
