//! The "extra data" bag carried alongside every request.
//!
//! [`Extras`] is a string-keyed map of arbitrary values. A [`Mediator`] holds
//! one as its bound context and merges it with the call-site extras on every
//! dispatch; middlewares receive their own copy and may add or remove keys
//! before forwarding it down the chain.
//!
//! Storage is copy-on-write: cloning an `Extras` is a reference-count bump, and
//! the first mutation through a clone detaches it. Mutating a per-call copy can
//! therefore never leak into the mediator that produced it.
//!
//! ```rust,ignore
//! use courier_core::{Extras, extras};
//!
//! let bound = extras! { "tenant" => "acme", "attempt" => 1u32 };
//! let call = Extras::new().with("attempt", 2u32);
//!
//! let merged = bound.merge(&call);
//! assert_eq!(merged.get::<u32>("attempt"), Some(&2));
//! ```
//!
//! [`Mediator`]: crate::Mediator

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single type-erased value stored in [`Extras`].
#[derive(Clone)]
pub struct ExtraValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ExtraValue {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the stored value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Takes shared ownership of the stored value as a `T`.
    pub fn downcast<T: Any + Send + Sync>(self) -> Result<Arc<T>, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map_err(|value| Self { value, type_name })
    }
}

impl fmt::Debug for ExtraValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name)
    }
}

/// An immutable-by-default, string-keyed bag of arbitrary values.
#[derive(Clone, Default)]
pub struct Extras {
    entries: Arc<BTreeMap<String, ExtraValue>>,
}

impl Extras {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries_mut(&mut self) -> &mut BTreeMap<String, ExtraValue> {
        Arc::make_mut(&mut self.entries)
    }

    /// Inserts `value` under `key` (builder pattern).
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    pub fn insert<T: Any + Send + Sync>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Option<ExtraValue> {
        self.insert_value(key, ExtraValue::new(value))
    }

    /// Inserts an already wrapped value under `key`.
    pub fn insert_value(&mut self, key: impl Into<String>, value: ExtraValue) -> Option<ExtraValue> {
        self.entries_mut().insert(key.into(), value)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<ExtraValue> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.entries_mut().remove(key)
    }

    /// Borrows the value under `key` as a `T`.
    ///
    /// Returns `None` when the key is absent or holds another type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(ExtraValue::downcast_ref)
    }

    /// Borrows the raw value under `key`.
    pub fn get_value(&self, key: &str) -> Option<&ExtraValue> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtraValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a new bag holding `self` overlaid with `other`.
    ///
    /// Keys present in both take the value from `other`.
    pub fn merge(&self, other: &Extras) -> Extras {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = self.clone();
        let entries = merged.entries_mut();
        for (key, value) in other.entries.iter() {
            entries.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Returns a new bag without `keys`. Keys that are not present are ignored.
    pub fn without<I, K>(&self, keys: I) -> Extras
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut result = self.clone();
        for key in keys {
            result.remove(key.as_ref());
        }
        result
    }
}

impl fmt::Debug for Extras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, ExtraValue)> for Extras {
    fn from_iter<I: IntoIterator<Item = (K, ExtraValue)>>(iter: I) -> Self {
        let mut extras = Extras::new();
        for (key, value) in iter {
            extras.insert_value(key, value);
        }
        extras
    }
}

/// Builds an [`Extras`] from `key => value` pairs.
///
/// ```rust,ignore
/// let extras = extras! { "additional_data" => "arg", "some_data" => 1 };
/// ```
#[macro_export]
macro_rules! extras {
    () => {
        $crate::Extras::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Extras::new()$(.with($key, $value))+
    };
}
