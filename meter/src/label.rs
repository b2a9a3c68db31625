use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use crate::SharedString;

/// Metadata for a metric key in the form of a key/value pair.
///
/// Metrics are always defined by a name, but can optionally be assigned
/// "labels", key/value pairs that provide metadata about the key.  Labels are
/// typically used for differentiating the context of when and where a metric
/// is emitted.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Label(pub(crate) SharedString, pub(crate) SharedString);

impl Label {
    /// Creates a [`Label`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        Label(key.into(), value.into())
    }

    /// Creates a [`Label`] from a static key and value.
    pub const fn from_static_parts(key: &'static str, value: &'static str) -> Self {
        Label(SharedString::Borrowed(key), SharedString::Borrowed(value))
    }

    /// Key of this label.
    pub fn key(&self) -> &str {
        self.0.as_ref()
    }

    /// Value of this label.
    pub fn value(&self) -> &str {
        self.1.as_ref()
    }

    /// Consumes this [`Label`], returning the key and value.
    pub fn into_parts(self) -> (SharedString, SharedString) {
        (self.0, self.1)
    }
}

impl<K, V> From<&(K, V)> for Label
where
    K: Into<SharedString> + Clone,
    V: Into<SharedString> + Clone,
{
    fn from(pair: &(K, V)) -> Label {
        Label::new(pair.0.clone(), pair.1.clone())
    }
}

/// A value that can be converted to [`Label`]s.
pub trait IntoLabels {
    /// Consumes this value, turning it into a vector of [`Label`]s.
    fn into_labels(self) -> Vec<Label>;
}

impl IntoLabels for Vec<Label> {
    fn into_labels(self) -> Vec<Label> {
        self
    }
}

impl<T, L> IntoLabels for &T
where
    Self: IntoIterator<Item = L>,
    L: Into<Label>,
{
    fn into_labels(self) -> Vec<Label> {
        self.into_iter().map(|l| l.into()).collect()
    }
}

/// Error returned when a flat label list has an odd number of elements.
///
/// Labels are supplied as a flat sequence of alternating keys and values, so
/// an odd-length sequence necessarily has a trailing key with no value.  The
/// canonicalizer rejects such input instead of dropping the dangling key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLabels {
    len: usize,
}

impl InvalidLabels {
    pub(crate) fn new(len: usize) -> Self {
        InvalidLabels { len }
    }

    /// Length of the offending label sequence.
    pub fn len(&self) -> usize {
        self.len
    }
}

impl fmt::Display for InvalidLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "odd-length label sequence ({} elements); labels must be key/value pairs", self.len)
    }
}

impl Error for InvalidLabels {}

/// Canonicalizes a flat key/value label sequence.
///
/// Default labels are merged ahead of caller-supplied pairs, the configured
/// key prefix (if any) is applied to every label key, and repeated keys are
/// deduplicated with the first occurrence winning.  The merged order is the
/// canonical order: it is not sorted, and identity hashing is therefore
/// order-sensitive.
///
/// Returns [`InvalidLabels`] if `pairs` has an odd number of elements.
pub fn canonicalize(
    defaults: &[Label],
    label_prefix: &str,
    pairs: &[&str],
) -> Result<Vec<Label>, InvalidLabels> {
    if pairs.len() % 2 != 0 {
        return Err(InvalidLabels::new(pairs.len()));
    }

    let mut merged: IndexMap<SharedString, SharedString> =
        IndexMap::with_capacity(defaults.len() + pairs.len() / 2);

    for label in defaults {
        merged
            .entry(prefixed_key(label_prefix, label.key()))
            .or_insert_with(|| SharedString::from(label.value().to_owned()));
    }

    for pair in pairs.chunks_exact(2) {
        merged
            .entry(prefixed_key(label_prefix, pair[0]))
            .or_insert_with(|| SharedString::from(pair[1].to_owned()));
    }

    Ok(merged.into_iter().map(|(k, v)| Label(k, v)).collect())
}

fn prefixed_key(prefix: &str, key: &str) -> SharedString {
    if prefix.is_empty() {
        SharedString::from(key.to_owned())
    } else {
        SharedString::from(format!("{prefix}{key}"))
    }
}
