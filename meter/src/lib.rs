//! Core API for the meter metrics facade.
//!
//! The `meter` crate provides the identity and handle types shared by every
//! part of the meter ecosystem.  A metric is addressed by a [`Key`]: a name
//! plus an ordered list of [`Label`]s produced by the label canonicalizer.
//! Callers interact with metrics through narrow, cheaply-cloneable handles
//! ([`Counter`], [`FloatCounter`], [`Gauge`], [`Histogram`], [`Summary`]),
//! each of which exposes only the operations valid for its kind.
//!
//! # Identity
//!
//! Two lookups resolve to the same metric instance when their name and
//! canonical label list are equal.  Canonicalization merges configured
//! default labels ahead of caller-supplied ones, applies an optional label
//! key prefix, and deduplicates repeated keys (first occurrence wins).  The
//! canonical order is the merged order -- it is never sorted, so supplying
//! the same labels in a different order addresses a different instance.
//!
//! The 64-bit fingerprint of a key is an FNV-1a hash over the name bytes
//! followed by each label's key and value bytes, in canonical order.  It is
//! stable for the lifetime of a process and is never persisted.

use std::borrow::Cow;

/// An allocation-optimized string.
///
/// Metric names and labels are almost always static strings, so we use a
/// copy-on-write type to avoid allocating in the common case.
pub type SharedString = Cow<'static, str>;

mod atomics;
pub use self::atomics::{AtomicF64, AtomicU64};

mod handles;
pub use self::handles::{
    Counter, CounterFn, FloatCounter, FloatCounterFn, Gauge, GaugeFn, Histogram, HistogramFn,
    Summary, SummaryFn,
};

mod key;
pub use self::key::{Key, KeyHasher};

mod label;
pub use self::label::{canonicalize, IntoLabels, InvalidLabels, Label};

pub use quanta::Instant;
