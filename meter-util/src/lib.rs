//! Helper types and functions used within the meter ecosystem.

mod common;
pub use common::Hashable;

mod kind;
pub use kind::MetricKind;

mod instruments;
pub use instruments::{
    AtomicCounter, AtomicFloatCounter, AtomicGauge, AtomicHistogram, AtomicSummary,
    DEFAULT_BUCKETS, DEFAULT_SUMMARY_QUANTILES, DEFAULT_SUMMARY_WINDOW,
};

pub mod registry;
pub use registry::{
    CounterStorage, FloatCounterStorage, GaugeStorage, HistogramStorage, Registry, Storage,
    SummaryStorage,
};
