use std::sync::Arc;
use std::time::Duration;

use crate::instruments::{
    AtomicCounter, AtomicFloatCounter, AtomicGauge, AtomicHistogram, AtomicSummary,
    DEFAULT_BUCKETS, DEFAULT_SUMMARY_QUANTILES, DEFAULT_SUMMARY_WINDOW,
};

/// Defines the underlying storage for one kind of metric, as well as how to
/// create instances of it.
///
/// Each registry is monomorphic over a single storage -- and therefore a
/// single metric kind -- so no runtime downcasting is ever needed to get
/// from a registry entry to a typed instance.
pub trait Storage<K> {
    /// The type of the stored metric instance.
    type Instance: Clone;

    /// Creates a zero-valued instance.
    fn create(&self, key: &K) -> Self::Instance;
}

/// Atomic storage for counters.
#[derive(Clone, Debug, Default)]
pub struct CounterStorage;

impl<K> Storage<K> for CounterStorage {
    type Instance = Arc<AtomicCounter>;

    fn create(&self, _: &K) -> Self::Instance {
        Arc::new(AtomicCounter::new())
    }
}

/// Atomic storage for float counters.
#[derive(Clone, Debug, Default)]
pub struct FloatCounterStorage;

impl<K> Storage<K> for FloatCounterStorage {
    type Instance = Arc<AtomicFloatCounter>;

    fn create(&self, _: &K) -> Self::Instance {
        Arc::new(AtomicFloatCounter::new())
    }
}

/// Atomic storage for gauges.
#[derive(Clone, Debug, Default)]
pub struct GaugeStorage;

impl<K> Storage<K> for GaugeStorage {
    type Instance = Arc<AtomicGauge>;

    fn create(&self, _: &K) -> Self::Instance {
        Arc::new(AtomicGauge::new())
    }
}

/// Atomic storage for histograms.
///
/// Carries the bucket ladder every created histogram is fixed to.  The
/// bounds are validated once here, when the storage is built.
#[derive(Clone, Debug)]
pub struct HistogramStorage {
    bounds: Arc<[f64]>,
}

impl HistogramStorage {
    /// Creates a `HistogramStorage` with the given bucket upper bounds.
    ///
    /// Returns `None` if `bounds` is empty or not strictly ascending.
    pub fn new(bounds: &[f64]) -> Option<HistogramStorage> {
        if bounds.is_empty() || bounds.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }

        Some(HistogramStorage { bounds: bounds.into() })
    }

    /// The bucket upper bounds instances are created with.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }
}

impl Default for HistogramStorage {
    fn default() -> Self {
        HistogramStorage { bounds: DEFAULT_BUCKETS.into() }
    }
}

impl<K> Storage<K> for HistogramStorage {
    type Instance = Arc<AtomicHistogram>;

    fn create(&self, _: &K) -> Self::Instance {
        let histogram =
            AtomicHistogram::new(&self.bounds).expect("bucket bounds validated at construction");
        Arc::new(histogram)
    }
}

/// Atomic storage for summaries.
///
/// Carries the default max-age window and target quantiles; callers needing
/// per-identity parameters construct the instance themselves via
/// [`Registry::get_or_create_with`][crate::Registry::get_or_create_with].
#[derive(Clone, Debug)]
pub struct SummaryStorage {
    window: Duration,
    quantiles: Arc<[f64]>,
}

impl SummaryStorage {
    /// Creates a `SummaryStorage` with the given defaults.
    pub fn new(window: Duration, quantiles: &[f64]) -> SummaryStorage {
        SummaryStorage { window, quantiles: quantiles.into() }
    }
}

impl Default for SummaryStorage {
    fn default() -> Self {
        SummaryStorage::new(DEFAULT_SUMMARY_WINDOW, DEFAULT_SUMMARY_QUANTILES)
    }
}

impl<K> Storage<K> for SummaryStorage {
    type Instance = Arc<AtomicSummary>;

    fn create(&self, _: &K) -> Self::Instance {
        Arc::new(AtomicSummary::with_config(self.window, &self.quantiles))
    }
}
