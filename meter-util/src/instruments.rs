//! Atomic metric instances.
//!
//! Each instance owns its numeric state exclusively and updates it with
//! atomic operations only: `u64` cells use native fetch-and-add, `f64` cells
//! go through [`AtomicF64`]'s CAS-over-bit-pattern loop.  No instance takes
//! a lock for a value update.

use std::sync::atomic::Ordering;
use std::time::Duration;

use meter::{
    AtomicF64, AtomicU64, CounterFn, FloatCounterFn, GaugeFn, HistogramFn, SummaryFn,
};

/// The default histogram bucket ladder, in seconds.
///
/// Matches the conventional latency ladder used by Prometheus client
/// libraries; a `+Inf` bucket is implicit.
pub const DEFAULT_BUCKETS: &[f64] =
    &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// The default summary max-age window.
pub const DEFAULT_SUMMARY_WINDOW: Duration = Duration::from_secs(5 * 60);

/// The default summary target quantiles.
pub const DEFAULT_SUMMARY_QUANTILES: &[f64] = &[0.5, 0.9, 0.99];

/// A relaxed integer counter.
///
/// The surface is unsigned 64-bit, but the cell is a 64-bit float so that
/// counters and float counters share the same atomic machinery; values are
/// cast at the boundary only.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicF64,
}

impl AtomicCounter {
    /// Creates a zero-valued counter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterFn for AtomicCounter {
    fn increment(&self) {
        self.value.add(1.0);
    }

    fn decrement(&self) {
        self.value.add(-1.0);
    }

    fn add(&self, value: i64) {
        self.value.add(value as f64);
    }

    fn set(&self, value: u64) {
        self.value.store(value as f64);
    }

    fn get(&self) -> u64 {
        self.value.load() as u64
    }
}

/// A floating-point counter.
#[derive(Debug, Default)]
pub struct AtomicFloatCounter {
    value: AtomicF64,
}

impl AtomicFloatCounter {
    /// Creates a zero-valued float counter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FloatCounterFn for AtomicFloatCounter {
    fn add(&self, value: f64) {
        self.value.add(value);
    }

    fn sub(&self, value: f64) {
        self.value.add(-value);
    }

    fn set(&self, value: f64) {
        self.value.store(value);
    }

    fn get(&self) -> f64 {
        self.value.load()
    }
}

/// An externally-observed gauge.
///
/// The stored value is updated through [`AtomicGauge::set`] by whatever
/// producer owns a reference to the instance; the public handle surface is
/// read-only.
#[derive(Debug, Default)]
pub struct AtomicGauge {
    value: AtomicF64,
}

impl AtomicGauge {
    /// Creates a zero-valued gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new value, last write wins.
    pub fn set(&self, value: f64) {
        self.value.store(value);
    }
}

impl GaugeFn for AtomicGauge {
    fn get(&self) -> f64 {
        self.value.load()
    }
}

/// A fixed-bucket cumulative histogram.
///
/// The ascending upper-bound ladder is fixed at creation and never changes
/// for the lifetime of the instance.  Buckets are cumulative: an observation
/// increments every bucket whose upper bound is greater than or equal to the
/// observed value, not just the first such bucket.
#[derive(Debug)]
pub struct AtomicHistogram {
    bounds: Box<[f64]>,
    buckets: Box<[AtomicU64]>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl AtomicHistogram {
    /// Creates a new `AtomicHistogram` with the given bucket upper bounds.
    ///
    /// Returns `None` if `bounds` is empty or not strictly ascending.
    pub fn new(bounds: &[f64]) -> Option<AtomicHistogram> {
        if bounds.is_empty() || bounds.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }

        let buckets = bounds.iter().map(|_| AtomicU64::new(0)).collect();

        Some(AtomicHistogram {
            bounds: Vec::from(bounds).into_boxed_slice(),
            buckets,
            count: AtomicU64::new(0),
            sum: AtomicF64::new(0.0),
        })
    }

    /// Gets the sum of all samples.
    pub fn sum(&self) -> f64 {
        self.sum.load()
    }

    /// Gets the sample count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Gets the buckets.
    ///
    /// Buckets are tuples, where the first element is the bucket upper bound
    /// itself, and the second element is the cumulative count of samples less
    /// than or equal to that bound.
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .zip(self.buckets.iter())
            .map(|(bound, bucket)| (*bound, bucket.load(Ordering::Acquire)))
            .collect()
    }
}

impl HistogramFn for AtomicHistogram {
    fn record(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Release);
        self.sum.add(value);

        // Cumulative semantics: every bucket at or above the sample gets the
        // increment, so keep walking past the first match.
        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter()) {
            if value <= *bound {
                bucket.fetch_add(1, Ordering::Release);
            }
        }
    }

    fn reset(&self) {}
}

/// A count-and-sum summary.
///
/// The max-age window and target quantiles are retained from construction
/// for callers that need them, but aggregation ignores both: no quantile
/// estimation is performed and samples never age out.
#[derive(Debug)]
pub struct AtomicSummary {
    count: AtomicU64,
    sum: AtomicF64,
    window: Duration,
    quantiles: Box<[f64]>,
}

impl AtomicSummary {
    /// Creates a new `AtomicSummary` with the default window and quantiles.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_SUMMARY_WINDOW, DEFAULT_SUMMARY_QUANTILES)
    }

    /// Creates a new `AtomicSummary` with the given window and quantiles.
    pub fn with_config(window: Duration, quantiles: &[f64]) -> Self {
        AtomicSummary {
            count: AtomicU64::new(0),
            sum: AtomicF64::new(0.0),
            window,
            quantiles: Vec::from(quantiles).into_boxed_slice(),
        }
    }

    /// Gets the sample count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Gets the sum of all samples.
    pub fn sum(&self) -> f64 {
        self.sum.load()
    }

    /// The max-age window this summary was created with.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The target quantiles this summary was created with.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }
}

impl Default for AtomicSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFn for AtomicSummary {
    fn record(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Release);
        self.sum.add(value);
    }
}
