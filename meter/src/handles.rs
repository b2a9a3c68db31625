use std::sync::Arc;

use quanta::Instant;

/// A counter handler.
///
/// This is a relaxed counter: by convention it is monotonic, but decrement
/// and absolute set are permitted for callers synchronizing with an external
/// count they do not control.
pub trait CounterFn {
    /// Increments the counter by one.
    fn increment(&self);

    /// Decrements the counter by one.
    fn decrement(&self);

    /// Adds `value` to the counter.  Negative values are permitted.
    fn add(&self, value: i64);

    /// Sets the counter to the given absolute value.
    fn set(&self, value: u64);

    /// Reads the current value of the counter.
    fn get(&self) -> u64;
}

/// A float counter handler.
pub trait FloatCounterFn {
    /// Adds `value` to the counter.
    fn add(&self, value: f64);

    /// Subtracts `value` from the counter.
    fn sub(&self, value: f64);

    /// Sets the counter to the given value.
    fn set(&self, value: f64);

    /// Reads the current value of the counter.
    fn get(&self) -> f64;
}

/// A gauge handler.
///
/// Gauges are externally observed: the stored value is updated by whatever
/// producer owns the underlying cell, and the public surface is read-only.
pub trait GaugeFn {
    /// Reads the currently stored value.
    fn get(&self) -> f64;
}

/// A histogram handler.
pub trait HistogramFn {
    /// Records a value into the histogram.
    fn record(&self, value: f64);

    /// Resets the histogram.
    ///
    /// Bucket counts aggregate since creation and are never cleared during
    /// normal operation; implementations treat this as a no-op.
    fn reset(&self);
}

/// A summary handler.
pub trait SummaryFn {
    /// Records a value into the summary.
    fn record(&self, value: f64);
}

/// A counter.
#[derive(Clone)]
pub struct Counter {
    inner: Option<Arc<dyn CounterFn + Send + Sync>>,
}

/// A floating-point counter.
#[derive(Clone)]
pub struct FloatCounter {
    inner: Option<Arc<dyn FloatCounterFn + Send + Sync>>,
}

/// A gauge.
#[derive(Clone)]
pub struct Gauge {
    inner: Option<Arc<dyn GaugeFn + Send + Sync>>,
}

/// A histogram.
#[derive(Clone)]
pub struct Histogram {
    inner: Option<Arc<dyn HistogramFn + Send + Sync>>,
}

/// A summary.
#[derive(Clone)]
pub struct Summary {
    inner: Option<Arc<dyn SummaryFn + Send + Sync>>,
}

impl core::fmt::Debug for Counter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Counter")
            .field("inner", &self.inner.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Counter {
    /// Creates a no-op `Counter` which does nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Creates a `Counter` based on a shared handler.
    pub fn from_arc<F: CounterFn + Send + Sync + 'static>(a: Arc<F>) -> Self {
        Self { inner: Some(a) }
    }

    /// Increments the counter by one.
    pub fn inc(&self) {
        if let Some(ref inner) = self.inner {
            inner.increment();
        }
    }

    /// Decrements the counter by one.
    pub fn dec(&self) {
        if let Some(ref inner) = self.inner {
            inner.decrement();
        }
    }

    /// Adds `value` to the counter.
    pub fn add(&self, value: i64) {
        if let Some(ref inner) = self.inner {
            inner.add(value);
        }
    }

    /// Sets the counter to an absolute value.
    pub fn set(&self, value: u64) {
        if let Some(ref inner) = self.inner {
            inner.set(value);
        }
    }

    /// Reads the current value of the counter.
    pub fn get(&self) -> u64 {
        self.inner.as_ref().map_or(0, |inner| inner.get())
    }
}

impl FloatCounter {
    /// Creates a no-op `FloatCounter` which does nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Creates a `FloatCounter` based on a shared handler.
    pub fn from_arc<F: FloatCounterFn + Send + Sync + 'static>(a: Arc<F>) -> Self {
        Self { inner: Some(a) }
    }

    /// Adds `value` to the counter.
    pub fn add(&self, value: f64) {
        if let Some(ref inner) = self.inner {
            inner.add(value);
        }
    }

    /// Subtracts `value` from the counter.
    pub fn sub(&self, value: f64) {
        if let Some(ref inner) = self.inner {
            inner.sub(value);
        }
    }

    /// Sets the counter to the given value.
    pub fn set(&self, value: f64) {
        if let Some(ref inner) = self.inner {
            inner.set(value);
        }
    }

    /// Reads the current value of the counter.
    pub fn get(&self) -> f64 {
        self.inner.as_ref().map_or(0.0, |inner| inner.get())
    }
}

impl Gauge {
    /// Creates a no-op `Gauge` which does nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Creates a `Gauge` based on a shared handler.
    pub fn from_arc<F: GaugeFn + Send + Sync + 'static>(a: Arc<F>) -> Self {
        Self { inner: Some(a) }
    }

    /// Reads the currently stored value.
    pub fn get(&self) -> f64 {
        self.inner.as_ref().map_or(0.0, |inner| inner.get())
    }
}

impl Histogram {
    /// Creates a no-op `Histogram` which does nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Creates a `Histogram` based on a shared handler.
    pub fn from_arc<F: HistogramFn + Send + Sync + 'static>(a: Arc<F>) -> Self {
        Self { inner: Some(a) }
    }

    /// Records a value into the histogram.
    pub fn record(&self, value: f64) {
        if let Some(ref inner) = self.inner {
            inner.record(value);
        }
    }

    /// Records the seconds elapsed since `start`.
    pub fn record_duration(&self, start: Instant) {
        self.record(start.elapsed().as_secs_f64());
    }

    /// Resets the histogram.  A documented no-op; see [`HistogramFn::reset`].
    pub fn reset(&self) {
        if let Some(ref inner) = self.inner {
            inner.reset();
        }
    }
}

impl Summary {
    /// Creates a no-op `Summary` which does nothing.
    pub fn noop() -> Self {
        Self { inner: None }
    }

    /// Creates a `Summary` based on a shared handler.
    pub fn from_arc<F: SummaryFn + Send + Sync + 'static>(a: Arc<F>) -> Self {
        Self { inner: Some(a) }
    }

    /// Records a value into the summary.
    pub fn record(&self, value: f64) {
        if let Some(ref inner) = self.inner {
            inner.record(value);
        }
    }

    /// Records the seconds elapsed since `start`.
    pub fn record_duration(&self, start: Instant) {
        self.record(start.elapsed().as_secs_f64());
    }
}
