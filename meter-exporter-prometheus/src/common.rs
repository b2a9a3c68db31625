use std::io;

use meter::Label;
use meter_util::MetricKind;

use thiserror::Error as ThisError;

/// Errors that could occur while building a meter.
#[derive(Debug, ThisError)]
pub enum BuildError {
    /// The histogram bucket bounds were empty or not strictly ascending.
    #[error("bucket bounds must be non-empty and strictly ascending")]
    InvalidBucketBounds,
}

/// Errors that could occur while writing the exposition output.
#[derive(Debug, ThisError)]
pub enum WriteError {
    /// Writing to the sink did not succeed.
    ///
    /// Output already written to the sink before the failure is left as-is;
    /// export is best-effort.
    #[error("failed to write exposition output: {0}")]
    Io(#[from] io::Error),
}

/// An export-time grouping of every instance sharing one name and kind.
///
/// Families are transient: they are built fresh on every write from a weakly
/// consistent sweep of the registries, handed to the text encoder, and
/// dropped.
#[derive(Clone, Debug)]
pub struct MetricFamily {
    /// The metric name shared by every sample in this family.
    pub name: String,
    /// The metric kind shared by every sample in this family.
    pub kind: MetricKind,
    /// One sample per labeled instance.
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// The Prometheus exposition type this family renders as.
    ///
    /// Counters and float counters layer their semantics over a gauge-typed
    /// value, so all three scalar kinds render as `gauge`.
    pub fn exposition_type(&self) -> &'static str {
        match self.kind {
            MetricKind::Counter | MetricKind::FloatCounter | MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

/// One labeled instance's current numeric snapshot.
#[derive(Clone, Debug)]
pub struct Sample {
    /// The instance's identity labels, in canonical order.
    pub labels: Vec<Label>,
    /// The snapshot value.
    pub value: SampleValue,
}

/// The numeric snapshot of a single metric instance.
#[derive(Clone, Debug)]
pub enum SampleValue {
    /// A single scalar value.
    Gauge(f64),
    /// Cumulative bucket counts plus total sum and count.
    Histogram {
        /// `(upper bound, cumulative count)` pairs in ascending bound order;
        /// the `+Inf` bucket is implicit and equals `count`.
        buckets: Vec<(f64, u64)>,
        /// Sum of all observed values.
        sum: f64,
        /// Total number of observations.
        count: u64,
    },
    /// Total sum and count.
    Summary {
        /// Sum of all observed values.
        sum: f64,
        /// Total number of observations.
        count: u64,
    },
}
