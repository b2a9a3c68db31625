/// Metric kind.
///
/// Defines the kind, or type, of a metric.  Each kind is tracked in its own
/// registry, so a counter and a gauge sharing a name are distinct metrics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MetricKind {
    /// Counter type.
    Counter,
    /// Float counter type.
    FloatCounter,
    /// Gauge type.
    Gauge,
    /// Histogram type.
    Histogram,
    /// Summary type.
    Summary,
}
