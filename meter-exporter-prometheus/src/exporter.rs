use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use meter::{
    canonicalize, Counter, CounterFn, FloatCounter, FloatCounterFn, Gauge, GaugeFn, Histogram,
    InvalidLabels, Key, Label, Summary,
};
use meter_util::{
    AtomicSummary, CounterStorage, FloatCounterStorage, GaugeStorage, HistogramStorage,
    MetricKind, Registry, SummaryStorage,
};

use crate::builder::{MeterBuilder, MeterOptions, WriteOptions};
use crate::common::{MetricFamily, Sample, SampleValue, WriteError};
use crate::process::{Collect, ProcessCollector};
use crate::render;

/// The shared state behind a meter and all of its clones.
///
/// One registry per metric kind: each registry is monomorphic over its
/// instance type, so resolving a handle never involves a runtime downcast,
/// and a counter and a gauge sharing a name are distinct metrics.
struct Inner {
    counters: Registry<Key, CounterStorage>,
    float_counters: Registry<Key, FloatCounterStorage>,
    gauges: Registry<Key, GaugeStorage>,
    histograms: Registry<Key, HistogramStorage>,
    summaries: Registry<Key, SummaryStorage>,
    collector: OnceLock<Box<dyn Collect>>,
}

/// A metrics facade rendering to the Prometheus text exposition format.
///
/// `Meter` resolves `(kind, name, labels)` triples to shared metric
/// instances with get-or-create semantics: repeated lookups with equivalent
/// name and labels return handles to the same instance, so updates
/// accumulate correctly no matter where they are issued from.  All handle
/// operations are atomic and safe to call from any number of threads.
///
/// Cloning a meter with [`clone_with`][Meter::clone_with] shares the
/// underlying registries -- metrics stay process-wide -- while carrying an
/// independent configuration overlay for scoped prefixes and default labels.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<Inner>,
    options: MeterOptions,
}

impl Meter {
    /// Creates a meter with the default configuration.
    pub fn new() -> Meter {
        MeterBuilder::new().build()
    }

    /// Creates a builder for configuring a meter.
    pub fn builder() -> MeterBuilder {
        MeterBuilder::new()
    }

    pub(crate) fn from_parts(options: MeterOptions, histograms: HistogramStorage) -> Meter {
        Meter {
            inner: Arc::new(Inner {
                counters: Registry::new(CounterStorage),
                float_counters: Registry::new(FloatCounterStorage),
                gauges: Registry::new(GaugeStorage),
                histograms: Registry::new(histograms),
                summaries: Registry::new(SummaryStorage::default()),
                collector: OnceLock::new(),
            }),
            options,
        }
    }

    /// Applies startup configuration.
    ///
    /// Arms the process self-metrics collector when either self-metrics
    /// option is enabled.  Idempotent; safe to call once at startup and
    /// harmless to call again.
    pub fn init(&self) {
        if self.options.process_metrics() || self.options.fd_metrics() {
            let _ = self.inner.collector.set(Box::new(ProcessCollector::new()));
        }
    }

    /// Installs a custom self-metrics source.
    ///
    /// Returns `false` if a collector was already installed; the first
    /// installation wins, matching [`init`][Meter::init]'s idempotence.
    pub fn install_collector(&self, collector: Box<dyn Collect>) -> bool {
        self.inner.collector.set(collector).is_ok()
    }

    /// The configuration overlay of this meter.
    pub fn options(&self) -> &MeterOptions {
        &self.options
    }

    /// Returns a meter sharing this meter's registries with a replacement
    /// configuration overlay.
    ///
    /// Metrics are not duplicated: instances already resolved through either
    /// meter stay visible to both.  The overlay only affects identities
    /// resolved through the clone from here on.
    pub fn clone_with(&self, options: MeterOptions) -> Meter {
        Meter { inner: Arc::clone(&self.inner), options }
    }

    /// Gets or creates the counter for the given name and labels.
    pub fn counter(&self, name: &str, labels: &[&str]) -> Result<Counter, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self
            .inner
            .counters
            .get_or_create(&key, |c| Counter::from_arc(Arc::clone(c))))
    }

    /// Gets or creates the float counter for the given name and labels.
    pub fn float_counter(
        &self,
        name: &str,
        labels: &[&str],
    ) -> Result<FloatCounter, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self
            .inner
            .float_counters
            .get_or_create(&key, |c| FloatCounter::from_arc(Arc::clone(c))))
    }

    /// Gets or creates the gauge for the given name and labels.
    ///
    /// `_observer` is reserved: it is accepted for call-site compatibility
    /// with observer-sampled gauge designs but is never invoked.  The gauge
    /// exports its stored value only.
    pub fn gauge(
        &self,
        name: &str,
        _observer: Option<fn() -> f64>,
        labels: &[&str],
    ) -> Result<Gauge, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self
            .inner
            .gauges
            .get_or_create(&key, |g| Gauge::from_arc(Arc::clone(g))))
    }

    /// Gets or creates the histogram for the given name and labels.
    ///
    /// The bucket ladder is the one configured at build time, fixed for the
    /// lifetime of the instance.
    pub fn histogram(&self, name: &str, labels: &[&str]) -> Result<Histogram, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self
            .inner
            .histograms
            .get_or_create(&key, |h| Histogram::from_arc(Arc::clone(h))))
    }

    /// Gets or creates the summary for the given name and labels, with the
    /// default window and quantiles.
    pub fn summary(&self, name: &str, labels: &[&str]) -> Result<Summary, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self
            .inner
            .summaries
            .get_or_create(&key, |s| Summary::from_arc(Arc::clone(s))))
    }

    /// Gets or creates the summary for the given name and labels, with an
    /// explicit max-age window and target quantiles.
    ///
    /// The parameters are fixed at instance creation: if the identity
    /// already exists, the existing instance is returned unchanged and the
    /// supplied parameters are ignored.  Aggregation is count-and-sum only
    /// either way; the parameters are retained for callers that need them.
    pub fn summary_ext(
        &self,
        name: &str,
        window: Duration,
        quantiles: &[f64],
        labels: &[&str],
    ) -> Result<Summary, InvalidLabels> {
        let key = self.build_key(name, labels)?;
        Ok(self.inner.summaries.get_or_create_with(
            &key,
            || Arc::new(AtomicSummary::with_config(window, quantiles)),
            |s| Summary::from_arc(Arc::clone(s)),
        ))
    }

    /// Writes the current state of every registered metric to `sink` in the
    /// Prometheus text exposition format.
    ///
    /// The output is an eventually-consistent snapshot: updates racing with
    /// the write may or may not be observed, and instances registered while
    /// the sweep is in progress may be missed until the next write.
    pub fn write<W: io::Write>(&self, sink: &mut W) -> Result<(), WriteError> {
        self.write_opts(sink, &WriteOptions::default())
    }

    /// Like [`write`][Meter::write], with per-call configuration overrides.
    pub fn write_opts<W: io::Write>(
        &self,
        sink: &mut W,
        opts: &WriteOptions,
    ) -> Result<(), WriteError> {
        let process = opts.process_metrics.unwrap_or(self.options.process_metrics());
        let fds = opts.fd_metrics.unwrap_or(self.options.fd_metrics());

        let mut families = Vec::new();
        if process || fds {
            match self.inner.collector.get() {
                Some(collector) => collector.collect(process, fds, &mut families),
                None => tracing::debug!(
                    "self-metrics requested but no collector installed; call init first"
                ),
            }
        }

        self.build_families(&mut families);
        render::encode(sink, &families)
    }

    fn build_key(&self, name: &str, labels: &[&str]) -> Result<Key, InvalidLabels> {
        let labels =
            canonicalize(self.options.default_labels(), self.options.label_prefix(), labels)?;
        Ok(Key::from_parts(self.prefixed_name(name), labels))
    }

    fn prefixed_name(&self, name: &str) -> String {
        let prefix = self.options.metric_prefix();
        if prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{prefix}{name}")
        }
    }

    /// Sweeps every registry and appends one family per (kind, name).
    ///
    /// Families within a kind are name-sorted for per-call determinism;
    /// order across kinds follows the sweep order below and is otherwise
    /// unspecified.
    fn build_families(&self, families: &mut Vec<MetricFamily>) {
        let mut counters: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        self.inner.counters.visit(|key, counter| {
            push_sample(&mut counters, key, SampleValue::Gauge(counter.get() as f64));
        });
        push_families(families, MetricKind::Counter, counters);

        let mut gauges: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        self.inner.gauges.visit(|key, gauge| {
            push_sample(&mut gauges, key, SampleValue::Gauge(gauge.get()));
        });
        push_families(families, MetricKind::Gauge, gauges);

        let mut float_counters: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        self.inner.float_counters.visit(|key, counter| {
            push_sample(&mut float_counters, key, SampleValue::Gauge(counter.get()));
        });
        push_families(families, MetricKind::FloatCounter, float_counters);

        let mut histograms: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        self.inner.histograms.visit(|key, histogram| {
            push_sample(
                &mut histograms,
                key,
                SampleValue::Histogram {
                    buckets: histogram.buckets(),
                    sum: histogram.sum(),
                    count: histogram.count(),
                },
            );
        });
        push_families(families, MetricKind::Histogram, histograms);

        let mut summaries: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        self.inner.summaries.visit(|key, summary| {
            push_sample(
                &mut summaries,
                key,
                SampleValue::Summary { sum: summary.sum(), count: summary.count() },
            );
        });
        push_families(families, MetricKind::Summary, summaries);
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter::new()
    }
}

fn push_sample(by_name: &mut BTreeMap<String, Vec<Sample>>, key: &Key, value: SampleValue) {
    by_name
        .entry(key.name().to_owned())
        .or_default()
        .push(Sample { labels: key.labels().cloned().collect::<Vec<Label>>(), value });
}

fn push_families(
    families: &mut Vec<MetricFamily>,
    kind: MetricKind,
    by_name: BTreeMap<String, Vec<Sample>>,
) {
    for (name, samples) in by_name {
        families.push(MetricFamily { name, kind, samples });
    }
}
