use meter::{IntoLabels, Label, SharedString};
use meter_util::HistogramStorage;

use crate::common::BuildError;
use crate::exporter::Meter;

/// Configuration overlay applied by one [`Meter`] when resolving identities.
///
/// A cloned meter shares the underlying registries with its parent but
/// carries its own independent copy of these options, so per-scope prefixes
/// and default labels never fragment metric storage.
#[derive(Clone, Debug, Default)]
pub struct MeterOptions {
    metric_prefix: String,
    label_prefix: String,
    default_labels: Vec<Label>,
    process_metrics: bool,
    fd_metrics: bool,
}

impl MeterOptions {
    /// Sets the prefix prepended to every metric name.
    pub fn with_metric_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.metric_prefix = prefix.into();
        self
    }

    /// Sets the prefix prepended to every label key.
    pub fn with_label_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Adds a label merged into every identity this meter resolves.
    pub fn with_default_label<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        self.default_labels.push(Label::new(key, value));
        self
    }

    /// Replaces the default label set.
    pub fn with_default_labels<L: IntoLabels>(mut self, labels: L) -> Self {
        self.default_labels = labels.into_labels();
        self
    }

    /// Enables or disables process self-metrics at write time.
    pub fn with_process_metrics(mut self, enabled: bool) -> Self {
        self.process_metrics = enabled;
        self
    }

    /// Enables or disables file-descriptor self-metrics at write time.
    pub fn with_fd_metrics(mut self, enabled: bool) -> Self {
        self.fd_metrics = enabled;
        self
    }

    /// The configured metric name prefix.
    pub fn metric_prefix(&self) -> &str {
        &self.metric_prefix
    }

    /// The configured label key prefix.
    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    /// The configured default labels.
    pub fn default_labels(&self) -> &[Label] {
        &self.default_labels
    }

    /// Whether process self-metrics are written.
    pub fn process_metrics(&self) -> bool {
        self.process_metrics
    }

    /// Whether file-descriptor self-metrics are written.
    pub fn fd_metrics(&self) -> bool {
        self.fd_metrics
    }
}

/// Per-call overrides for [`Meter::write_opts`][crate::Meter::write_opts].
///
/// Unset fields fall back to the meter's own options.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub(crate) process_metrics: Option<bool>,
    pub(crate) fd_metrics: Option<bool>,
}

impl WriteOptions {
    /// Creates a new `WriteOptions` with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides whether process self-metrics are written for this call.
    pub fn process_metrics(mut self, enabled: bool) -> Self {
        self.process_metrics = Some(enabled);
        self
    }

    /// Overrides whether file-descriptor self-metrics are written for this
    /// call.
    pub fn fd_metrics(mut self, enabled: bool) -> Self {
        self.fd_metrics = Some(enabled);
        self
    }
}

/// Builder for creating and configuring a [`Meter`].
pub struct MeterBuilder {
    options: MeterOptions,
    histograms: HistogramStorage,
}

impl MeterBuilder {
    /// Creates a new `MeterBuilder` with the default configuration.
    pub fn new() -> Self {
        MeterBuilder { options: MeterOptions::default(), histograms: HistogramStorage::default() }
    }

    /// Sets the prefix prepended to every metric name.
    pub fn metric_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.options = self.options.with_metric_prefix(prefix);
        self
    }

    /// Sets the prefix prepended to every label key.
    pub fn label_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.options = self.options.with_label_prefix(prefix);
        self
    }

    /// Adds a label merged into every identity the meter resolves.
    pub fn add_default_label<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        self.options = self.options.with_default_label(key, value);
        self
    }

    /// Sets the bucket ladder used by every histogram the meter creates.
    ///
    /// The ladder is fixed for the lifetime of the meter and shared by all
    /// of its clones; a `+Inf` bucket is implicit.
    pub fn set_buckets(mut self, bounds: &[f64]) -> Result<Self, BuildError> {
        self.histograms = HistogramStorage::new(bounds).ok_or(BuildError::InvalidBucketBounds)?;
        Ok(self)
    }

    /// Enables process self-metrics collection.
    pub fn enable_process_metrics(mut self, enabled: bool) -> Self {
        self.options = self.options.with_process_metrics(enabled);
        self
    }

    /// Enables file-descriptor self-metrics collection.
    pub fn enable_fd_metrics(mut self, enabled: bool) -> Self {
        self.options = self.options.with_fd_metrics(enabled);
        self
    }

    /// Builds the configured [`Meter`].
    pub fn build(self) -> Meter {
        Meter::from_parts(self.options, self.histograms)
    }
}

impl Default for MeterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
