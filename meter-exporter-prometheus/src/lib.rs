//! A meter facade that renders metrics in the Prometheus text exposition
//! format.
//!
//! This crate ties the meter ecosystem together: a [`Meter`] composes one
//! concurrent registry per metric kind (counter, float counter, gauge,
//! histogram, summary), resolves `(name, labels)` pairs to shared metric
//! instances, and writes an eventually-consistent snapshot of everything it
//! tracks as Prometheus text.
//!
//! # Usage
//!
//! ```
//! use meter_exporter_prometheus::Meter;
//!
//! let meter = Meter::builder().metric_prefix("micro_").build();
//! meter.init();
//!
//! let requests = meter.counter("server_requests_total", &["endpoint", "/users"])?;
//! requests.inc();
//!
//! let mut output = Vec::new();
//! meter.write(&mut output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Repeated lookups with the same name and labels return handles to the same
//! underlying instance, so instrumentation code can call the accessors at
//! the point of use without caching handles.  Handles are cheap to clone and
//! safe to update from any thread.

mod builder;
pub use self::builder::{MeterBuilder, MeterOptions, WriteOptions};

mod common;
pub use self::common::{BuildError, MetricFamily, Sample, SampleValue, WriteError};

mod formatting;
pub use self::formatting::{
    sanitize_label_key, sanitize_label_value, sanitize_metric_name, write_metric_line,
    write_type_line,
};

mod exporter;
pub use self::exporter::Meter;

mod process;
pub use self::process::Collect;

mod render;
