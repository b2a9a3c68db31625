use std::io;

use crate::common::{MetricFamily, Sample, SampleValue, WriteError};
use crate::formatting::{
    sanitize_label_key, sanitize_label_value, sanitize_metric_name, write_metric_line,
    write_type_line,
};

/// Encodes `families` into `sink` in the Prometheus text exposition format.
///
/// Each family renders as a `# TYPE` line followed by one sample line per
/// labeled instance; histogram and summary families expand into their
/// component `_bucket`/`_sum`/`_count` series.  The buffer is flushed to the
/// sink per family, so output already written when a sink error occurs is
/// left in place.
pub(crate) fn encode<W: io::Write>(
    sink: &mut W,
    families: &[MetricFamily],
) -> Result<(), WriteError> {
    let mut buffer = String::new();
    for family in families {
        buffer.clear();
        render_family(&mut buffer, family);
        sink.write_all(buffer.as_bytes())?;
    }

    Ok(())
}

fn render_family(buffer: &mut String, family: &MetricFamily) {
    let name = sanitize_metric_name(&family.name);
    write_type_line(buffer, &name, family.exposition_type());

    for sample in &family.samples {
        render_sample(buffer, &name, sample);
    }
}

fn render_sample(buffer: &mut String, name: &str, sample: &Sample) {
    let labels = sample
        .labels
        .iter()
        .map(|label| (sanitize_label_key(label.key()), sanitize_label_value(label.value())))
        .collect::<Vec<_>>();

    match &sample.value {
        SampleValue::Gauge(value) => {
            write_metric_line::<&str, f64>(buffer, name, None, &labels, None, *value);
        }
        SampleValue::Histogram { buckets, sum, count } => {
            for (le, bucket_count) in buckets {
                write_metric_line(
                    buffer,
                    name,
                    Some("bucket"),
                    &labels,
                    Some(("le", *le)),
                    *bucket_count,
                );
            }
            write_metric_line(buffer, name, Some("bucket"), &labels, Some(("le", "+Inf")), *count);
            write_metric_line::<&str, f64>(buffer, name, Some("sum"), &labels, None, *sum);
            write_metric_line::<&str, u64>(buffer, name, Some("count"), &labels, None, *count);
        }
        SampleValue::Summary { sum, count } => {
            write_metric_line::<&str, f64>(buffer, name, Some("sum"), &labels, None, *sum);
            write_metric_line::<&str, u64>(buffer, name, Some("count"), &labels, None, *count);
        }
    }
}
