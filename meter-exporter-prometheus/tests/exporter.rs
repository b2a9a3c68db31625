use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use meter_exporter_prometheus::{
    Collect, Meter, MeterOptions, MetricFamily, Sample, SampleValue, WriteOptions,
};
use meter_util::MetricKind;

fn render(meter: &Meter) -> String {
    let mut sink = Vec::new();
    meter.write(&mut sink).unwrap();
    String::from_utf8(sink).unwrap()
}

#[test]
fn test_identity_stability() {
    let meter = Meter::new();

    let first = meter.counter("requests", &["endpoint", "ep1"]).unwrap();
    let second = meter.counter("requests", &["endpoint", "ep1"]).unwrap();

    first.inc();
    first.inc();
    second.inc();

    // A mutation through one handle is visible through the other.
    assert_eq!(first.get(), 3);
    assert_eq!(second.get(), 3);
}

#[test]
fn test_label_order_addresses_distinct_identities() {
    let meter = Meter::new();

    let forward = meter.counter("x", &["a", "1", "b", "2"]).unwrap();
    forward.inc();
    forward.inc();

    // Same labels, different supplied order: a different identity.
    let reversed = meter.counter("x", &["b", "2", "a", "1"]).unwrap();
    assert_eq!(reversed.get(), 0);
    assert_eq!(forward.get(), 2);

    let output = render(&meter);
    assert!(output.contains("x{a=\"1\",b=\"2\"} 2\n"), "bad output: {output}");
    assert!(output.contains("x{b=\"2\",a=\"1\"} 0\n"), "bad output: {output}");
}

#[test]
fn test_concurrent_increments_lose_nothing() {
    let meter = Arc::new(Meter::new());

    let handles = (0..8)
        .map(|_| {
            let meter = Arc::clone(&meter);
            thread::spawn(move || {
                let counter = meter.counter("contended", &[]).unwrap();
                for _ in 0..12_500 {
                    counter.inc();
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(meter.counter("contended", &[]).unwrap().get(), 100_000);
}

#[test]
fn test_histogram_cumulative_profile() {
    let meter = Meter::new();

    let histogram = meter.histogram("test", &[]).unwrap();
    for value in [1.0, 1.0, 5.0, 10.0, 10.0, 30.0] {
        histogram.record(value);
    }

    let output = render(&meter);
    assert!(output.contains("# TYPE test histogram\n"), "bad output: {output}");
    for line in [
        "test_bucket{le=\"0.005\"} 0\n",
        "test_bucket{le=\"0.5\"} 0\n",
        "test_bucket{le=\"1\"} 2\n",
        "test_bucket{le=\"2.5\"} 2\n",
        "test_bucket{le=\"5\"} 3\n",
        "test_bucket{le=\"10\"} 5\n",
        "test_bucket{le=\"+Inf\"} 6\n",
        "test_sum 57\n",
        "test_count 6\n",
    ] {
        assert!(output.contains(line), "missing {line:?} in: {output}");
    }
}

#[test]
fn test_export_round_trip() {
    let meter = Meter::new();

    let counter = meter.counter("micro_server", &["endpoint", "ep1", "path", "/path1"]).unwrap();
    counter.inc();
    counter.inc();

    let output = render(&meter);
    assert!(
        output.contains("micro_server{endpoint=\"ep1\",path=\"/path1\"} 2\n"),
        "bad output: {output}"
    );
}

#[test]
fn test_kinds_are_isolated_per_registry() {
    let meter = Meter::new();

    let counter = meter.counter("shared_name", &[]).unwrap();
    counter.add(3);
    let gauge = meter.gauge("shared_name", None, &[]).unwrap();
    assert_eq!(gauge.get(), 0.0);

    let output = render(&meter);
    // Both kinds render as the gauge primitive, but as two separate families
    // with their own values.
    assert_eq!(output.matches("# TYPE shared_name gauge\n").count(), 2, "bad output: {output}");
    assert!(output.contains("shared_name 3\n"), "bad output: {output}");
    assert!(output.contains("shared_name 0\n"), "bad output: {output}");
}

#[test]
fn test_clone_overlay_is_independent_and_storage_is_shared() {
    let meter = Meter::new();
    let original = meter.counter("requests", &["endpoint", "ep1"]).unwrap();
    original.inc();

    let scoped =
        meter.clone_with(meter.options().clone().with_default_label("svc", "api"));
    let labeled = scoped.counter("requests", &["endpoint", "ep1"]).unwrap();
    labeled.inc();

    // The overlay only affects identities resolved through the clone; the
    // original instance is untouched.
    assert_eq!(original.get(), 1);
    assert_eq!(labeled.get(), 1);

    // Storage is shared, so both series show up in the parent's output too.
    let output = render(&meter);
    assert!(output.contains("requests{endpoint=\"ep1\"} 1\n"), "bad output: {output}");
    assert!(
        output.contains("requests{svc=\"api\",endpoint=\"ep1\"} 1\n"),
        "bad output: {output}"
    );
}

#[test]
fn test_same_identity_through_clone_accumulates() {
    let meter = Meter::new();
    let clone = meter.clone_with(meter.options().clone());

    meter.counter("hits", &[]).unwrap().inc();
    clone.counter("hits", &[]).unwrap().inc();

    assert_eq!(meter.counter("hits", &[]).unwrap().get(), 2);
}

#[test]
fn test_prefixes_and_default_labels() {
    let meter = Meter::builder()
        .metric_prefix("micro_")
        .label_prefix("l_")
        .add_default_label("svc", "billing")
        .build();

    meter.counter("requests", &["code", "200"]).unwrap().inc();

    let output = render(&meter);
    assert!(
        output.contains("micro_requests{l_svc=\"billing\",l_code=\"200\"} 1\n"),
        "bad output: {output}"
    );
}

#[test]
fn test_odd_label_list_fails_fast() {
    let meter = Meter::new();
    let err = meter.counter("x", &["dangling"]).unwrap_err();
    assert_eq!(err.len(), 1);
}

#[test]
fn test_float_counter_values() {
    let meter = Meter::new();

    let counter = meter.float_counter("ratio", &[]).unwrap();
    counter.add(3.0);
    counter.sub(0.5);
    assert_eq!(counter.get(), 2.5);

    let output = render(&meter);
    assert!(output.contains("ratio 2.5\n"), "bad output: {output}");
}

#[test]
fn test_summary_ext_resolves_to_same_instance() {
    let meter = Meter::new();

    let ext = meter
        .summary_ext("latency", Duration::from_secs(60), &[0.5, 0.99], &[])
        .unwrap();
    ext.record(1.0);

    // A later plain lookup with the same identity hits the same instance;
    // the original parameters stick.
    let plain = meter.summary("latency", &[]).unwrap();
    plain.record(2.0);

    let output = render(&meter);
    assert!(output.contains("# TYPE latency summary\n"), "bad output: {output}");
    assert!(output.contains("latency_sum 3\n"), "bad output: {output}");
    assert!(output.contains("latency_count 2\n"), "bad output: {output}");
}

struct FakeCollector;

impl Collect for FakeCollector {
    fn collect(&self, process: bool, _fds: bool, families: &mut Vec<MetricFamily>) {
        if process {
            families.push(MetricFamily {
                name: "fake_metric".to_owned(),
                kind: MetricKind::Gauge,
                samples: vec![Sample { labels: Vec::new(), value: SampleValue::Gauge(1.0) }],
            });
        }
    }
}

#[test]
fn test_collector_families_merge_into_output() {
    let meter = Meter::builder().enable_process_metrics(true).build();
    assert!(meter.install_collector(Box::new(FakeCollector)));

    meter.counter("requests", &[]).unwrap().inc();

    let output = render(&meter);
    assert!(output.contains("fake_metric 1\n"), "bad output: {output}");
    assert!(output.contains("requests 1\n"), "bad output: {output}");

    // Per-call override drops the collector families without touching the
    // registry sweep.
    let mut sink = Vec::new();
    meter
        .write_opts(&mut sink, &WriteOptions::new().process_metrics(false).fd_metrics(false))
        .unwrap();
    let output = String::from_utf8(sink).unwrap();
    assert!(!output.contains("fake_metric"), "bad output: {output}");
    assert!(output.contains("requests 1\n"), "bad output: {output}");
}

#[cfg(target_os = "linux")]
#[test]
fn test_process_metrics_written_on_linux() {
    let meter = Meter::builder().enable_process_metrics(true).enable_fd_metrics(true).build();
    meter.init();

    let output = render(&meter);
    assert!(output.contains("process_open_fds"), "bad output: {output}");
}

struct FailingSink;

impl io::Write for FailingSink {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_sink_errors_surface_to_caller() {
    let meter = Meter::new();
    meter.counter("requests", &[]).unwrap().inc();

    let result = meter.write(&mut FailingSink);
    assert!(result.is_err());
}

#[test]
fn test_options_overlay_accessors() {
    let options = MeterOptions::default()
        .with_metric_prefix("micro_")
        .with_label_prefix("l_")
        .with_default_label("svc", "api")
        .with_process_metrics(true)
        .with_fd_metrics(false);

    assert_eq!(options.metric_prefix(), "micro_");
    assert_eq!(options.label_prefix(), "l_");
    assert_eq!(options.default_labels().len(), 1);
    assert!(options.process_metrics());
    assert!(!options.fd_metrics());
}
