//! Process-level self-metrics.
//!
//! The meter itself only aggregates what callers record; process-wide
//! figures (open file descriptors, memory sizes, thread count) come from an
//! external source merged into the family list at write time.  The source is
//! pluggable through [`Collect`] so tests can substitute a fixed family
//! list; the default implementation reads Linux procfs and yields nothing on
//! other platforms.

use crate::common::MetricFamily;

/// A source of pre-formed metric families merged into the exposition output.
pub trait Collect: Send + Sync {
    /// Appends families to `families`.
    ///
    /// `process` asks for process-level figures (memory, threads, start
    /// time); `fds` asks for file-descriptor figures.  Either may be false
    /// when a write call has overridden the meter's configuration.
    fn collect(&self, process: bool, fds: bool, families: &mut Vec<MetricFamily>);
}

/// The default procfs-backed collector.
pub(crate) struct ProcessCollector;

impl ProcessCollector {
    pub(crate) fn new() -> Self {
        ProcessCollector
    }
}

impl Collect for ProcessCollector {
    #[cfg(target_os = "linux")]
    fn collect(&self, process: bool, fds: bool, families: &mut Vec<MetricFamily>) {
        linux::collect(process, fds, families);
    }

    #[cfg(not(target_os = "linux"))]
    fn collect(&self, _process: bool, _fds: bool, _families: &mut Vec<MetricFamily>) {
        tracing::debug!("process self-metrics are only available on linux");
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs;

    use meter_util::MetricKind;

    use crate::common::{MetricFamily, Sample, SampleValue};

    // Kernel clock ticks per second; fixed at 100 on every architecture
    // Linux exposes USER_HZ as.
    const TICKS_PER_SECOND: f64 = 100.0;

    pub(super) fn collect(process: bool, fds: bool, families: &mut Vec<MetricFamily>) {
        if process {
            let status = fs::read_to_string("/proc/self/status").ok();
            if let Some(status) = status.as_deref() {
                push_gauge(families, "process_virtual_memory_bytes", status_bytes(status, "VmSize:"));
                push_gauge(families, "process_resident_memory_bytes", status_bytes(status, "VmRSS:"));
                push_gauge(families, "process_threads", status_value(status, "Threads:"));
            } else {
                tracing::debug!("failed to read /proc/self/status");
            }
            push_gauge(families, "process_start_time_seconds", start_time_seconds());
        }

        if fds {
            push_gauge(families, "process_open_fds", open_fds());
            push_gauge(families, "process_max_fds", max_fds());
        }
    }

    fn push_gauge(families: &mut Vec<MetricFamily>, name: &str, value: Option<f64>) {
        let Some(value) = value else {
            tracing::debug!(metric = name, "self-metric unavailable; skipping");
            return;
        };

        families.push(MetricFamily {
            name: name.to_owned(),
            kind: MetricKind::Gauge,
            samples: vec![Sample { labels: Vec::new(), value: SampleValue::Gauge(value) }],
        });
    }

    fn status_value(status: &str, field: &str) -> Option<f64> {
        let line = status.lines().find(|line| line.starts_with(field))?;
        line[field.len()..].split_whitespace().next()?.parse().ok()
    }

    fn status_bytes(status: &str, field: &str) -> Option<f64> {
        // Status memory fields are reported in kB.
        status_value(status, field).map(|kb| kb * 1024.0)
    }

    fn open_fds() -> Option<f64> {
        let entries = fs::read_dir("/proc/self/fd").ok()?;
        Some(entries.count() as f64)
    }

    fn max_fds() -> Option<f64> {
        let limits = fs::read_to_string("/proc/self/limits").ok()?;
        let line = limits.lines().find(|line| line.starts_with("Max open files"))?;
        line.split_whitespace().rev().nth(2)?.parse().ok()
    }

    fn start_time_seconds() -> Option<f64> {
        let stat = fs::read_to_string("/proc/self/stat").ok()?;
        // The comm field may contain spaces, so fields are counted from the
        // closing parenthesis.  starttime is field 22 overall, which is the
        // 20th field after comm.
        let rest = &stat[stat.rfind(')')? + 1..];
        let start_ticks: f64 = rest.split_whitespace().nth(19)?.parse().ok()?;

        let stat = fs::read_to_string("/proc/stat").ok()?;
        let btime: f64 = stat
            .lines()
            .find(|line| line.starts_with("btime"))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()?;

        Some(btime + start_ticks / TICKS_PER_SECOND)
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::{Collect, ProcessCollector};

    #[test]
    fn test_collector_reports_fd_and_process_families() {
        let mut families = Vec::new();
        ProcessCollector::new().collect(true, true, &mut families);

        let names = families.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert!(names.contains(&"process_open_fds"));
        assert!(names.contains(&"process_threads"));
    }

    #[test]
    fn test_collector_honors_flags() {
        let mut families = Vec::new();
        ProcessCollector::new().collect(false, false, &mut families);
        assert!(families.is_empty());
    }
}
