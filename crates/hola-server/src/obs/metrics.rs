//! In-process metrics registry.
//!
//! Families are registered by name once at startup; after that the registry
//! is shared read-only (`Arc`) and every series lives in a `DashMap` keyed by
//! its sorted label pairs. Series are created lazily on first update and
//! never removed. Counter values and histogram buckets are atomics, so
//! concurrent updates to one series are never lost. Histogram sums are kept
//! in integer nanoseconds to stay on plain atomic adds.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use hola_core::error::{HolaError, Result};
use hola_core::exposition::{format_float, is_metric_name, label_pairs};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Default latency buckets (seconds), as shipped by the Prometheus clients.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value, `None` if the series was never touched.
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<u64> {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
    }

    fn render(&self, name: &str, out: &mut String) {
        let mut rows: Vec<(LabelKey, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", name, label_pairs(&key), format_float(val as f64));
        }
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum_nanos: AtomicU64,
    // one slot per finite bound; `+Inf` is `count`
    buckets: Vec<AtomicU64>,
}

impl AtomicHistogram {
    fn new(bounds: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_nanos: AtomicU64::new(0),
            buckets: (0..bounds).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

/// Point-in-time copy of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
    /// Cumulative `(le, count)` pairs, finite bounds only.
    pub buckets: Vec<(f64, u64)>,
}

pub struct HistogramVec {
    bounds: Vec<f64>,
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Bounds must be finite and strictly increasing.
    pub fn new(bounds: &[f64]) -> Result<Self> {
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(HolaError::Internal("histogram bounds must be finite".into()));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HolaError::Internal(
                "histogram bounds must be strictly increasing".into(),
            ));
        }
        Ok(Self {
            bounds: bounds.to_vec(),
            map: DashMap::new(),
        })
    }

    /// Observe a duration and increment the cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let secs = duration.as_secs_f64();
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicHistogram::new(self.bounds.len()));

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum_nanos.fetch_add(nanos, Ordering::Relaxed);
        for (slot, &le) in hist.buckets.iter().zip(&self.bounds) {
            if secs <= le {
                slot.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        self.map.get(&label_key(labels)).map(|h| self.snapshot(&h))
    }

    fn snapshot(&self, hist: &AtomicHistogram) -> HistogramSnapshot {
        HistogramSnapshot {
            count: hist.count.load(Ordering::Relaxed),
            sum: hist.sum_nanos.load(Ordering::Relaxed) as f64 / 1e9,
            buckets: self
                .bounds
                .iter()
                .zip(&hist.buckets)
                .map(|(&le, slot)| (le, slot.load(Ordering::Relaxed)))
                .collect(),
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let mut rows: Vec<(LabelKey, HistogramSnapshot)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), self.snapshot(r.value())))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, snap) in rows {
            let labels = label_pairs(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };

            for (le, count) in &snap.buckets {
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    format_float(*le),
                    format_float(*count as f64)
                );
            }
            let count = format_float(snap.count as f64);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, format_float(snap.sum));
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

enum Family {
    Counter(CounterVec),
    Histogram(HistogramVec),
}

struct Entry {
    help: String,
    family: Family,
}

/// Named metric families, rendered in name order.
#[derive(Default)]
pub struct Registry {
    families: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the two request metrics served by this app.
    pub fn http_defaults() -> Result<Self> {
        let mut reg = Self::new();
        reg.register_counter(HTTP_REQUESTS_TOTAL, "Total HTTP requests.")?;
        reg.register_histogram(
            HTTP_REQUEST_DURATION_SECONDS,
            "HTTP request latency in seconds.",
            &DEFAULT_BUCKETS,
        )?;
        Ok(reg)
    }

    pub fn register_counter(&mut self, name: &str, help: &str) -> Result<()> {
        self.register(name, help, Family::Counter(CounterVec::default()))
    }

    pub fn register_histogram(&mut self, name: &str, help: &str, bounds: &[f64]) -> Result<()> {
        let family = Family::Histogram(HistogramVec::new(bounds)?);
        self.register(name, help, family)
    }

    fn register(&mut self, name: &str, help: &str, family: Family) -> Result<()> {
        if !is_metric_name(name) {
            return Err(HolaError::Internal(format!("invalid metric name: {name}")));
        }
        if self.families.contains_key(name) {
            return Err(HolaError::Internal(format!("metric already registered: {name}")));
        }
        self.families.insert(
            name.to_string(),
            Entry { help: help.to_string(), family },
        );
        Ok(())
    }

    pub fn counter(&self, name: &str) -> Option<&CounterVec> {
        match self.families.get(name).map(|e| &e.family) {
            Some(Family::Counter(c)) => Some(c),
            _ => None,
        }
    }

    pub fn histogram(&self, name: &str) -> Option<&HistogramVec> {
        match self.families.get(name).map(|e| &e.family) {
            Some(Family::Histogram(h)) => Some(h),
            _ => None,
        }
    }

    /// Add 1 to the series; unknown names are logged and dropped.
    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        match self.counter(name) {
            Some(c) => c.inc(labels),
            None => tracing::warn!(metric = %name, "increment on unregistered counter dropped"),
        }
    }

    /// Record `value` seconds; negative or non-finite values are dropped.
    pub fn observe_histogram(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        match Duration::try_from_secs_f64(value) {
            Ok(d) => self.observe_duration(name, labels, d),
            Err(_) => tracing::warn!(metric = %name, value, "invalid observation dropped"),
        }
    }

    /// Record a measured duration without a float round trip.
    pub fn observe_duration(&self, name: &str, labels: &[(&str, &str)], duration: Duration) {
        match self.histogram(name) {
            Some(h) => h.observe(labels, duration),
            None => tracing::warn!(metric = %name, "observation on unregistered histogram dropped"),
        }
    }

    /// Render every family in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, entry) in &self.families {
            let _ = writeln!(out, "# HELP {} {}", name, escape_help(&entry.help));
            match &entry.family {
                Family::Counter(c) => {
                    let _ = writeln!(out, "# TYPE {} counter", name);
                    c.render(name, &mut out);
                }
                Family::Histogram(h) => {
                    let _ = writeln!(out, "# TYPE {} histogram", name);
                    h.render(name, &mut out);
                }
            }
        }
        out
    }
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}
