//! Side-by-side comparison of two runs ("Query 1" vs "Query 2").
//!
//! Both runs are parsed independently; this module only zips the results.
//! Deltas are `b - a`, ratios `b / a`, so values above 1.0 mean the second
//! run is slower (latency) or faster (throughput).

use crate::digest::{percentile_label, RunDigest};
use crate::status::RunSummary;
use serde::Serialize;

/// One compared value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub name: String,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub delta: Option<f64>,
    pub ratio: Option<f64>,
}

impl MetricDelta {
    pub fn new(name: impl Into<String>, a: Option<f64>, b: Option<f64>) -> Self {
        let (delta, ratio) = match (a, b) {
            (Some(a), Some(b)) => (Some(b - a), (a != 0.0).then(|| b / a)),
            _ => (None, None),
        };
        Self {
            name: name.into(),
            a,
            b,
            delta,
            ratio,
        }
    }
}

/// Comparison of two digests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub label_a: String,
    pub label_b: String,
    /// Key percentile latencies, in seconds.
    pub latencies: Vec<MetricDelta>,
    /// Throughput figures; empty unless both runs carry a status line.
    pub throughput: Vec<MetricDelta>,
}

impl Comparison {
    pub fn new(a: &RunDigest, b: &RunDigest) -> Self {
        let mut percentiles: Vec<f64> = a.key_latencies.iter().map(|k| k.percentile).collect();
        for k in &b.key_latencies {
            if !percentiles.contains(&k.percentile) {
                percentiles.push(k.percentile);
            }
        }

        let latencies = percentiles
            .into_iter()
            .map(|p| MetricDelta::new(percentile_label(p), a.key_latency(p), b.key_latency(p)))
            .collect();

        let throughput = match (&a.status, &b.status) {
            (Some(sa), Some(sb)) => throughput_deltas(sa, sb),
            _ => {
                tracing::debug!("status line missing on one side, skipping throughput comparison");
                Vec::new()
            }
        };

        Self {
            label_a: a.label.clone(),
            label_b: b.label.clone(),
            latencies,
            throughput,
        }
    }
}

fn throughput_deltas(a: &RunSummary, b: &RunSummary) -> Vec<MetricDelta> {
    let fields: [(&str, fn(&RunSummary) -> f64); 5] = [
        ("QPS", |s| s.qps),
        ("RPS", |s| s.rps),
        ("MiB/s", |s| s.mib_per_s),
        ("result RPS", |s| s.result_rps),
        ("result MiB/s", |s| s.result_mib_per_s),
    ];
    fields
        .iter()
        .map(|(name, get)| MetricDelta::new(*name, Some(get(a)), Some(get(b))))
        .collect()
}
