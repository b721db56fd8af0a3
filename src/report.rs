//! Report rendering: terminal tables or a JSON document.

use crate::compare::{Comparison, MetricDelta};
use crate::config::{OutputFormat, ReportConfig};
use crate::digest::{KeyLatency, RunDigest};
use crate::percentiles::LatencyObservation;
use crate::status::RunSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Everything produced by one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub runs: Vec<RunDigest>,
    pub comparison: Option<Comparison>,
}

impl Report {
    /// Build a report; two runs get a comparison section.
    pub fn new(runs: Vec<RunDigest>) -> Self {
        let comparison = match runs.as_slice() {
            [a, b] => Some(Comparison::new(a, b)),
            _ => None,
        };
        Self {
            generated_at: Utc::now(),
            runs,
            comparison,
        }
    }

    pub fn render(&self, cfg: &ReportConfig) -> Result<String, serde_json::Error> {
        match cfg.format {
            OutputFormat::Text => Ok(self.render_text(cfg)),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }

    pub fn render_text(&self, cfg: &ReportConfig) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.push_str(&render_run(run, cfg));
        }
        if let Some(cmp) = &self.comparison {
            out.push_str(&render_comparison(cmp, cfg));
        }
        out
    }
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Metric")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct LatencyRow {
    #[tabled(rename = "Percentile")]
    percentile: String,
    #[tabled(rename = "Latency (s)")]
    latency: String,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

fn section(out: &mut String, title: &str, body: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(body);
    out.push_str("\n\n");
}

fn fmt_latency(latency: Option<f64>, precision: usize) -> String {
    match latency {
        Some(l) => format!("{l:.precision$}"),
        None => "n/a".to_string(),
    }
}

fn render_run(run: &RunDigest, cfg: &ReportConfig) -> String {
    let mut out = format!("== {} ==\n\n", run.label);

    if let Some(query) = &run.query {
        let indented: Vec<String> = query.lines().map(|l| format!("  {l}")).collect();
        section(&mut out, "Query", &indented.join("\n"));
    }

    if let Some(status) = &run.status {
        section(
            &mut out,
            &format!("Throughput ({})", status.endpoint),
            &status_table(status),
        );
    }

    if !run.key_latencies.is_empty() {
        let rows = run
            .key_latencies
            .iter()
            .map(|k| LatencyRow {
                percentile: k.label(),
                latency: fmt_latency(k.latency_seconds, cfg.latency_precision),
            })
            .collect();
        section(&mut out, "Key percentile latencies", &table(rows));
        section(
            &mut out,
            "Key percentile chart",
            &bar_chart(&run.key_latencies, cfg.bar_width, cfg.latency_precision),
        );
    }

    if !run.observations.is_empty() {
        section(
            &mut out,
            "Latency distribution",
            &distribution_table(&run.observations, cfg.latency_precision, cfg.bar_width),
        );
    }

    out
}

fn status_table(s: &RunSummary) -> String {
    table(vec![
        ValueRow {
            name: "Queries",
            value: s.queries.to_string(),
        },
        ValueRow {
            name: "QPS",
            value: format!("{:.3}", s.qps),
        },
        ValueRow {
            name: "RPS (millions)",
            value: format!("{:.3}", s.rps_millions()),
        },
        ValueRow {
            name: "MiB/s",
            value: format!("{:.3}", s.mib_per_s),
        },
        ValueRow {
            name: "Result RPS (thousands)",
            value: format!("{:.3}", s.result_rps_thousands()),
        },
        ValueRow {
            name: "Result MiB/s",
            value: format!("{:.3}", s.result_mib_per_s),
        },
    ])
}

#[derive(Tabled)]
struct DistributionRow {
    #[tabled(rename = "Percentile")]
    percentile: String,
    #[tabled(rename = "Latency (s)")]
    latency: String,
    #[tabled(rename = "Log scale")]
    log_bar: String,
}

fn distribution_table(
    observations: &[LatencyObservation],
    precision: usize,
    bar_width: usize,
) -> String {
    let bars = log_scale_bars(observations, bar_width);
    let rows = observations
        .iter()
        .zip(bars)
        .map(|(o, log_bar)| DistributionRow {
            percentile: format!("{:.3}%", o.percentile),
            latency: fmt_latency(Some(o.latency_seconds), precision),
            log_bar,
        })
        .collect();
    table(rows)
}

/// One bar per observation, its length logarithmic in latency between the
/// fastest and slowest positive rows. Zero latencies get no bar.
fn log_scale_bars(observations: &[LatencyObservation], width: usize) -> Vec<String> {
    let positive = observations
        .iter()
        .map(|o| o.latency_seconds)
        .filter(|l| *l > 0.0);
    let min = positive.clone().fold(f64::INFINITY, f64::min);
    let max = positive.fold(0.0_f64, f64::max);
    let span = max.ln() - min.ln();

    observations
        .iter()
        .map(|o| {
            let l = o.latency_seconds;
            if l <= 0.0 || width == 0 {
                return String::new();
            }
            let len = if span > 0.0 {
                let frac = (l.ln() - min.ln()) / span;
                1 + (frac * (width - 1) as f64).round() as usize
            } else {
                width
            };
            "█".repeat(len)
        })
        .collect()
}

/// Horizontal bars scaled so the slowest key percentile spans `width`.
pub fn bar_chart(keys: &[KeyLatency], width: usize, precision: usize) -> String {
    let max = keys
        .iter()
        .filter_map(|k| k.latency_seconds)
        .fold(0.0_f64, f64::max);
    let labels: Vec<String> = keys.iter().map(KeyLatency::label).collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let lines: Vec<String> = keys
        .iter()
        .zip(&labels)
        .map(|(k, label)| {
            let bar = match k.latency_seconds {
                Some(l) if max > 0.0 => {
                    let len = ((l / max) * width as f64).round() as usize;
                    "█".repeat(if l > 0.0 { len.max(1) } else { 0 })
                }
                _ => String::new(),
            };
            let value = fmt_latency(k.latency_seconds, precision);
            format!("{label:<label_width$} │{bar} {value}")
        })
        .collect();
    lines.join("\n")
}

fn fmt_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}x"))
}

fn delta_table(cmp: &Comparison, rows: &[MetricDelta], first: &str, precision: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        first.to_string(),
        cmp.label_a.clone(),
        cmp.label_b.clone(),
        "Delta".to_string(),
        "Ratio".to_string(),
    ]);
    for m in rows {
        builder.push_record([
            m.name.clone(),
            fmt_latency(m.a, precision),
            fmt_latency(m.b, precision),
            m.delta
                .map_or_else(|| "n/a".to_string(), |d| format!("{d:+.precision$}")),
            fmt_ratio(m.ratio),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

fn render_comparison(cmp: &Comparison, cfg: &ReportConfig) -> String {
    let mut out = format!("== {} vs {} ==\n\n", cmp.label_a, cmp.label_b);

    if !cmp.latencies.is_empty() {
        section(
            &mut out,
            "Key percentile latencies (s)",
            &delta_table(cmp, &cmp.latencies, "Percentile", cfg.latency_precision),
        );
    }
    if !cmp.throughput.is_empty() {
        section(
            &mut out,
            "Throughput",
            &delta_table(cmp, &cmp.throughput, "Metric", 3),
        );
    }
    out
}
