/// Status line extraction: the aggregate throughput summary that
/// clickhouse-benchmark prints once per run.
///
/// Shape:
/// `<host:port>, queries: N, QPS: x, RPS: x, MiB/s: x, result RPS: x, result MiB/s: x.`
use crate::number::{self, ParseError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Searched over the whole blob, so the line may sit anywhere in the input.
static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([\w.-]+:\d+), queries: (\d+), QPS: ([\d.]+), RPS: ([\d.]+), MiB/s: ([\d.]+), result RPS: ([\d.]+), result MiB/s: ([\d.]+)",
    )
    .unwrap()
});

/// Aggregate summary of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Server the benchmark ran against, as `host:port`.
    pub endpoint: String,
    /// Number of queries executed.
    pub queries: u64,
    pub qps: f64,
    /// Rows read per second.
    pub rps: f64,
    pub mib_per_s: f64,
    /// Result rows returned per second.
    pub result_rps: f64,
    pub result_mib_per_s: f64,
}

impl RunSummary {
    /// Rows read per second, in millions.
    pub fn rps_millions(&self) -> f64 {
        self.rps / 1_000_000.0
    }

    /// Result rows per second, in thousands.
    pub fn result_rps_thousands(&self) -> f64 {
        self.result_rps / 1_000.0
    }
}

/// Find the status line in `text` and parse it.
///
/// Returns `Ok(None)` when no status line is present; that is the normal
/// outcome for input holding only a percentile table. The first match wins
/// if the text contains several.
pub fn extract_status(text: &str) -> Result<Option<RunSummary>, ParseError> {
    let Some(caps) = STATUS_LINE.captures(text) else {
        tracing::debug!("no status line found");
        return Ok(None);
    };

    // The final number swallows the sentence-ending period.
    let result_mib_per_s = caps[7].trim_end_matches('.');

    let summary = RunSummary {
        endpoint: caps[1].to_string(),
        queries: number::parse_u64("queries", &caps[2])?,
        qps: number::parse_f64("qps", &caps[3])?,
        rps: number::parse_f64("rps", &caps[4])?,
        mib_per_s: number::parse_f64("mib_per_s", &caps[5])?,
        result_rps: number::parse_f64("result_rps", &caps[6])?,
        result_mib_per_s: number::parse_f64("result_mib_per_s", result_mib_per_s)?,
    };

    tracing::debug!(
        endpoint = %summary.endpoint,
        queries = summary.queries,
        qps = summary.qps,
        "status line extracted"
    );
    Ok(Some(summary))
}
