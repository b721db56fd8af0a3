//! Per-run digest: both extractors applied to one input blob, plus the key
//! percentiles picked out for summary display.

use crate::number::ParseError;
use crate::percentiles::{self, LatencyObservation};
use crate::status::{self, RunSummary};
use serde::Serialize;

/// Percentiles shown in the summary when nothing else is configured.
pub const DEFAULT_KEY_PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];

/// A key percentile resolved against a parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyLatency {
    pub percentile: f64,
    /// `None` when the table has no row for this percentile.
    pub latency_seconds: Option<f64>,
}

impl KeyLatency {
    /// Short label such as `P50` or `P99.9`.
    pub fn label(&self) -> String {
        percentile_label(self.percentile)
    }
}

/// Format a percentile as `P50`, `P99.9`.
pub fn percentile_label(percentile: f64) -> String {
    if percentile.fract() == 0.0 {
        format!("P{percentile:.0}")
    } else {
        format!("P{percentile}")
    }
}

/// Everything extracted from one benchmark output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunDigest {
    pub label: String,
    /// SQL the run executed, carried through untouched.
    pub query: Option<String>,
    pub status: Option<RunSummary>,
    pub observations: Vec<LatencyObservation>,
    pub key_latencies: Vec<KeyLatency>,
}

impl RunDigest {
    /// Parse `text` and resolve `keys` against its percentile table.
    ///
    /// With `strict`, a key percentile missing from a non-empty table is an
    /// error; otherwise it is recorded as `None`. An empty table yields no
    /// key latencies at all.
    pub fn from_text(
        label: &str,
        query: Option<&str>,
        text: &str,
        keys: &[f64],
        strict: bool,
    ) -> Result<Self, DigestError> {
        let status = status::extract_status(text)?;
        let observations = percentiles::extract_percentiles(text)?;

        if status.is_none() && observations.is_empty() {
            return Err(DigestError::NothingToReport {
                label: label.to_string(),
            });
        }

        let key_latencies = if observations.is_empty() {
            tracing::warn!(label, "no percentile rows found, skipping latency summary");
            Vec::new()
        } else if strict {
            keys.iter()
                .map(|&p| {
                    latency_at(&observations, p).map(|l| KeyLatency {
                        percentile: p,
                        latency_seconds: Some(l),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            key_latencies(&observations, keys)
        };

        tracing::info!(
            label,
            has_status = status.is_some(),
            rows = observations.len(),
            "parsed benchmark output"
        );

        Ok(Self {
            label: label.to_string(),
            query: query.map(str::to_string),
            status,
            observations,
            key_latencies,
        })
    }

    /// Latency recorded for `percentile` among this run's key latencies.
    pub fn key_latency(&self, percentile: f64) -> Option<f64> {
        self.key_latencies
            .iter()
            .find(|k| k.percentile == percentile)
            .and_then(|k| k.latency_seconds)
    }
}

/// Latency of the first row reporting exactly `percentile`.
///
/// Duplicate rows for the same percentile resolve to the first one.
pub fn latency_at(
    observations: &[LatencyObservation],
    percentile: f64,
) -> Result<f64, DigestError> {
    observations
        .iter()
        .find(|o| o.percentile == percentile)
        .map(|o| o.latency_seconds)
        .ok_or(DigestError::MissingPercentile { percentile })
}

/// Resolve every key percentile, leaving missing ones as `None`.
pub fn key_latencies(observations: &[LatencyObservation], keys: &[f64]) -> Vec<KeyLatency> {
    keys.iter()
        .map(|&percentile| {
            let latency_seconds = match latency_at(observations, percentile) {
                Ok(l) => Some(l),
                Err(e) => {
                    tracing::warn!(error = %e, "key percentile unavailable");
                    None
                }
            };
            KeyLatency {
                percentile,
                latency_seconds,
            }
        })
        .collect()
}

/// Errors from building a run digest.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestError {
    /// A matched field did not convert to a number.
    Parse(ParseError),
    /// A requested key percentile has no row in the table.
    MissingPercentile { percentile: f64 },
    /// Input held neither a status line nor a percentile row.
    NothingToReport { label: String },
}

impl std::fmt::Display for DigestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestError::Parse(e) => write!(f, "parse error: {e}"),
            DigestError::MissingPercentile { percentile } => write!(
                f,
                "percentile {} not present in latency table",
                percentile_label(*percentile)
            ),
            DigestError::NothingToReport { label } => write!(
                f,
                "{label}: no status line or percentile rows found, nothing to report"
            ),
        }
    }
}

impl std::error::Error for DigestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DigestError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for DigestError {
    fn from(e: ParseError) -> Self {
        DigestError::Parse(e)
    }
}
