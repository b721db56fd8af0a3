/// Percentile table extraction.
///
/// clickhouse-benchmark reports latency quantiles one per line:
///
/// ```text
/// 0.000%          0.013 sec.
/// 50.000%         0.013 sec.
/// 99.000%         0.024 sec.
/// ```
///
/// Every line is tested on its own; anything that is not a row is skipped.
use crate::number::{self, ParseError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Anchored at line start. Latency must carry a fractional part, the
/// percentile need not (`50%` is a valid row).
static PERCENTILE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*)%\s+(\d+\.\d+)\s+sec").unwrap());

/// One table row: `percentile` percent of queries finished within
/// `latency_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyObservation {
    pub percentile: f64,
    pub latency_seconds: f64,
}

/// Extract all percentile rows from `text`, in input order.
///
/// Rows are neither sorted nor de-duplicated. No matching line means an empty
/// Vec, not an error.
pub fn extract_percentiles(text: &str) -> Result<Vec<LatencyObservation>, ParseError> {
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for line in text.trim().split('\n') {
        let Some(caps) = PERCENTILE_ROW.captures(line) else {
            skipped += 1;
            continue;
        };
        observations.push(LatencyObservation {
            percentile: number::parse_f64("percentile", &caps[1])?,
            latency_seconds: number::parse_f64("latency_seconds", &caps[2])?,
        });
    }

    tracing::debug!(
        rows = observations.len(),
        skipped,
        "percentile table extracted"
    );
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "0.000%          0.013 sec.
10.000%         0.013 sec.
20.000%         0.013 sec.
30.000%         0.013 sec.
40.000%         0.013 sec.
50.000%         0.013 sec.
60.000%         0.013 sec.
70.000%         0.014 sec.
80.000%         0.015 sec.
90.000%         0.017 sec.
95.000%         0.020 sec.
99.000%         0.024 sec.
99.900%         0.024 sec.
99.990%         0.024 sec.";

    fn obs(percentile: f64, latency_seconds: f64) -> LatencyObservation {
        LatencyObservation {
            percentile,
            latency_seconds,
        }
    }

    #[test]
    fn test_canonical_table() {
        let rows = extract_percentiles(CANONICAL).unwrap();
        assert_eq!(rows.len(), 14);
        assert_eq!(rows[0], obs(0.0, 0.013));
        assert_eq!(rows[5], obs(50.0, 0.013));
        assert_eq!(rows[10], obs(95.0, 0.020));
        assert_eq!(rows[13], obs(99.99, 0.024));
    }

    #[test]
    fn test_preserves_input_order() {
        let text = "99.000%  0.024 sec.\n0.000%  0.013 sec.\n50.000%  0.015 sec.";
        let percentiles: Vec<f64> = extract_percentiles(text)
            .unwrap()
            .iter()
            .map(|o| o.percentile)
            .collect();
        assert_eq!(percentiles, vec![99.0, 0.0, 50.0]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let text = "50.000%  0.013 sec.\n50.000%  0.019 sec.";
        let rows = extract_percentiles(text).unwrap();
        assert_eq!(rows, vec![obs(50.0, 0.013), obs(50.0, 0.019)]);
    }

    #[test]
    fn test_integer_percentile_matches() {
        let rows = extract_percentiles("50%\t0.013 sec").unwrap();
        assert_eq!(rows, vec![obs(50.0, 0.013)]);
    }

    #[test]
    fn test_trailing_period_optional() {
        let rows = extract_percentiles("95.000%  0.020 sec\n99.000%  0.024 sec.").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_mixed_with_status_and_noise() {
        let text = "
Loaded 1 queries.

localhost:9000, queries: 30, QPS: 28.404, RPS: 17619645.884, MiB/s: 566.200, result RPS: 59733.005, result MiB/s: 14.272.

0.000%          0.013 sec.
50.000%         0.013 sec.
some trailing note
99.000%         0.024 sec.

";
        let rows = extract_percentiles(text).unwrap();
        assert_eq!(rows, vec![obs(0.0, 0.013), obs(50.0, 0.013), obs(99.0, 0.024)]);
    }

    #[test]
    fn test_status_and_blank_lines_only_is_empty() {
        let text = "\n\nlocalhost:9000, queries: 30, QPS: 28.404, RPS: 17619645.884, MiB/s: 566.200, result RPS: 59733.005, result MiB/s: 14.272.\n\n";
        assert!(extract_percentiles(text).unwrap().is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_percentiles("").unwrap().is_empty());
        assert!(extract_percentiles("   \n\n  ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows_do_not_match() {
        for line in [
            "50% 0.01sec",
            "abc% 0.013 sec.",
            "50.000% 13 sec.",
            "50.000% 0.013 ms",
            "50.000%0.013 sec",
            "%  0.013 sec",
        ] {
            assert!(
                extract_percentiles(line).unwrap().is_empty(),
                "line should not match: {line}"
            );
        }
    }

    #[test]
    fn test_row_must_start_at_line_start() {
        let text = "0.000%  0.010 sec.\n  50.000%  0.013 sec.\np 99.000%  0.024 sec.";
        let rows = extract_percentiles(text).unwrap();
        assert_eq!(rows, vec![obs(0.0, 0.010)]);
    }

    #[test]
    fn test_outer_whitespace_is_trimmed() {
        let rows = extract_percentiles("\n   50.000%  0.013 sec.\n").unwrap();
        assert_eq!(rows, vec![obs(50.0, 0.013)]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = extract_percentiles("0.000%  0.013 sec.\r\n50.000%  0.014 sec.\r\n").unwrap();
        assert_eq!(rows, vec![obs(0.0, 0.013), obs(50.0, 0.014)]);
    }

    #[test]
    fn test_count_equals_matching_lines() {
        let text = format!("{CANONICAL}\nnoise\n\n{CANONICAL}");
        let matching = text
            .lines()
            .filter(|l| PERCENTILE_ROW.is_match(l))
            .count();
        assert_eq!(extract_percentiles(&text).unwrap().len(), matching);
        assert_eq!(matching, 28);
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(
            extract_percentiles(CANONICAL).unwrap(),
            extract_percentiles(CANONICAL).unwrap()
        );
    }

    #[test]
    fn test_overlong_latency_is_error() {
        let text = format!("50.000%  {}.0 sec.", "9".repeat(400));
        assert!(matches!(
            extract_percentiles(&text),
            Err(ParseError::InvalidNumber {
                field: "latency_seconds",
                ..
            })
        ));
    }
}
