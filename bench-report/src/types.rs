//! Core types for the report renderer
//!
//! This module defines the finished measurement set handed over by the result
//! collector, together with the error type shared by every rendering operation.
//! The renderer never builds or mutates a [`Report`]; it only reads one.

use crate::template::TemplateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while rendering a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Failed to encode JSON: {0}")]
    JsonEncode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One bin of the response-time histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    /// Lower bound of the bin, in seconds
    pub mark: f64,
    /// Number of requests that fell into this bin
    pub count: u64,
}

impl Bucket {
    pub fn new(mark: f64, count: u64) -> Self {
        Self { mark, count }
    }
}

/// One entry of the latency distribution ("N% of requests in X seconds")
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LatencyDistribution {
    pub percentage: u32,
    /// Latency in seconds
    pub latency: f64,
}

impl LatencyDistribution {
    pub fn new(percentage: u32, latency: f64) -> Self {
        Self {
            percentage,
            latency,
        }
    }
}

/// The finished measurement set of one benchmark run
///
/// All durations are in seconds. Field names are serialized in PascalCase
/// (`Total`, `SizeTotal`, `ConnLats`, ...); those are also the names templates
/// use to address the fields.
///
/// The per-request columns (`lats` through `offsets`) are parallel: entry `i`
/// of every column describes the same request, in the order the requests were
/// recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Report {
    /// Wall-clock duration of the whole run
    pub total: f64,
    pub slowest: f64,
    pub fastest: f64,
    pub average: f64,
    /// Requests per second
    pub rps: f64,

    /// Total response bytes transferred
    pub size_total: u64,
    /// Average response bytes per request
    pub size_req: u64,

    /// Response-time histogram, rendered in the order given
    pub histogram: Vec<Bucket>,
    /// Latency percentiles, in the order they should be printed
    pub latency_distribution: Vec<LatencyDistribution>,

    // Per-phase aggregates
    pub avg_conn: f64,
    pub conn_max: f64,
    pub conn_min: f64,
    pub avg_dns: f64,
    pub dns_max: f64,
    pub dns_min: f64,
    pub avg_req: f64,
    pub req_max: f64,
    pub req_min: f64,
    pub avg_delay: f64,
    pub delay_max: f64,
    pub delay_min: f64,
    pub avg_res: f64,
    pub res_max: f64,
    pub res_min: f64,

    /// HTTP status code -> number of responses
    pub status_code_dist: BTreeMap<u16, u64>,
    /// Error message -> number of occurrences
    pub error_dist: BTreeMap<String, u64>,

    // Per-request columns
    pub lats: Vec<f64>,
    pub conn_lats: Vec<f64>,
    pub dns_lats: Vec<f64>,
    pub req_lats: Vec<f64>,
    pub delay_lats: Vec<f64>,
    pub res_lats: Vec<f64>,
    pub status_codes: Vec<u16>,
    /// Start of each request, relative to the start of the run
    pub offsets: Vec<f64>,
}

impl Report {
    /// Number of responses represented by the status code distribution
    pub fn num_requests(&self) -> u64 {
        self.status_code_dist.values().sum()
    }

    /// Check the invariants the renderer relies on
    ///
    /// # Returns
    /// * `Err(ReportError::InvalidReport)` if a per-request column has a different
    ///   length than `lats`, if a non-empty `lats` disagrees with the status
    ///   code distribution, or if any duration is NaN or infinite
    pub fn validate(&self) -> Result<()> {
        let expected = self.lats.len();
        let columns = [
            ("ConnLats", self.conn_lats.len()),
            ("DnsLats", self.dns_lats.len()),
            ("ReqLats", self.req_lats.len()),
            ("DelayLats", self.delay_lats.len()),
            ("ResLats", self.res_lats.len()),
            ("StatusCodes", self.status_codes.len()),
            ("Offsets", self.offsets.len()),
        ];
        for (name, len) in columns {
            if len != expected {
                return Err(ReportError::InvalidReport(format!(
                    "{} has {} entries but Lats has {}",
                    name, len, expected
                )));
            }
        }

        // Reports without per-request data still carry a distribution
        if expected > 0 && self.num_requests() != expected as u64 {
            return Err(ReportError::InvalidReport(format!(
                "StatusCodeDist counts {} responses but Lats has {}",
                self.num_requests(),
                expected
            )));
        }

        let scalars = [
            ("Total", self.total),
            ("Slowest", self.slowest),
            ("Fastest", self.fastest),
            ("Average", self.average),
            ("Rps", self.rps),
            ("AvgConn", self.avg_conn),
            ("ConnMax", self.conn_max),
            ("ConnMin", self.conn_min),
            ("AvgDns", self.avg_dns),
            ("DnsMax", self.dns_max),
            ("DnsMin", self.dns_min),
            ("AvgReq", self.avg_req),
            ("ReqMax", self.req_max),
            ("ReqMin", self.req_min),
            ("AvgDelay", self.avg_delay),
            ("DelayMax", self.delay_max),
            ("DelayMin", self.delay_min),
            ("AvgRes", self.avg_res),
            ("ResMax", self.res_max),
            ("ResMin", self.res_min),
        ];
        for (name, value) in scalars {
            check_finite(name, std::iter::once(value))?;
        }

        check_finite("Histogram", self.histogram.iter().map(|b| b.mark))?;
        check_finite(
            "LatencyDistribution",
            self.latency_distribution.iter().map(|d| d.latency),
        )?;
        check_finite("Lats", self.lats.iter().copied())?;
        check_finite("ConnLats", self.conn_lats.iter().copied())?;
        check_finite("DnsLats", self.dns_lats.iter().copied())?;
        check_finite("ReqLats", self.req_lats.iter().copied())?;
        check_finite("DelayLats", self.delay_lats.iter().copied())?;
        check_finite("ResLats", self.res_lats.iter().copied())?;
        check_finite("Offsets", self.offsets.iter().copied())?;

        Ok(())
    }
}

fn check_finite(name: &str, values: impl IntoIterator<Item = f64>) -> Result<()> {
    for (i, value) in values.into_iter().enumerate() {
        if !value.is_finite() {
            return Err(ReportError::InvalidReport(format!(
                "{} contains a non-finite value at index {}: {}",
                name, i, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_request_report() -> Report {
        Report {
            lats: vec![0.1, 0.2],
            conn_lats: vec![0.01, 0.02],
            dns_lats: vec![0.001, 0.002],
            req_lats: vec![0.0, 0.0],
            delay_lats: vec![0.05, 0.1],
            res_lats: vec![0.01, 0.01],
            status_codes: vec![200, 404],
            offsets: vec![0.0, 0.05],
            status_code_dist: BTreeMap::from([(200, 1), (404, 1)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_consistent_report() {
        assert!(two_request_report().validate().is_ok());
        assert!(Report::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_column() {
        let mut report = two_request_report();
        report.offsets.pop();

        let err = report.validate().unwrap_err();
        assert!(matches!(err, ReportError::InvalidReport(_)));
        assert!(err.to_string().contains("Offsets has 1 entries but Lats has 2"));
    }

    #[test]
    fn test_validate_accepts_equal_bucket_marks() {
        // Every mark collapses onto `fastest` when all latencies are equal
        let report = Report {
            lats: vec![0.05],
            conn_lats: vec![0.0],
            dns_lats: vec![0.0],
            req_lats: vec![0.0],
            delay_lats: vec![0.05],
            res_lats: vec![0.0],
            status_codes: vec![200],
            offsets: vec![0.0],
            histogram: vec![Bucket::new(0.05, 0); 11],
            status_code_dist: BTreeMap::from([(200, 1)]),
            ..Default::default()
        };
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_distribution_mismatch() {
        let mut report = two_request_report();
        report.status_code_dist.insert(500, 4);

        let err = report.validate().unwrap_err();
        assert!(err.to_string().contains("StatusCodeDist counts 6 responses but Lats has 2"));

        let summary_only = Report {
            status_code_dist: BTreeMap::from([(200, 30)]),
            ..Default::default()
        };
        assert!(summary_only.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut report = two_request_report();
        report.delay_lats[1] = f64::NAN;

        let err = report.validate().unwrap_err();
        assert!(err.to_string().contains("DelayLats"));
    }

    #[test]
    fn test_num_requests() {
        assert_eq!(two_request_report().num_requests(), 2);
        assert_eq!(Report::default().num_requests(), 0);
    }

    #[test]
    fn test_field_names_are_pascal_case() {
        let value = serde_json::to_value(two_request_report()).unwrap();
        assert!(value.get("SizeTotal").is_some());
        assert!(value.get("ConnLats").is_some());
        assert!(value.get("StatusCodeDist").is_some());
        assert_eq!(value["StatusCodeDist"]["404"], 1);
    }

    #[test]
    fn test_negative_count_is_rejected_on_load() {
        let json = r#"{ "Histogram": [{ "Mark": 0.1, "Count": -1 }] }"#;
        assert!(serde_json::from_str::<Report>(json).is_err());
    }

    #[test]
    fn test_missing_fields_default() {
        let report: Report = serde_json::from_str(r#"{ "Total": 1.5 }"#).unwrap();
        assert_eq!(report.total, 1.5);
        assert!(report.lats.is_empty());
    }
}
