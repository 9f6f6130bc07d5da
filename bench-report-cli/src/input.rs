//! Report loading
//!
//! Reports are the JSON form of `bench_report::Report`, written by the
//! collector after a benchmark run. A path of `-` reads from stdin.

use anyhow::{Context, Result};
use bench_report::Report;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Load one report from a file, or from stdin when `path` is `-`
pub fn load_report(path: &Path) -> Result<Report> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read report from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read report: {:?}", path))?
    };

    parse_report(&content).with_context(|| format!("Failed to parse report: {:?}", path))
}

fn parse_report(content: &str) -> Result<Report> {
    let report: Report = serde_json::from_str(content)?;
    log::debug!(
        "Loaded report: {} requests, {} histogram buckets",
        report.lats.len(),
        report.histogram.len()
    );
    Ok(report)
}
