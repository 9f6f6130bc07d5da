//! Load-Test Report Renderer
//!
//! A stateless library that turns a finished load-test measurement set into
//! text: a human-readable summary with a response-time histogram and latency
//! distribution, a per-request CSV export, or the output of a caller-supplied
//! template.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on presentation:
//! - Formats durations (seconds) as fixed-precision text or milliseconds
//! - Draws histogram buckets as normalized bar charts
//! - Encodes values as compact JSON for embedding in templates
//! - Selects and executes the output template
//!
//! The library does NOT:
//! - Execute requests or record latencies
//! - Compute percentiles or aggregate statistics
//!
//! The `Report` arrives fully computed. Loading reports from disk is in the
//! application layer (bench-report-cli).
//!
//! # Example Usage
//!
//! ```
//! use bench_report::{Bucket, Renderer, RenderConfig, Report};
//!
//! let mut report = Report {
//!     total: 1.5,
//!     rps: 2.0,
//!     histogram: vec![Bucket::new(0.1, 2), Bucket::new(0.2, 1)],
//!     ..Default::default()
//! };
//! report.status_code_dist.insert(200, 3);
//!
//! // Summary with the stock layout
//! let summary = bench_report::render("", &report).unwrap();
//! assert!(summary.contains("Requests/sec:\t2.0000"));
//!
//! // Shorter bars, custom template
//! let renderer = Renderer::with_config(RenderConfig::new().with_bar_width(10));
//! let out = renderer.render("{{ histogram .Histogram }}", &report).unwrap();
//! assert_eq!(out.lines().count(), 2);
//! ```

// Public modules
pub mod config;
pub mod format;
pub mod histogram;
pub mod json;
pub mod renderer;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use config::RenderConfig;
pub use renderer::{render, report_helpers, OutputMode, Renderer, CSV_HEADER};
pub use template::{FuncMap, Template, TemplateError};
pub use types::{Bucket, LatencyDistribution, Report, ReportError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
