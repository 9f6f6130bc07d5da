//! Report renderer
//!
//! Selects an output template (summary, CSV or a caller-supplied body),
//! registers the formatting helpers and executes the template against a
//! [`Report`].

use crate::config::RenderConfig;
use crate::format::{format_int, format_int_as_millis, format_seconds, format_seconds_as_millis};
use crate::histogram;
use crate::json::to_json;
use crate::template::{expect_args, FuncMap, Template, TemplateError};
use crate::types::{Bucket, Report, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Human-readable summary
pub const SUMMARY_TEMPLATE: &str = r#"
Summary:
  Total:	{{ formatNumberToMillis .Total }} millis
  Slowest:	{{ formatNumberToMillis .Slowest }} millis
  Fastest:	{{ formatNumberToMillis .Fastest }} millis
  Average:	{{ formatNumberToMillis .Average }} millis
  Requests/sec:	{{ formatNumber .Rps }}
{{- if gt .SizeTotal 0 }}
  Total data:	{{ .SizeTotal }} bytes
  Size/request:	{{ .SizeReq }} bytes
{{- end }}

Response time histogram:
{{ histogram .Histogram }}
Latency distribution:{{ range .LatencyDistribution }}
  {{ .Percentage }}% in {{ formatNumberToMillis .Latency }} millis{{ end }}

Details (average, fastest, slowest):
  DNS+dialup:	{{ formatNumberToMillis .AvgConn }} millis, {{ formatNumberToMillis .ConnMax }} millis, {{ formatNumberToMillis .ConnMin }} millis
  DNS-lookup:	{{ formatNumberToMillis .AvgDns }} millis, {{ formatNumberToMillis .DnsMax }} millis, {{ formatNumberToMillis .DnsMin }} millis
  req write:	{{ formatNumberToMillis .AvgReq }} millis, {{ formatNumberToMillis .ReqMax }} millis, {{ formatNumberToMillis .ReqMin }} millis
  resp wait:	{{ formatNumberToMillis .AvgDelay }} millis, {{ formatNumberToMillis .DelayMax }} millis, {{ formatNumberToMillis .DelayMin }} millis
  resp read:	{{ formatNumberToMillis .AvgRes }} millis, {{ formatNumberToMillis .ResMax }} millis, {{ formatNumberToMillis .ResMin }} millis

Status code distribution:{{ range $code, $num := .StatusCodeDist }}
  [{{ $code }}]	{{ $num }} responses{{ end }}
{{ if gt (len .ErrorDist) 0 }}
Error distribution:{{ range $err, $num := .ErrorDist }}
  [{{ $num }}]	{{ $err }}{{ end }}
{{ end }}"#;

/// Column names of the CSV export, in order
pub const CSV_HEADER: &str =
    "response-time,DNS+dialup,DNS,Request-write,Response-delay,Response-read,status-code,offset";

/// One row per request; no trailing newline
pub const CSV_TEMPLATE: &str = concat!(
    "{{- $connLats := .ConnLats }}{{ $dnsLats := .DnsLats }}{{ $reqLats := .ReqLats }}",
    "{{- $delayLats := .DelayLats }}{{ $resLats := .ResLats }}",
    "{{- $statusCodes := .StatusCodes }}{{ $offsets := .Offsets }}",
    "response-time,DNS+dialup,DNS,Request-write,Response-delay,Response-read,status-code,offset",
    "{{ range $i, $v := .Lats }}\n",
    "{{ formatNumberToMillis $v }},",
    "{{ formatNumberToMillis (index $connLats $i) }},",
    "{{ formatNumberToMillis (index $dnsLats $i) }},",
    "{{ formatNumberToMillis (index $reqLats $i) }},",
    "{{ formatNumberToMillis (index $delayLats $i) }},",
    "{{ formatNumberToMillis (index $resLats $i) }},",
    "{{ formatNumberInt (index $statusCodes $i) }},",
    "{{ formatNumberToMillis (index $offsets $i) }}",
    "{{ end }}",
);

static SUMMARY: OnceLock<std::result::Result<Template, TemplateError>> = OnceLock::new();
static CSV: OnceLock<std::result::Result<Template, TemplateError>> = OnceLock::new();

/// Which template to render with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode<'a> {
    Summary,
    Csv,
    /// A template body in the template language
    Custom(&'a str),
}

impl<'a> OutputMode<'a> {
    /// Interpret an output selector: `""` is the summary, `"csv"` the CSV
    /// export, anything else a custom template body
    pub fn from_selector(output: &'a str) -> Self {
        match output {
            "" => OutputMode::Summary,
            "csv" => OutputMode::Csv,
            body => OutputMode::Custom(body),
        }
    }
}

/// Renders reports with a fixed configuration
///
/// A `Renderer` is `Send + Sync` and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    helpers: FuncMap,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        let helpers = report_helpers(&config);
        Self { config, helpers }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a report with the template named by `output`
    ///
    /// # Arguments
    /// * `output` - `""` for the summary, `"csv"` for the CSV export, or a
    ///   custom template body
    /// * `report` - The finished measurement set
    ///
    /// # Returns
    /// The rendered text. Nothing is returned if the template fails to parse,
    /// the report is invalid, or execution fails.
    pub fn render(&self, output: &str, report: &Report) -> Result<String> {
        self.render_mode(OutputMode::from_selector(output), report)
    }

    pub fn render_mode(&self, mode: OutputMode<'_>, report: &Report) -> Result<String> {
        let custom;
        let template = match mode {
            OutputMode::Summary => builtin(&SUMMARY, "summary", SUMMARY_TEMPLATE)?,
            OutputMode::Csv => builtin(&CSV, "csv", CSV_TEMPLATE)?,
            OutputMode::Custom(body) => {
                custom = Template::parse("custom", body, &self.helpers)?;
                &custom
            }
        };
        log::debug!("Rendering with template '{}'", template.name());

        report.validate()?;
        let data = serde_json::to_value(report)?;
        let output = template.execute(&data, &self.helpers)?;

        log::debug!(
            "Rendered {} requests into {} bytes",
            report.lats.len(),
            output.len()
        );
        Ok(output)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a report with the default configuration
///
/// See [`Renderer::render`].
pub fn render(output: &str, report: &Report) -> Result<String> {
    Renderer::new().render(output, report)
}

fn builtin(
    cell: &'static OnceLock<std::result::Result<Template, TemplateError>>,
    name: &str,
    source: &str,
) -> Result<&'static Template> {
    cell.get_or_init(|| Template::parse(name, source, &report_helpers(&RenderConfig::default())))
        .as_ref()
        .map_err(|e| e.clone().into())
}

/// The helper functions available to every report template
pub fn report_helpers(config: &RenderConfig) -> FuncMap {
    let mut funcs = FuncMap::new();

    funcs.insert("formatNumber", |args| {
        let [v] = one_arg("formatNumber", args)?;
        Ok(Value::String(format_seconds(float_arg(v)?)))
    });
    funcs.insert("formatNumberToMillis", |args| {
        let [v] = one_arg("formatNumberToMillis", args)?;
        Ok(Value::String(format_seconds_as_millis(float_arg(v)?)))
    });
    funcs.insert("formatNumberInt", |args| {
        let [v] = one_arg("formatNumberInt", args)?;
        Ok(Value::String(format_int(int_arg(v)?)))
    });
    funcs.insert("formatNumberIntToMillis", |args| {
        let [v] = one_arg("formatNumberIntToMillis", args)?;
        Ok(Value::String(format_int_as_millis(int_arg(v)?)))
    });

    let (width, bar_char) = (config.bar_width, config.bar_char);
    funcs.insert("histogram", move |args| {
        let [v] = one_arg("histogram", args)?;
        let buckets = Vec::<Bucket>::deserialize(v).map_err(|e| e.to_string())?;
        Ok(Value::String(histogram::render_with(&buckets, width, bar_char)))
    });

    funcs.insert("jsonify", |args| {
        let [v] = one_arg("jsonify", args)?;
        Ok(Value::String(to_json(v)))
    });

    funcs
}

fn one_arg<'a>(name: &str, args: &[&'a Value]) -> std::result::Result<[&'a Value; 1], String> {
    let args = expect_args(name, args, 1)?;
    Ok([args[0]])
}

fn float_arg(value: &Value) -> std::result::Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected a number, got {}", value))
}

fn int_arg(value: &Value) -> std::result::Result<i64, String> {
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    match value.as_u64() {
        Some(v) => i64::try_from(v).map_err(|_| format!("integer out of range: {}", v)),
        None => Err(format!("expected an integer, got {}", value)),
    }
}
