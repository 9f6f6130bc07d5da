//! Load-Test Report CLI Application
//!
//! Command-line front end for the bench-report library. It adds:
//! - Loading finished reports from JSON files or stdin
//! - TOML configuration for output mode and histogram layout
//! - Rendering several reports in parallel

use anyhow::{Context, Result};
use bench_report::{RenderConfig, Renderer};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod input;

/// Bench Report - Render load-test reports as a summary, CSV or custom template
#[derive(Parser, Debug)]
#[command(name = "bench-report-cli")]
#[command(about = "Render load-test reports (summary, CSV, custom template)", long_about = None)]
#[command(version)]
struct Args {
    /// Report JSON file(s); use - for stdin
    #[arg(value_name = "REPORT", required = true)]
    reports: Vec<PathBuf>,

    /// Output mode: omit for the summary, "csv", or a template body
    #[arg(short, long, value_name = "MODE", conflicts_with = "template")]
    output: Option<String>,

    /// Read a custom template body from a file
    #[arg(short, long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Write the rendered output to a file (default: stdout)
    #[arg(long, value_name = "FILE")]
    out_file: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Bench Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using renderer library v{}", bench_report::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };

    let output = config::resolve_output(
        args.output.as_deref(),
        args.template.as_deref(),
        &app_config.output,
    )?;

    let rendered = render_all(&args.reports, &output, app_config.render)?;
    write_output(&rendered, args.out_file.as_ref())?;

    log::info!("Rendered {} report(s)", rendered.len());
    Ok(())
}

/// Load and render every report in parallel, keeping input order
fn render_all(paths: &[PathBuf], output: &str, config: RenderConfig) -> Result<Vec<String>> {
    let renderer = Renderer::with_config(config);
    let stdin_count = paths.iter().filter(|p| p.as_os_str() == "-").count();
    if stdin_count > 1 {
        anyhow::bail!("stdin (-) can only be given once");
    }

    paths
        .par_iter()
        .map(|path| {
            let report = input::load_report(path)?;
            renderer
                .render(output, &report)
                .with_context(|| format!("Failed to render report: {:?}", path))
        })
        .collect()
}

fn write_output(rendered: &[String], out_file: Option<&PathBuf>) -> Result<()> {
    let mut writer: Box<dyn Write> = match out_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    for text in rendered {
        writeln!(writer, "{}", text)?;
    }
    writer.flush()?;
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_report(dir: &TempDir, name: &str, rps: f64) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!(r#"{{ "Rps": {:?} }}"#, rps)).unwrap();
        path
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["bench-report-cli", "-o", "csv", "a.json", "b.json"]).unwrap();
        assert_eq!(args.output.as_deref(), Some("csv"));
        assert_eq!(args.reports.len(), 2);

        assert!(Args::try_parse_from(["bench-report-cli"]).is_err());
        assert!(
            Args::try_parse_from(["bench-report-cli", "-o", "csv", "-t", "x.tmpl", "a.json"]).is_err()
        );
    }

    #[test]
    fn test_render_all_keeps_input_order() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (1..=8)
            .map(|i| write_report(&dir, &format!("r{}.json", i), i as f64))
            .collect();

        let rendered = render_all(&paths, "{{ .Rps }}", RenderConfig::default()).unwrap();
        let expected: Vec<String> = (1..=8).map(|i| format!("{:?}", i as f64)).collect();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_all_reports_failing_file() {
        let dir = TempDir::new().unwrap();
        let good = write_report(&dir, "good.json", 1.0);
        let missing = dir.path().join("missing.json");
        let err = render_all(&[good, missing], "", RenderConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        write_output(&["a".to_string(), "b".to_string()], Some(&out)).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\n");
    }
}
