//! Configuration loading and output selection

use anyhow::{bail, Context, Result};
use bench_report::RenderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Default output when no `--output`/`--template` is given
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// `"csv"`, a template body, or absent for the summary
    pub mode: Option<String>,
    /// File holding a custom template body; relative paths are resolved
    /// against the config file's directory
    pub template_file: Option<PathBuf>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.output.mode.is_some() && config.output.template_file.is_some() {
        bail!(
            "Invalid config file {:?}: [output] sets both mode and template_file",
            path
        );
    }
    if config.render.bar_width == 0 {
        bail!("Invalid config file {:?}: [render] bar_width must be at least 1", path);
    }

    if let (Some(file), Some(dir)) = (&config.output.template_file, path.parent()) {
        if file.is_relative() {
            config.output.template_file = Some(dir.join(file));
        }
    }

    Ok(config)
}

/// Pick the output selector passed to the renderer
///
/// Precedence: `--template` > `--output` > `[output] template_file` >
/// `[output] mode` > summary.
pub fn resolve_output(
    output: Option<&str>,
    template: Option<&Path>,
    config: &OutputConfig,
) -> Result<String> {
    if let Some(path) = template {
        return read_template(path);
    }
    if let Some(output) = output {
        return Ok(output.to_string());
    }
    if let Some(path) = &config.template_file {
        return read_template(path);
    }
    Ok(config.mode.clone().unwrap_or_default())
}

fn read_template(path: &Path) -> Result<String> {
    log::debug!("Reading template from {:?}", path);
    fs::read_to_string(path).with_context(|| format!("Failed to read template file: {:?}", path))
}
