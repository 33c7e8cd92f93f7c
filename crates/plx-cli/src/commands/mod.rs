//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use plx_core::models::PlxConfig;
use plx_core::Template;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plx")
        .join("config.json")
}

/// Load the configuration from `path`, else from the default location, else defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<PlxConfig> {
    if let Some(path) = path {
        return PlxConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return PlxConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()));
    }
    Ok(PlxConfig::default())
}

/// Read and validate a template file. `repeated` forces repeated record mode.
pub fn load_template(path: &Path, repeated: bool) -> anyhow::Result<Template> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    let mut template = Template::from_json(&json)
        .with_context(|| format!("Invalid template {}", path.display()))?;
    if repeated {
        template.repeated_record_mode = true;
    }
    Ok(template)
}
