//! Config file loading

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use hle_kernel::KernelConfig;
use serde::Deserialize;

/// Layout of the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub kernel: KernelConfig,
}

/// Load the kernel config from `path`, or defaults when no path is given
pub fn load(path: Option<&Path>) -> Result<KernelConfig> {
    let Some(path) = path else {
        log::debug!("No config file given, using defaults");
        return Ok(KernelConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse(text: &str) -> Result<KernelConfig> {
    let config: InspectConfig = toml::from_str(text)?;
    Ok(config.kernel)
}
