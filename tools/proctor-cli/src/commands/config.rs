//! Show the effective configuration.

use std::path::PathBuf;

use proctor_common::config::{config_file_path, AnalysisOverrides, AppConfig};

pub fn run(config: Option<PathBuf>) -> anyhow::Result<()> {
    let source = config.clone().unwrap_or_else(config_file_path);
    let resolved = AppConfig::resolve(config.as_deref(), &AnalysisOverrides::default())
        .map_err(|e| anyhow::anyhow!("Failed to resolve configuration: {e}"))?;

    println!("Config file: {}", source.display());
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
