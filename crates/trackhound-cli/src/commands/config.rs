use anyhow::{Context, Result};
use std::path::Path;
use trackhound_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("trackhound configuration\n");

    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());

    if config.paths.yt_dlp.is_none() {
        println!("\n# paths.yt_dlp: (auto-detect)");
    }
    if config.paths.ffmpeg.is_none() {
        println!("# paths.ffmpeg: (auto-detect)");
    }
    if config.temp.directory.is_none() {
        println!("# temp.directory: (system temp)");
    }

    // Show config file locations
    println!("\nConfig file locations (later entries override earlier ones):");
    if let Some(default) = Config::default_config_file() {
        println!("  1. {}", default.display());
    }
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables (TRACKHOUND_*, nested keys split on \"__\")");

    Ok(())
}
