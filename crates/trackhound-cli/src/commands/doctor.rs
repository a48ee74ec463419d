use anyhow::Result;
use std::path::Path;
use tokio::process::Command;
use trackhound_core::{config::Config, http::build_client, Orchestrator};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    println!("trackhound dependency check\n");

    let config = Config::load(config_path)?;
    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:      ");
    match config.yt_dlp_path() {
        Ok(path) => match tool_version(&path, "--version").await {
            Some(v) => println!("OK ({})", v),
            None => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("             Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // FFmpeg is only needed for audio conversion
    print!("ffmpeg:      ");
    match config.ffmpeg_path() {
        Ok(path) => match tool_version(&path, "-version").await {
            Some(first_line) => {
                let version = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version);
            }
            None => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("             yt-dlp cannot convert audio without it");
            all_ok = false;
        }
    }

    print!("http client: ");
    match build_client(&config.http) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("INVALID ({})", e);
            all_ok = false;
        }
    }

    print!("temp dir:    ");
    let temp = config.temp_dir();
    match tokio::fs::create_dir_all(&temp).await {
        Ok(()) => println!("OK ({})", temp.display()),
        Err(e) => {
            println!("NOT WRITABLE ({}: {})", temp.display(), e);
            all_ok = false;
        }
    }

    if let Ok(orchestrator) = Orchestrator::from_config(&config) {
        let order: Vec<_> = orchestrator.provider_names().collect();
        println!("\nSources, in order: {}", order.join(" -> "));
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for details.");
    }

    Ok(())
}

/// First line of a tool's version output
async fn tool_version(path: &Path, flag: &str) -> Option<String> {
    let output = Command::new(path).arg(flag).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
