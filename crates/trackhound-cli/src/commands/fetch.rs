use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::args::FetchOptions;
use trackhound_core::{
    config::Config,
    deliver::deliver,
    validation::{is_small_talk, Limits},
    Acquired, ChannelReporter, Orchestrator, StatusEvent,
};

pub async fn run(query: &str, options: &FetchOptions, config_path: Option<&Path>) -> Result<()> {
    if is_small_talk(query) {
        println!("Hi! Give me a track title to search for, e.g. \"Imagine Dragons Radioactive\".");
        return Ok(());
    }

    let mut config = Config::load(config_path)?;
    if let Some(policy) = options.on_track_limit {
        config.fallback.on_track_limit = policy.into();
    }
    let output_dir = options.output.clone().unwrap_or_else(|| PathBuf::from("."));

    let orchestrator = Orchestrator::from_config(&config)?;
    debug!(
        "Source order: {}",
        orchestrator.provider_names().collect::<Vec<_>>().join(", ")
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Searching: {}", truncate(query, 40)));

    let (mut reporter, progress_handle) = spawn_progress(pb.clone());
    let result = orchestrator.acquire(query, &mut reporter).await;
    drop(reporter);
    progress_handle.await?;

    let acquisition = match result {
        Ok(acquisition) => acquisition,
        Err(e) => {
            pb.abandon_with_message("Invalid query");
            bail!("{}", e);
        }
    };

    match acquisition.outcome {
        Acquired::Found(artifact) => {
            if options.keep_temp {
                pb.finish_with_message(format!("Found via {}", acquisition.provider));
                println!("\nArtifact: {}", artifact.display());
                return Ok(());
            }
            let saved = deliver(orchestrator.artifacts(), &artifact, &output_dir, query)
                .await
                .context("Failed to save track")?;
            pb.finish_with_message(format!("Found via {}", acquisition.provider));
            println!("\nOutput: {}", saved.display());
            Ok(())
        }
        other => {
            let message = describe_miss(&other, orchestrator.limits());
            pb.abandon_with_message(format!("{} ({})", message, acquisition.provider));
            bail!("{}: {}", message, query)
        }
    }
}

/// Spinner task fed by status events; it ends once the reporter is dropped.
fn spawn_progress(pb: ProgressBar) -> (ChannelReporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<StatusEvent>();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            pb.set_message(format!(
                "Searching {}: {}",
                event.provider,
                truncate(&event.query, 40)
            ));
        }
    });
    (ChannelReporter::new(tx), handle)
}

/// User-facing text for every outcome other than `Found`
pub fn describe_miss(outcome: &Acquired, limits: &Limits) -> String {
    match outcome {
        Acquired::TooLong => format!(
            "Track is longer than {} minutes",
            limits.max_duration_secs / 60
        ),
        Acquired::TooBig => format!(
            "Track is larger than {} MB",
            limits.max_size_bytes / (1024 * 1024)
        ),
        Acquired::NotFound | Acquired::Found(_) => "Not found".to_string(),
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
