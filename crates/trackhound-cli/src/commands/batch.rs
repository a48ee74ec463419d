use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use super::fetch::{describe_miss, truncate};
use crate::args::FetchOptions;
use trackhound_core::{config::Config, deliver::deliver, validation::is_small_talk, Acquired, Orchestrator};

/// How one line of the batch ended
#[derive(Debug)]
enum Tally {
    Saved(PathBuf),
    TooLong,
    TooBig,
    NotFound,
    Invalid(String),
    Failed(String),
}

pub async fn run(
    input: &Path,
    parallel: usize,
    pause_ms: u64,
    options: &FetchOptions,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(policy) = options.on_track_limit {
        config.fallback.on_track_limit = policy.into();
    }

    // Read queries from file
    let content = fs::read_to_string(input)
        .await
        .context("Failed to read input file")?;
    let queries = parse_queries(&content);

    if queries.is_empty() {
        println!("No queries found in input file");
        return Ok(());
    }

    let parallel = parallel.max(1);
    let total = queries.len();
    println!("Processing {} queries with {} parallel workers\n", total, parallel);

    let orchestrator = Orchestrator::from_config(&config)?;
    let orchestrator = &orchestrator;
    let output_dir = options.output.clone().unwrap_or_else(|| PathBuf::from("."));
    let output_dir = output_dir.as_path();
    let keep_temp = options.keep_temp;
    let pause = Duration::from_millis(pause_ms);

    let multi = MultiProgress::new();
    let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {msg}")?.tick_chars("=>-");

    let results: Vec<(String, Tally)> = stream::iter(queries.into_iter().enumerate())
        .then(|(idx, query)| async move {
            // Space out starts so the sources are not hammered
            if idx > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            (idx, query)
        })
        .map(|(idx, query)| {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(spinner_style.clone());

            async move {
                let label = format!("[{}/{}]", idx + 1, total);
                pb.set_message(format!("{} {}", label, truncate(&query, 50)));
                pb.enable_steady_tick(Duration::from_millis(100));

                let progress = pb.clone();
                let mut reporter = |provider: &str, q: &str| {
                    progress.set_message(format!("{} {}: {}", label, provider, truncate(q, 50)));
                };

                let tally = fetch_one(orchestrator, &query, output_dir, keep_temp, &mut reporter).await;
                let summary = match &tally {
                    Tally::Saved(path) => format!(
                        "Done: {}",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    ),
                    Tally::TooLong => describe_miss(&Acquired::TooLong, orchestrator.limits()),
                    Tally::TooBig => describe_miss(&Acquired::TooBig, orchestrator.limits()),
                    Tally::NotFound => "Not found".to_string(),
                    Tally::Invalid(reason) => format!("Skipped: {}", reason),
                    Tally::Failed(reason) => format!("Failed: {}", reason),
                };
                pb.finish_with_message(format!("[{}/{}] {} - {}", idx + 1, total, summary, truncate(&query, 40)));

                (query, tally)
            }
        })
        .buffer_unordered(parallel)
        .collect()
        .await;

    print_summary(&results);
    Ok(())
}

async fn fetch_one<F>(
    orchestrator: &Orchestrator,
    query: &str,
    output_dir: &Path,
    keep_temp: bool,
    reporter: &mut F,
) -> Tally
where
    F: FnMut(&str, &str) + Send,
{
    if is_small_talk(query) {
        return Tally::Invalid("not a track title".to_string());
    }

    let acquisition = match orchestrator.acquire(query, reporter).await {
        Ok(acquisition) => acquisition,
        Err(e) => return Tally::Invalid(e.to_string()),
    };

    match acquisition.outcome {
        Acquired::Found(artifact) if keep_temp => Tally::Saved(artifact),
        Acquired::Found(artifact) => {
            match deliver(orchestrator.artifacts(), &artifact, output_dir, query).await {
                Ok(saved) => Tally::Saved(saved),
                Err(e) => Tally::Failed(e.to_string()),
            }
        }
        Acquired::TooLong => Tally::TooLong,
        Acquired::TooBig => Tally::TooBig,
        Acquired::NotFound => Tally::NotFound,
    }
}

fn parse_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

fn print_summary(results: &[(String, Tally)]) {
    let count = |pred: fn(&Tally) -> bool| results.iter().filter(|(_, t)| pred(t)).count();

    println!("\n=== Batch Complete ===");
    println!("Saved:     {}", count(|t| matches!(t, Tally::Saved(_))));
    println!("Not found: {}", count(|t| matches!(t, Tally::NotFound)));
    println!("Too long:  {}", count(|t| matches!(t, Tally::TooLong)));
    println!("Too big:   {}", count(|t| matches!(t, Tally::TooBig)));
    println!("Invalid:   {}", count(|t| matches!(t, Tally::Invalid(_))));
    println!("Failed:    {}", count(|t| matches!(t, Tally::Failed(_))));

    let misses: Vec<_> = results
        .iter()
        .filter(|(_, t)| !matches!(t, Tally::Saved(_)))
        .collect();
    if !misses.is_empty() {
        println!("\nNot saved:");
        for (query, tally) in misses {
            match tally {
                Tally::Invalid(reason) | Tally::Failed(reason) => {
                    println!("  {} - {}", query, reason)
                }
                other => println!("  {} - {:?}", query, other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queries_skips_blanks_and_comments() {
        let content = "# favourites\nImagine Dragons Radioactive\n\n   \n  Queen Bohemian Rhapsody  \n#skip me\n";
        assert_eq!(
            parse_queries(content),
            vec!["Imagine Dragons Radioactive", "Queen Bohemian Rhapsody"]
        );
    }

    #[tokio::test]
    async fn test_small_talk_is_not_searched() {
        let orchestrator = Orchestrator::new(Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let mut reporter = |_: &str, _: &str| calls += 1;
        let tally = fetch_one(&orchestrator, "hello!", dir.path(), false, &mut reporter).await;
        assert!(matches!(tally, Tally::Invalid(_)));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_no_providers_is_not_found() {
        let orchestrator = Orchestrator::new(Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = |_: &str, _: &str| {};
        let tally = fetch_one(&orchestrator, "Queen Bohemian Rhapsody", dir.path(), false, &mut reporter).await;
        assert!(matches!(tally, Tally::NotFound));
    }

    #[tokio::test]
    async fn test_short_query_is_invalid() {
        let orchestrator = Orchestrator::new(Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = |_: &str, _: &str| {};
        let tally = fetch_one(&orchestrator, "x", dir.path(), false, &mut reporter).await;
        assert!(matches!(tally, Tally::Invalid(_)));
    }
}
