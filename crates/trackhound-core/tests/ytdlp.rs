//! yt-dlp provider against a stand-in shell script
#![cfg(unix)]

mod common;

use common::{entries, status_logger, CallLog, ScriptedProvider};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trackhound_core::provider::YtDlpProvider;
use trackhound_core::temp::TempArtifactManager;
use trackhound_core::validation::{validate_query_length, Limits};
use trackhound_core::{Acquired, Orchestrator, Provider, ProviderDescriptor, ProviderOutcome};

/// Writes a fake yt-dlp: search prints one entry with `duration`, download
/// writes `size` bytes to the `-o` template with the extension filled in.
fn fake_yt_dlp(dir: &Path, duration: u64, size: usize) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--dump-single-json" ]; then
  echo '{{"_type":"playlist","entries":[{{"id":"ktvTqknDobU","title":"Radioactive","duration":{duration},"webpage_url":"https://www.youtube.com/watch?v=ktvTqknDobU"}}]}}'
  exit 0
fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
out=$(printf '%s' "$out" | sed 's/%(ext)s/mp3/')
head -c {size} /dev/zero > "$out"
"#
    );
    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn provider(bin_dir: &Path, work_dir: &Path, duration: u64, size: usize, limits: Limits) -> YtDlpProvider {
    YtDlpProvider::new(
        fake_yt_dlp(bin_dir, duration, size),
        limits,
        TempArtifactManager::new(work_dir.to_path_buf()),
    )
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn short_track_is_found_and_later_providers_untouched() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let ytdlp = provider(bin.path(), work.path(), 190, 4096, Limits::default());

    let orch = Orchestrator::new(vec![
        ProviderDescriptor::new("yt-dlp", Arc::new(ytdlp)),
        ScriptedProvider::descriptor("site-a", ProviderOutcome::NotFound, &log),
        ScriptedProvider::descriptor("site-b", ProviderOutcome::NotFound, &log),
    ])
    .with_backoff(Duration::ZERO);

    let result = orch
        .acquire("Imagine Dragons Radioactive", &mut status_logger(&log))
        .await
        .unwrap();

    assert_eq!(result.provider, "yt-dlp");
    let Acquired::Found(path) = result.outcome else {
        panic!("expected a found artifact, got {:?}", result.outcome);
    };
    assert_eq!(path.parent(), Some(work.path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp3"));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    // scratch directory gone, only the artifact remains
    assert_eq!(files_in(work.path()), 1);
    assert_eq!(entries(&log), vec!["status:yt-dlp:Imagine Dragons Radioactive"]);

    orch.release(&path).await;
    assert_eq!(files_in(work.path()), 0);
}

#[tokio::test]
async fn long_track_is_rejected_without_download() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let ytdlp = provider(bin.path(), work.path(), 700, 4096, Limits::default());

    let query = validate_query_length("Some Extended Mix").unwrap();
    assert_eq!(ytdlp.attempt(&query).await, ProviderOutcome::TooLong);
    assert_eq!(files_in(work.path()), 0);
}

#[tokio::test]
async fn oversize_download_is_deleted() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let limits = Limits {
        max_size_bytes: 1024,
        ..Limits::default()
    };
    let ytdlp = provider(bin.path(), work.path(), 190, 4096, limits);

    let query = validate_query_length("Imagine Dragons Radioactive").unwrap();
    assert_eq!(ytdlp.attempt(&query).await, ProviderOutcome::TooBig);
    assert_eq!(files_in(work.path()), 0);
}
