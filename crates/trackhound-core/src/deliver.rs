//! Hand-off of a found artifact to its final location

use crate::temp::TempArtifactManager;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Copy an artifact into `output_dir` as `<title>.<ext>`, then release it.
///
/// An existing file is never overwritten; the copy gets a ` (2)`-style suffix.
///
/// The artifact is released even when the copy fails; it is read exactly once.
pub async fn deliver(
    artifacts: &TempArtifactManager,
    artifact: &Path,
    output_dir: &Path,
    title: &str,
) -> io::Result<PathBuf> {
    let result = copy_into(artifact, output_dir, title).await;
    artifacts.release(artifact).await;
    result
}

async fn copy_into(artifact: &Path, output_dir: &Path, title: &str) -> io::Result<PathBuf> {
    let extension = artifact
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3");
    let mut stem = sanitize_filename(title);
    if stem.is_empty() {
        stem = "track".to_string();
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let (final_path, mut dest) = create_unique(output_dir, &stem, extension).await?;

    debug!("Copying {} -> {}", artifact.display(), final_path.display());
    let mut source = tokio::fs::File::open(artifact).await?;
    let copied = match tokio::io::copy(&mut source, &mut dest).await {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(dest);
            let _ = tokio::fs::remove_file(&final_path).await;
            return Err(e);
        }
    };
    dest.flush().await?;
    info!("Saved: {} ({} bytes)", final_path.display(), copied);
    Ok(final_path)
}

/// Create `<stem>.<ext>`, or `<stem> (N).<ext>` when taken.
///
/// The file is created exclusively, so concurrent deliveries of the same
/// title never write to one path.
async fn create_unique(
    dir: &Path,
    stem: &str,
    extension: &str,
) -> io::Result<(PathBuf, tokio::fs::File)> {
    for n in 1..=MAX_NAME_ATTEMPTS {
        let name = if n == 1 {
            format!("{}.{}", stem, extension)
        } else {
            format!("{} ({}).{}", stem, n, extension)
        };
        let path = dir.join(name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for {:?} in {}", stem, dir.display()),
    ))
}

/// Sanitize filename for filesystem
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches('.')
        .to_string()
}
