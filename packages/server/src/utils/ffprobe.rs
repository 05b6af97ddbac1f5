use std::path::Path;

use anyhow::{Context, Result};
use tokio::process::Command;

/// Probe a media file's duration in seconds using ffprobe.
///
/// Fails when ffprobe is missing, the container is unrecognized, or the
/// output cannot be parsed; callers surface this as an internal error.
pub async fn probe_duration<P: AsRef<Path>>(file_path: P) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(file_path.as_ref())
        .output()
        .await
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffprobe failed: {}", stderr);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .trim()
        .parse::<f64>()
        .context("Failed to parse ffprobe duration")
}
