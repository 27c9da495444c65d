//! Video download collaborator.
//!
//! The runner only sees the [`VideoDownloader`] trait; production uses the
//! yt-dlp subprocess implementation, tests substitute an in-memory fake.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::DeepSearchError;

/// Downloads one video into `output_dir` and returns the saved file's path.
pub trait VideoDownloader: Send + Sync {
    fn download(
        &self,
        url: &str,
        output_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, DeepSearchError>> + Send;
}

/// yt-dlp subprocess downloader.
///
/// Prefers an mp4 video+m4a audio merge, embeds metadata, and refuses
/// playlist expansion. The final file path is read from stdout via
/// `--print after_move:filepath`.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    binary: String,
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_owned(),
        }
    }
}

impl YtDlpDownloader {
    #[must_use]
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_owned(),
        }
    }
}

impl VideoDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf, DeepSearchError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| DeepSearchError::Download {
                reason: format!("could not create download dir: {e}"),
            })?;

        let output_template = output_dir.join("%(id)s.%(ext)s");
        let output = Command::new(&self.binary)
            .arg("--format")
            .arg("bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best")
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("--embed-metadata")
            .arg("--no-playlist")
            .arg("--no-simulate")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("--output")
            .arg(&output_template)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DeepSearchError::Download {
                reason: format!("could not spawn {}: {e}", self.binary),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeepSearchError::Download {
                reason: format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    stderr.lines().last().unwrap_or("no stderr")
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| DeepSearchError::Download {
                reason: "downloader reported no output file".to_owned(),
            })?;

        Ok(PathBuf::from(path))
    }
}
