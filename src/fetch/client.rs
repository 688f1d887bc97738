//! yt-dlp subprocess wrapper.
//!
//! One invocation per format attempt. Progress comes from stdout with
//! `--newline`, which also gives us a natural point to poll the cancel flag
//! between lines and kill the child mid-transfer.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use thiserror::Error;

use super::plan::AUDIO_EXTS;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("downloader process error: {0}")]
    Io(#[from] std::io::Error),
    #[error("download cancelled")]
    Cancelled,
    #[error("downloader exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("downloader reported success but produced no file")]
    NoOutput,
}

/// Fetches one remote track into a local file.
///
/// `dest_stem` is the output path without an extension; the client picks the
/// extension and returns the full path it wrote. Implementations must poll
/// `cancel` during the transfer and return [`FetchError::Cancelled`] promptly
/// once it is set.
pub trait FetchClient: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        format: &str,
        dest_stem: &Path,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(f32, &str),
    ) -> Result<PathBuf, FetchError>;
}

pub struct YtDlpClient {
    bin: String,
}

impl YtDlpClient {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }
}

impl FetchClient for YtDlpClient {
    fn fetch(
        &self,
        url: &str,
        format: &str,
        dest_stem: &Path,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(f32, &str),
    ) -> Result<PathBuf, FetchError> {
        let mut template = dest_stem.as_os_str().to_os_string();
        template.push(".%(ext)s");

        debug!("fetching {url} with format {format}");
        let mut child = Command::new(&self.bin)
            .arg("-f")
            .arg(format)
            .arg("-o")
            .arg(&template)
            .arg("--newline")
            .arg("--no-playlist")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                if cancel.load(Ordering::SeqCst) {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(FetchError::Cancelled);
                }
                let Ok(line) = line else { break };
                if let Some((percent, status)) = parse_progress_line(&line) {
                    progress(percent, status);
                }
            }
        }

        let status = child.wait()?;
        if cancel.load(Ordering::SeqCst) {
            return Err(FetchError::Cancelled);
        }
        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(FetchError::Failed {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        find_output(dest_stem).ok_or(FetchError::NoOutput)
    }
}

/// Locate the file a successful run wrote, whatever extension it chose.
/// Common audio containers are preferred, but anything `stem.<ext>` counts;
/// in-progress suffixes and empty files do not, and an empty file is removed
/// on sight so it can never be mistaken for a finished download again.
pub(super) fn find_output(dest_stem: &Path) -> Option<PathBuf> {
    for ext in AUDIO_EXTS {
        if let Some(found) = finished_file(dest_stem.with_extension(ext)) {
            return Some(found);
        }
    }

    let parent = dest_stem.parent()?;
    let stem_name = dest_stem.file_name()?.to_str()?;
    for entry in fs::read_dir(parent).ok()?.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(ext) = name
            .strip_prefix(stem_name)
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };
        // `song.f251.webm` and friends are intermediates, not outputs.
        if ext.is_empty() || ext.contains('.') || ext == "part" || ext == "ytdl" {
            continue;
        }
        if let Some(found) = finished_file(entry.path()) {
            return Some(found);
        }
    }
    None
}

fn finished_file(candidate: PathBuf) -> Option<PathBuf> {
    let meta = fs::metadata(&candidate).ok()?;
    if !meta.is_file() {
        return None;
    }
    if meta.len() == 0 {
        // A zero-byte file is a failed write, not a download.
        let _ = fs::remove_file(&candidate);
        return None;
    }
    Some(candidate)
}

/// Extract the percentage and the human status text from a `--newline`
/// progress line, e.g. `[download]  42.7% of 3.52MiB at 1.21MiB/s ETA 00:02`
/// yields `(42.7, "42.7% of 3.52MiB at 1.21MiB/s ETA 00:02")`.
pub(super) fn parse_progress_line(line: &str) -> Option<(f32, &str)> {
    let rest = line.strip_prefix("[download]")?.trim();
    let token = rest.split_whitespace().next()?;
    let percent = token.strip_suffix('%')?.parse().ok()?;
    Some((percent, rest))
}
