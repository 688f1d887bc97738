//! Download orchestration: reuse, ordered format attempts, cancellation.

mod client;
mod plan;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

pub use client::{FetchClient, FetchError, YtDlpClient};
pub use plan::{AUDIO_EXTS, format_plan};

use crate::track::TrackEntry;

pub struct Downloader {
    client: Box<dyn FetchClient>,
    temp_dir: PathBuf,
    plan: &'static [&'static str],
}

impl Downloader {
    pub fn new(client: Box<dyn FetchClient>, temp_dir: PathBuf, can_transcode: bool) -> Self {
        Self {
            client,
            temp_dir,
            plan: format_plan(can_transcode),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Fetch `track` into the temp directory, or reuse a file an earlier run
    /// already left there. Returns `None` when every format attempt failed or
    /// `cancel` was set; partial files never survive this call.
    pub fn download(
        &self,
        track: &TrackEntry,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(f32, &str),
    ) -> Option<PathBuf> {
        let stem = self.temp_dir.join(track.file_stem());

        if let Some(existing) = client::find_output(&stem) {
            info!("reusing {:?}", existing);
            return Some(existing);
        }

        for format in self.plan {
            if cancel.load(Ordering::SeqCst) {
                return None;
            }
            match self
                .client
                .fetch(&track.source_url, format, &stem, cancel, progress)
            {
                Ok(path) => return Some(path),
                Err(FetchError::Cancelled) => {
                    cleanup_partials(&stem);
                    return None;
                }
                Err(err) => {
                    warn!("format {format} failed for '{}': {err}", track.title);
                    cleanup_partials(&stem);
                }
            }
        }

        warn!("all formats exhausted for '{}'", track.title);
        None
    }
}

/// Remove in-progress files a dead attempt left behind (`.part`, `.ytdl`).
fn cleanup_partials(stem: &Path) {
    let Some(parent) = stem.parent() else { return };
    let Some(stem_name) = stem.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(stem_name) && (name.ends_with(".part") || name.ends_with(".ytdl")) {
            let _ = fs::remove_file(entry.path());
        }
    }
}
