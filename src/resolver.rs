//! Playlist resolution via `yt-dlp -J`.
//!
//! One subprocess call turns a playlist (or single-track) URL into the
//! track entries the session walks. Entries the extractor could not resolve
//! come back as nulls in the JSON and are skipped.

use std::process::Command;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::track::TrackEntry;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to run resolver: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("resolver exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("unexpected resolver output: {0}")]
    BadJson(#[from] serde_json::Error),
    #[error("no playable entries in playlist")]
    Empty,
}

pub trait Resolver {
    fn resolve(&self, url: &str) -> Result<Vec<TrackEntry>, ResolveError>;
}

pub struct YtDlpResolver {
    bin: String,
}

impl YtDlpResolver {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }
}

impl Resolver for YtDlpResolver {
    fn resolve(&self, url: &str) -> Result<Vec<TrackEntry>, ResolveError> {
        debug!("resolving {url}");
        let output = Command::new(&self.bin)
            .arg("-J")
            .arg("--flat-playlist")
            .arg(url)
            .output()?;

        if !output.status.success() {
            return Err(ResolveError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info: RawInfo = serde_json::from_slice(&output.stdout)?;
        let tracks = entries_from(info);
        if tracks.is_empty() {
            Err(ResolveError::Empty)
        } else {
            Ok(tracks)
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    entries: Option<Vec<Option<RawEntry>>>,
    #[serde(flatten)]
    single: RawEntry,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    title: Option<String>,
    uploader: Option<String>,
    album: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
    webpage_url: Option<String>,
}

fn entries_from(info: RawInfo) -> Vec<TrackEntry> {
    match info.entries {
        // A playlist: flatten, dropping entries the extractor gave up on.
        Some(entries) => entries
            .into_iter()
            .flatten()
            .filter_map(into_track)
            .collect(),
        // A bare track URL resolves to a single top-level object.
        None => into_track(info.single).into_iter().collect(),
    }
}

fn into_track(raw: RawEntry) -> Option<TrackEntry> {
    let source_url = match raw.url.or(raw.webpage_url) {
        Some(url) => url,
        None => {
            warn!("entry without a URL, skipping");
            return None;
        }
    };
    Some(TrackEntry {
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        uploader: raw.uploader,
        album: raw.album,
        // Extractors occasionally report a negative or NaN duration.
        duration: raw
            .duration
            .and_then(|d| Duration::try_from_secs_f64(d).ok()),
        source_url,
    })
}
