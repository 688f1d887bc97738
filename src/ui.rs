use std::io::{Write, stdout};

use crate::track::{TrackEntry, format_time};

/// Console front-end: now-playing banner, progress line, download status.
///
/// Progress updates rewrite a single line with a carriage return; anything
/// that should persist goes through `line`.
pub struct Console {
    progress_shown: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            progress_shown: false,
        }
    }

    /// Print a persistent line, clearing any in-place progress line first.
    pub fn line(&mut self, text: &str) {
        self.clear_progress();
        println!("{text}");
    }

    pub fn now_playing(&mut self, track: &TrackEntry, index: usize, total: usize) {
        self.clear_progress();
        let uploader = track.uploader.as_deref().unwrap_or("unknown");
        let album = track
            .album
            .as_deref()
            .map(|a| format!(" [{a}]"))
            .unwrap_or_default();
        println!(
            "[{}/{}] {} - {}{} ({})",
            index + 1,
            total,
            uploader,
            track.title,
            album,
            format_time(track.duration),
        );
    }

    /// Rewrite the in-place playback progress line.
    pub fn tick(&mut self, elapsed: std::time::Duration, total: std::time::Duration) {
        print!(
            "\r  {} / {}   ",
            format_time(Some(elapsed)),
            format_time(Some(total)),
        );
        let _ = stdout().flush();
        self.progress_shown = true;
    }

    /// Rewrite the in-place download progress line. `status` is the
    /// downloader's own report (size, speed, ETA); it may be empty.
    pub fn download_progress(&mut self, title: &str, percent: f32, status: &str) {
        if status.is_empty() {
            print!("\r  downloading {title}: {percent:>5.1}%   ");
        } else {
            print!("\r  downloading {title}: {status}   ");
        }
        let _ = stdout().flush();
        self.progress_shown = true;
    }

    fn clear_progress(&mut self) {
        if self.progress_shown {
            println!();
            self.progress_shown = false;
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
