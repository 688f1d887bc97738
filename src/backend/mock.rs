//! Scriptable backend for engine and session tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{AudioBackend, SeekError};

pub struct MockBackend {
    /// Whether `try_load` accepts files at all.
    pub accepts: bool,
    pub pauseable: bool,
    pub seekable: bool,
    /// How many `is_active` polls report true after `play`.
    pub active_polls: u32,
    pub loaded: Option<PathBuf>,
    pub playing: bool,
    pub calls: Vec<String>,
    remaining_polls: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            accepts: true,
            pauseable: true,
            seekable: true,
            active_polls: 0,
            loaded: None,
            playing: false,
            calls: Vec::new(),
            remaining_polls: 0,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accepts: false,
            ..Self::new()
        }
    }
}

impl AudioBackend for MockBackend {
    fn try_load(&mut self, path: &Path) -> bool {
        self.calls.push(format!("load {}", path.display()));
        if !self.accepts {
            return false;
        }
        self.loaded = Some(path.to_path_buf());
        self.remaining_polls = self.active_polls;
        true
    }

    fn play(&mut self) {
        self.calls.push("play".to_string());
        self.playing = true;
    }

    fn pause(&mut self) {
        self.calls.push("pause".to_string());
        self.playing = false;
    }

    fn seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.calls.push(format!("seek {}", pos.as_millis()));
        if self.seekable {
            Ok(())
        } else {
            Err(SeekError::Unsupported)
        }
    }

    fn position(&self) -> Option<Duration> {
        None
    }

    fn is_active(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        if self.remaining_polls > 0 {
            self.remaining_polls -= 1;
            true
        } else {
            false
        }
    }

    fn supports_pause(&self) -> bool {
        self.pauseable
    }

    fn stop(&mut self) {
        self.calls.push("stop".to_string());
        self.loaded = None;
        self.playing = false;
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
