use std::path::Path;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeekError {
    #[error("backend does not support seeking")]
    Unsupported,
    #[error("seek failed: {0}")]
    Failed(String),
}

/// A single audio output route.
///
/// Contract: `try_load` prepares a file without starting output and reports
/// whether this backend accepts it. After a successful load the backend is
/// idle until `play`. `pause` suspends output; for backends where
/// `supports_pause` is false the pause discards the position and the caller
/// must `seek` before resuming. `is_active` is only meaningful while the
/// track should be playing: false then means the backend reached the end.
pub trait AudioBackend {
    /// Prepare `path` for playback. Returns false if this backend cannot
    /// handle the file; the backend stays unloaded in that case.
    fn try_load(&mut self, path: &Path) -> bool;

    /// Start or resume output.
    fn play(&mut self);

    /// Suspend output. May discard the position (see `supports_pause`).
    fn pause(&mut self);

    /// Reposition to `pos`. Valid both before `play` and during output.
    fn seek(&mut self, pos: Duration) -> Result<(), SeekError>;

    /// Position as reported by the backend itself, if it has one.
    fn position(&self) -> Option<Duration>;

    /// Whether the backend is still producing (or queued to produce) audio.
    /// Takes `&mut self` so subprocess backends can reap a finished child.
    fn is_active(&mut self) -> bool;

    /// True when `pause` keeps the position and `play` resumes in place.
    fn supports_pause(&self) -> bool;

    /// Tear down the current track, releasing the file.
    fn stop(&mut self);

    fn name(&self) -> &'static str;
}
