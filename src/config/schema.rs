use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/segue/config.toml` or `~/.config/segue/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SEGUE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsSettings,
    pub download: DownloadSettings,
    pub playback: PlaybackSettings,
    pub environment: EnvironmentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathsSettings::default(),
            download: DownloadSettings::default(),
            playback: PlaybackSettings::default(),
            environment: EnvironmentSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSettings {
    /// Directory for transient track files. Created on session start,
    /// never expected to survive a restart.
    pub temp_dir: PathBuf,
    /// `yt-dlp` binary used for both resolution and fetching.
    pub ytdlp: String,
    /// External player binary backing the fallback backend.
    pub player: String,
    /// `ffmpeg` binary for post-download conversion. Leave unset when no
    /// transcoder is installed; conversion is then skipped entirely.
    pub ffmpeg: Option<String>,
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("segue"),
            ytdlp: "yt-dlp".to_string(),
            player: "ffplay".to_string(),
            ffmpeg: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// How long the scheduler waits on an in-flight background prefetch
    /// before cancelling it and downloading synchronously (seconds).
    pub prefetch_timeout_secs: u64,
    /// Bitrate for converted MP3 output (kbit/s).
    pub transcode_bitrate_kbps: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            prefetch_timeout_secs: 30,
            transcode_bitrate_kbps: 192,
        }
    }
}

impl DownloadSettings {
    pub fn prefetch_timeout(&self) -> Duration {
        Duration::from_secs(self.prefetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Sleep between cancellation/skip checks in the playback wait loop
    /// (milliseconds). Bounds responsiveness to control flags.
    pub poll_interval_ms: u64,
    /// Interval between progress reports to the UI sink (milliseconds).
    pub tick_interval_ms: u64,
    /// Duration ceiling used for progress-bar scaling when neither the
    /// entry nor the backend reports a length (seconds).
    pub fallback_duration_secs: u64,
    /// Grace period past the declared duration before the wait loop gives
    /// up on a track (seconds).
    pub end_grace_secs: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            tick_interval_ms: 500,
            fallback_duration_secs: 180,
            end_grace_secs: 10,
        }
    }
}

impl PlaybackSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn fallback_duration(&self) -> Duration {
        Duration::from_secs(self.fallback_duration_secs)
    }

    pub fn end_grace(&self) -> Duration {
        Duration::from_secs(self.end_grace_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Constrained-device mode: restrict downloads to containers the
    /// fallback backend is known to decode instead of best-quality audio.
    pub mobile: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self { mobile: false }
    }
}
