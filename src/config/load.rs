use std::{env, path::PathBuf};

use log::debug;

use super::schema::Settings;

impl Settings {
    /// Load settings: struct defaults, overlaid by the config file when one
    /// exists, overlaid by `SEGUE__`-prefixed environment variables.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = resolve_config_path() {
            debug!("config file candidate: {:?}", path);
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SEGUE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Sanity checks that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.poll_interval_ms == 0 {
            return Err("playback.poll_interval_ms must be >= 1".to_string());
        }
        if self.playback.tick_interval_ms == 0 {
            return Err("playback.tick_interval_ms must be >= 1".to_string());
        }
        if self.download.prefetch_timeout_secs == 0 {
            return Err("download.prefetch_timeout_secs must be >= 1".to_string());
        }
        if self.download.transcode_bitrate_kbps < 32 {
            return Err("download.transcode_bitrate_kbps must be >= 32".to_string());
        }
        Ok(())
    }
}

/// Config path from `SEGUE_CONFIG_PATH`, falling back to the XDG location.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SEGUE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/segue/config.toml`, or `~/.config/segue/config.toml`
/// when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("segue").join("config.toml"))
}
