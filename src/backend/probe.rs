//! Cheap file inspection, separate from live playback.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;

/// Read the audio duration from the file's own metadata, if any.
pub fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    let duration = tagged.properties().duration();
    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}

/// Whether the in-process decoder can open this file at all.
pub fn decodable(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    rodio::Decoder::new(BufReader::new(file)).is_ok()
}
