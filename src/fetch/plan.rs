//! Format selection order for the downloader.

/// Containers checked first when locating a finished download. `bestaudio/
/// best` may land in something else entirely (`mp4`, `mkv`, `flac`), so this
/// list is a preference order, not a filter.
pub const AUDIO_EXTS: &[&str] = &["mp3", "ogg", "m4a", "opus", "webm"];

/// Environments without a local transcoder can only play what arrives in a
/// directly decodable container, so they ask the extractor for those formats
/// explicitly, best quality first, then anything at all in those containers.
const CONSTRAINED_PLAN: &[&str] = &[
    "bestaudio[ext=mp3]/bestaudio[acodec=mp3]",
    "bestaudio[ext=ogg]/bestaudio[acodec=vorbis]",
    "worst[ext=mp3]/worst[acodec=mp3]",
    "worst[ext=ogg]/worst[acodec=vorbis]",
];

/// With a transcoder on hand, take the best audio in whatever container and
/// convert locally when needed.
const CAPABLE_PLAN: &[&str] = &["bestaudio/best"];

/// Ordered format selectors to attempt, one download try per entry.
pub fn format_plan(can_transcode: bool) -> &'static [&'static str] {
    if can_transcode {
        CAPABLE_PLAN
    } else {
        CONSTRAINED_PLAN
    }
}
