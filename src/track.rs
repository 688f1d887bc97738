use std::time::Duration;

/// One playable item from a resolved playlist.
///
/// Entries are immutable once the resolver has produced them; a track's
/// identity is its position in the playlist sequence.
#[derive(Debug, Clone)]
pub struct TrackEntry {
    pub title: String,
    pub uploader: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    /// Original page/stream URL handed to the fetch client.
    pub source_url: String,
}

impl TrackEntry {
    /// Filesystem-safe stem for this entry's temp file.
    pub fn file_stem(&self) -> String {
        sanitize_title(&self.title)
    }
}

/// Replace anything outside alphanumerics and ` ._-()` with `_`.
pub fn sanitize_title(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || " ._-()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Render a duration as `MM:SS` for status lines.
pub fn format_time(d: Option<Duration>) -> String {
    let secs = d.map(|d| d.as_secs()).unwrap_or(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(
            sanitize_title("Artist - Song (Live) [2024].mp3"),
            "Artist - Song (Live) _2024_.mp3"
        );
    }

    #[test]
    fn sanitize_replaces_separators_and_symbols() {
        assert_eq!(sanitize_title("a/b\\c:d*e?"), "a_b_c_d_e_");
        assert_eq!(sanitize_title("naïve café"), "naïve café");
    }

    #[test]
    fn format_time_clamps_missing() {
        assert_eq!(format_time(None), "00:00");
        assert_eq!(format_time(Some(Duration::from_secs(65))), "01:05");
        assert_eq!(format_time(Some(Duration::from_secs(600))), "10:00");
    }
}
