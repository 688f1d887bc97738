use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use super::client::{FetchClient, FetchError, find_output, parse_progress_line};
use super::plan::format_plan;
use super::{Downloader, cleanup_partials};
use crate::track::TrackEntry;

/// Fails the first `failures` attempts, then writes `stem.mp3`. The attempt
/// log is shared so tests can inspect it after handing the client away.
struct ScriptedClient {
    failures: usize,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    fn new(failures: usize) -> (Self, Arc<Mutex<Vec<String>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                failures,
                attempts: attempts.clone(),
            },
            attempts,
        )
    }
}

impl FetchClient for ScriptedClient {
    fn fetch(
        &self,
        _url: &str,
        format: &str,
        dest_stem: &Path,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(f32, &str),
    ) -> Result<PathBuf, FetchError> {
        if cancel.load(Ordering::SeqCst) {
            return Err(FetchError::Cancelled);
        }
        let mut attempts = self.attempts.lock().unwrap();
        attempts.push(format.to_string());
        if attempts.len() <= self.failures {
            return Err(FetchError::NoOutput);
        }
        progress(100.0, "100% of 1.00MiB");
        let path = dest_stem.with_extension("mp3");
        fs::write(&path, b"audio").unwrap();
        Ok(path)
    }
}

fn track(title: &str) -> TrackEntry {
    TrackEntry {
        title: title.to_string(),
        uploader: None,
        album: None,
        duration: None,
        source_url: format!("https://example.com/{title}"),
    }
}

#[test]
fn progress_line_parsing() {
    assert_eq!(
        parse_progress_line("[download]  42.7% of 3.52MiB at 1.21MiB/s ETA 00:02"),
        Some((42.7, "42.7% of 3.52MiB at 1.21MiB/s ETA 00:02"))
    );
    assert_eq!(
        parse_progress_line("[download] 100% of 3.52MiB in 00:03"),
        Some((100.0, "100% of 3.52MiB in 00:03"))
    );
    assert_eq!(parse_progress_line("[info] extracting"), None);
    assert_eq!(parse_progress_line("[download] Destination: x.mp3"), None);
}

#[test]
fn constrained_plan_prefers_best_mp3_then_ogg() {
    let plan = format_plan(false);
    assert_eq!(plan.len(), 4);
    assert!(plan[0].contains("bestaudio[ext=mp3]"));
    assert!(plan[1].contains("bestaudio[ext=ogg]"));
    assert!(plan[2].starts_with("worst"));
    assert_eq!(format_plan(true), &["bestaudio/best"]);
}

#[test]
fn download_walks_formats_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (client, attempts) = ScriptedClient::new(2);
    let downloader = Downloader::new(Box::new(client), dir.path().to_path_buf(), false);
    let cancel = AtomicBool::new(false);
    let path = downloader
        .download(&track("song"), &cancel, &mut |_, _| {})
        .unwrap();
    assert!(path.is_file());

    let expected: Vec<String> = format_plan(false)[..3]
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(*attempts.lock().unwrap(), expected);
}

#[test]
fn reuse_skips_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("song.ogg");
    fs::write(&existing, b"cached").unwrap();

    let (client, attempts) = ScriptedClient::new(0);
    let downloader = Downloader::new(Box::new(client), dir.path().to_path_buf(), false);
    let cancel = AtomicBool::new(false);
    let path = downloader
        .download(&track("song"), &cancel, &mut |_, _| {})
        .unwrap();
    assert_eq!(path, existing);
    assert!(attempts.lock().unwrap().is_empty());
}

#[test]
fn empty_leftover_is_refetched_not_reused() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("song.mp3"), b"").unwrap();

    let (client, attempts) = ScriptedClient::new(0);
    let downloader = Downloader::new(Box::new(client), dir.path().to_path_buf(), false);
    let cancel = AtomicBool::new(false);
    let path = downloader
        .download(&track("song"), &cancel, &mut |_, _| {})
        .unwrap();

    assert_eq!(attempts.lock().unwrap().len(), 1);
    assert!(fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn output_in_an_unlisted_container_is_found() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("song");
    fs::write(dir.path().join("song.mp3.part"), b"x").unwrap();
    fs::write(dir.path().join("song.ytdl"), b"x").unwrap();
    fs::write(dir.path().join("song.f251.webm"), b"x").unwrap();
    fs::write(dir.path().join("song.mp4"), b"video container").unwrap();

    assert_eq!(find_output(&stem), Some(dir.path().join("song.mp4")));
}

#[test]
fn preferred_container_wins_over_others() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("song");
    fs::write(dir.path().join("song.mp4"), b"video container").unwrap();
    fs::write(dir.path().join("song.ogg"), b"audio").unwrap();

    assert_eq!(find_output(&stem), Some(dir.path().join("song.ogg")));
}

#[test]
fn empty_outputs_are_removed_on_sight() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("song");
    fs::write(dir.path().join("song.mp3"), b"").unwrap();
    fs::write(dir.path().join("song.mp4"), b"").unwrap();

    assert_eq!(find_output(&stem), None);
    assert!(!dir.path().join("song.mp3").exists());
    assert!(!dir.path().join("song.mp4").exists());
}

#[test]
fn cancel_before_start_downloads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (client, attempts) = ScriptedClient::new(0);
    let downloader = Downloader::new(Box::new(client), dir.path().to_path_buf(), false);
    let cancel = AtomicBool::new(true);
    assert!(
        downloader
            .download(&track("song"), &cancel, &mut |_, _| {})
            .is_none()
    );
    assert!(attempts.lock().unwrap().is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn exhausted_formats_leave_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let (client, _) = ScriptedClient::new(99);
    let downloader = Downloader::new(Box::new(client), dir.path().to_path_buf(), false);
    let cancel = AtomicBool::new(false);
    assert!(
        downloader
            .download(&track("song"), &cancel, &mut |_, _| {})
            .is_none()
    );
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn partial_cleanup_spares_other_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("song");
    fs::write(dir.path().join("song.mp3.part"), b"x").unwrap();
    fs::write(dir.path().join("song.ytdl"), b"x").unwrap();
    fs::write(dir.path().join("other.mp3.part"), b"x").unwrap();

    cleanup_partials(&stem);

    assert!(!dir.path().join("song.mp3.part").exists());
    assert!(!dir.path().join("song.ytdl").exists());
    assert!(dir.path().join("other.mp3.part").exists());
}
