//! Streaming session: walk the playlist, download just-in-time, prefetch
//! the next track in the background, delete what has been played.


use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::config::Settings;
use crate::convert::FormatAdapter;
use crate::engine::{EngineState, PlaybackEngine, Ticker};
use crate::fetch::Downloader;
use crate::track::TrackEntry;
use crate::ui::Console;

/// Control bits shared with the input and signal handlers. `pause` is the
/// desired state; `skip`, `stop` and `seek_by` are one-shot requests,
/// `seek_by` accumulating whole seconds until the playback loop drains it.
pub struct SessionFlags {
    pub stop: AtomicBool,
    pub skip: AtomicBool,
    pub pause: AtomicBool,
    pub seek_by: AtomicI64,
}

impl SessionFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            skip: AtomicBool::new(false),
            pause: AtomicBool::new(false),
            seek_by: AtomicI64::new(0),
        })
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn request_skip(&self) {
        self.skip.store(true, Ordering::SeqCst);
    }

    pub fn toggle_pause(&self) {
        self.pause.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn request_seek_by(&self, secs: i64) {
        self.seek_by.fetch_add(secs, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackOutcome {
    Finished,
    Skipped,
    Stopped,
}

/// A background download of one upcoming track. At most one exists at a
/// time; the session joins it (with a deadline) before playing that track.
pub struct PrefetchTask {
    index: usize,
    handle: JoinHandle<()>,
    rx: Receiver<Option<PathBuf>>,
    cancel: Arc<AtomicBool>,
}

impl PrefetchTask {
    pub fn spawn(index: usize, track: TrackEntry, downloader: Arc<Downloader>) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = channel();
        let task_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            let result = downloader.download(&track, &task_cancel, &mut |_, _| {});
            let _ = tx.send(result);
        });
        Self {
            index,
            handle,
            rx,
            cancel,
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait up to `timeout` for the download. On timeout the task is
    /// cancelled and given one more `timeout` to acknowledge; a worker whose
    /// child is wedged with no output never observes the cancel flag, so
    /// after that it is abandoned rather than waited on forever.
    pub fn join(self, timeout: Duration) -> Option<PathBuf> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = self.handle.join();
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("prefetch still running after {timeout:?}, cancelling");
                self.cancel.store(true, Ordering::SeqCst);
                match self.rx.recv_timeout(timeout) {
                    Ok(result) => {
                        let _ = self.handle.join();
                        result
                    }
                    Err(_) => {
                        warn!("prefetch did not acknowledge the cancel, abandoning it");
                        None
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = self.handle.join();
                None
            }
        }
    }
}

pub struct Streamer {
    settings: Settings,
    engine: PlaybackEngine,
    downloader: Arc<Downloader>,
    adapter: FormatAdapter,
    ui: Console,
    flags: Arc<SessionFlags>,
}

impl Streamer {
    pub fn new(
        settings: Settings,
        engine: PlaybackEngine,
        downloader: Arc<Downloader>,
        adapter: FormatAdapter,
        flags: Arc<SessionFlags>,
    ) -> Self {
        Self {
            settings,
            engine,
            downloader,
            adapter,
            ui: Console::new(),
            flags,
        }
    }

    /// Play the playlist front to back. Each track is downloaded just in
    /// time (or taken from the prefetcher), played, and deleted.
    pub fn run(&mut self, tracks: Vec<TrackEntry>) -> std::io::Result<()> {
        fs::create_dir_all(self.downloader.temp_dir())?;

        let total = tracks.len();
        let mut prefetch: Option<PrefetchTask> = None;
        let mut index = 0;

        while index < total {
            if self.flags.stop.load(Ordering::SeqCst) {
                break;
            }
            let track = &tracks[index];

            let Some(file) = self.obtain(track, index, &mut prefetch) else {
                self.ui
                    .line(&format!("could not download '{}', skipping", track.title));
                index += 1;
                continue;
            };

            let playable = match self.adapter.ensure_playable(&file) {
                Ok(path) => path,
                Err(err) => {
                    warn!("'{}' unplayable: {err}", track.title);
                    self.ui
                        .line(&format!("'{}' is not playable here, skipping", track.title));
                    let _ = fs::remove_file(&file);
                    index += 1;
                    continue;
                }
            };

            if prefetch.is_none() && index + 1 < total {
                prefetch = Some(PrefetchTask::spawn(
                    index + 1,
                    tracks[index + 1].clone(),
                    self.downloader.clone(),
                ));
            }

            let outcome = self.play_track(track, &playable, index, total);
            let _ = fs::remove_file(&playable);

            if outcome == TrackOutcome::Stopped {
                break;
            }
            index += 1;
        }

        if let Some(task) = prefetch.take() {
            task.cancel();
            let _ = task.join(self.settings.download.prefetch_timeout());
        }
        cleanup_temp_dir(self.downloader.temp_dir(), None);
        self.ui.line("done");
        Ok(())
    }

    /// Current track's local file: the prefetcher's result when it was for
    /// this index, otherwise a foreground download with visible progress.
    fn obtain(
        &mut self,
        track: &TrackEntry,
        index: usize,
        prefetch: &mut Option<PrefetchTask>,
    ) -> Option<PathBuf> {
        let prefetched = match prefetch.take() {
            Some(task) if task.index == index => {
                task.join(self.settings.download.prefetch_timeout())
            }
            Some(task) => {
                // Stale task from a skipped-over index.
                task.cancel();
                let _ = task.join(self.settings.download.prefetch_timeout());
                None
            }
            None => None,
        };
        if prefetched.is_some() {
            return prefetched;
        }

        let title = track.title.clone();
        let ui = &mut self.ui;
        self.downloader
            .download(track, &self.flags.stop, &mut |percent, status| {
                ui.download_progress(&title, percent, status);
            })
    }

    fn play_track(
        &mut self,
        track: &TrackEntry,
        path: &Path,
        index: usize,
        total: usize,
    ) -> TrackOutcome {
        if !self.engine.load(path, track.duration) {
            self.ui
                .line(&format!("'{}' is not playable here, skipping", track.title));
            return TrackOutcome::Finished;
        }

        self.ui.now_playing(track, index, total);
        if let Some(backend) = self.engine.backend_name() {
            info!("playing '{}' via {backend}", track.title);
        }
        self.engine.play();

        let mut ticker = Ticker::new(self.settings.playback.tick_interval());
        loop {
            if self.flags.stop.load(Ordering::SeqCst) {
                self.engine.stop();
                return TrackOutcome::Stopped;
            }
            if self.flags.skip.swap(false, Ordering::SeqCst) {
                self.engine.stop();
                return TrackOutcome::Skipped;
            }

            let want_pause = self.flags.pause.load(Ordering::SeqCst);
            match (want_pause, self.engine.state()) {
                (true, EngineState::Playing) => {
                    self.engine.pause();
                    self.ui.line("paused");
                }
                (false, EngineState::Paused) => self.engine.play(),
                _ => {}
            }

            let seek_by = self.flags.seek_by.swap(0, Ordering::SeqCst);
            if seek_by != 0 {
                let current = self.engine.position();
                let target = if seek_by >= 0 {
                    current.saturating_add(Duration::from_secs(seek_by as u64))
                } else {
                    current
                        .checked_sub(Duration::from_secs(seek_by.unsigned_abs()))
                        .unwrap_or(Duration::ZERO)
                };
                self.engine.seek(target);
            }

            if self.engine.is_finished() {
                return TrackOutcome::Finished;
            }
            if self.engine.state() == EngineState::Playing && ticker.due() {
                self.ui
                    .tick(self.engine.position(), self.engine.duration());
            }

            thread::sleep(self.settings.playback.poll_interval());
        }
    }
}

/// Remove every file in the session's temp directory except `in_use`.
/// Subdirectories are left alone.
pub fn cleanup_temp_dir(dir: &Path, in_use: Option<&Path>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if in_use.is_some_and(|keep| keep == path) {
            continue;
        }
        let _ = fs::remove_file(&path);
    }
}
