//! Playback engine: one track at a time through whichever backend takes it.
//!
//! `load` offers the file to each backend in order and pins the first that
//! accepts it; the pinned backend serves the whole track. All position
//! reporting comes from the engine's own clock, and the sleep inhibitor is
//! held exactly while the state is `Playing`.

mod clock;

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};

use crate::backend::{AudioBackend, probe_duration};
use crate::wakelock::Inhibitor;

pub use clock::{PositionClock, Ticker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Loaded,
    Playing,
    Paused,
    Stopped,
    Finished,
}

pub struct PlaybackEngine {
    backends: Vec<Box<dyn AudioBackend>>,
    active: Option<usize>,
    state: EngineState,
    clock: PositionClock,
    inhibitor: Box<dyn Inhibitor>,
    duration: Option<Duration>,
    fallback_duration: Duration,
    end_grace: Duration,
}

impl PlaybackEngine {
    pub fn new(
        backends: Vec<Box<dyn AudioBackend>>,
        inhibitor: Box<dyn Inhibitor>,
        fallback_duration: Duration,
        end_grace: Duration,
    ) -> Self {
        Self {
            backends,
            active: None,
            state: EngineState::Idle,
            clock: PositionClock::new(),
            inhibitor,
            duration: None,
            fallback_duration,
            end_grace,
        }
    }

    /// Offer `path` to the backends in order. `known_duration` comes from the
    /// playlist metadata; the file's own header wins only when the playlist
    /// had none.
    pub fn load(&mut self, path: &Path, known_duration: Option<Duration>) -> bool {
        self.unload();

        for (i, backend) in self.backends.iter_mut().enumerate() {
            if backend.try_load(path) {
                debug!("{} accepted {:?}", backend.name(), path);
                self.active = Some(i);
                self.duration = known_duration.or_else(|| probe_duration(path));
                self.state = EngineState::Loaded;
                return true;
            }
        }

        warn!("no backend accepted {:?}", path);
        false
    }

    /// Start from `Loaded`, or resume from `Paused`.
    pub fn play(&mut self) {
        match self.state {
            EngineState::Loaded => {
                self.clock.start();
                self.with_active(|b| b.play());
                self.enter_playing();
            }
            EngineState::Paused => {
                if !self.active_supports_pause() {
                    // The backend lost its position when it was paused; put
                    // it back where the clock says we were.
                    let pos = self.clock.elapsed();
                    if let Some(Err(err)) = self.try_active(|b| b.seek(pos)) {
                        warn!("resume seek failed, restarting track: {err}");
                        self.clock.set(Duration::ZERO);
                    }
                }
                self.with_active(|b| b.play());
                self.clock.resume();
                self.enter_playing();
            }
            _ => {}
        }
    }

    pub fn pause(&mut self) {
        if self.state != EngineState::Playing {
            return;
        }
        self.clock.pause();
        self.with_active(|b| b.pause());
        self.state = EngineState::Paused;
        self.inhibitor.release();
    }

    pub fn seek(&mut self, pos: Duration) {
        if !matches!(self.state, EngineState::Playing | EngineState::Paused) {
            return;
        }
        match self.try_active(|b| b.seek(pos)) {
            Some(Ok(())) => self.clock.set(pos),
            Some(Err(err)) => warn!("seek ignored: {err}"),
            None => {}
        }
    }

    pub fn stop(&mut self) {
        self.unload();
        self.state = EngineState::Stopped;
    }

    /// End-of-track check; moves to `Finished` (and tears the backend down)
    /// when the backend ran dry or the time ceiling was exceeded.
    pub fn is_finished(&mut self) -> bool {
        if self.state == EngineState::Finished {
            return true;
        }
        if self.state != EngineState::Playing {
            return false;
        }

        let ended = match self.active {
            Some(i) => !self.backends[i].is_active(),
            None => true,
        };

        let limit = self.duration() + self.end_grace;
        let overran = self.clock.elapsed() >= limit;
        if overran && !ended {
            warn!("track exceeded its expected length ({limit:?}), cutting off");
        }

        if ended || overran {
            self.unload();
            self.state = EngineState::Finished;
            info!("track finished at {:?}", self.clock.elapsed());
            true
        } else {
            false
        }
    }

    pub fn position(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Track length for progress display: playlist metadata, else the file
    /// header, else the configured fallback ceiling.
    pub fn duration(&self) -> Duration {
        self.duration.unwrap_or(self.fallback_duration)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.active.map(|i| self.backends[i].name())
    }

    fn enter_playing(&mut self) {
        self.state = EngineState::Playing;
        self.inhibitor.acquire();
    }

    fn unload(&mut self) {
        if let Some(i) = self.active.take() {
            self.backends[i].stop();
        }
        self.inhibitor.release();
        self.clock.pause();
    }

    fn active_supports_pause(&self) -> bool {
        self.active
            .map(|i| self.backends[i].supports_pause())
            .unwrap_or(false)
    }

    fn with_active(&mut self, f: impl FnOnce(&mut dyn AudioBackend)) {
        if let Some(i) = self.active {
            f(self.backends[i].as_mut());
        }
    }

    fn try_active<T>(&mut self, f: impl FnOnce(&mut dyn AudioBackend) -> T) -> Option<T> {
        self.active.map(|i| f(self.backends[i].as_mut()))
    }
}
