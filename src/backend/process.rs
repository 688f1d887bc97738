//! Fallback backend that shells out to an external player.
//!
//! Used for files the in-process decoder rejects. The player has no pause
//! or position primitive from our side, so pause kills the child and resume
//! respawns it at an offset (`seek` then `play`). The caller's clock is the
//! only source of truth for the position.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use log::{debug, warn};

use super::types::{AudioBackend, SeekError};

pub struct ProcessBackend {
    player: String,
    loaded: Option<PathBuf>,
    start_at: Duration,
    child: Option<Child>,
}

impl ProcessBackend {
    pub fn new(player: &str) -> Self {
        Self {
            player: player.to_string(),
            loaded: None,
            start_at: Duration::ZERO,
            child: None,
        }
    }

    fn spawn(&mut self) {
        let Some(path) = &self.loaded else { return };
        let args = player_args(path, self.start_at);
        match Command::new(&self.player)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                debug!("{} playing {:?} from {:?}", self.player, path, self.start_at);
                self.child = Some(child);
            }
            Err(err) => warn!("failed to spawn {}: {err}", self.player),
        }
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Argument list for an unattended, audio-only ffplay run.
pub(super) fn player_args(path: &Path, start_at: Duration) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-nodisp".into(),
        "-autoexit".into(),
        "-loglevel".into(),
        "error".into(),
    ];
    if !start_at.is_zero() {
        args.push("-ss".into());
        args.push(start_at.as_secs_f64().to_string().into());
    }
    args.push(path.into());
    args
}

impl AudioBackend for ProcessBackend {
    fn try_load(&mut self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        self.kill_child();
        self.loaded = Some(path.to_path_buf());
        self.start_at = Duration::ZERO;
        true
    }

    fn play(&mut self) {
        if self.child.is_none() {
            self.spawn();
        }
    }

    fn pause(&mut self) {
        // No pause primitive: stop the child. Position is gone; the caller
        // seeks before resuming.
        self.kill_child();
    }

    fn seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        if self.loaded.is_none() {
            return Err(SeekError::Failed("no track loaded".to_string()));
        }
        self.start_at = pos;
        if self.child.is_some() {
            self.kill_child();
            self.spawn();
            if self.child.is_none() {
                return Err(SeekError::Failed("player respawn failed".to_string()));
            }
        }
        Ok(())
    }

    fn position(&self) -> Option<Duration> {
        None
    }

    fn is_active(&mut self) -> bool {
        let Some(child) = &mut self.child else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => {
                self.child = None;
                false
            }
        }
    }

    fn supports_pause(&self) -> bool {
        false
    }

    fn stop(&mut self) {
        self.kill_child();
        self.loaded = None;
        self.start_at = Duration::ZERO;
    }

    fn name(&self) -> &'static str {
        "player"
    }
}
