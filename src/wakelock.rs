//! System sleep inhibition, held only while audio is playing.
//!
//! On Linux this takes a logind `Inhibit("sleep")` lock over D-Bus and holds
//! the returned fd; dropping the fd releases the lock. When the bus or the
//! manager is unavailable the engine runs with a no-op inhibitor instead.

use log::{debug, warn};
use thiserror::Error;
use zvariant::OwnedFd;

#[derive(Debug, Error)]
pub enum WakeLockError {
    #[error("d-bus error: {0}")]
    Bus(#[from] zbus::Error),
    #[error("d-bus type error: {0}")]
    Type(#[from] zvariant::Error),
}

/// Acquire/release both return whether the call changed anything, so
/// repeated calls in the same state are visible no-ops.
pub trait Inhibitor {
    fn acquire(&mut self) -> bool;
    fn release(&mut self) -> bool;
    fn held(&self) -> bool;
}

pub struct LogindInhibitor {
    connection: zbus::blocking::Connection,
    fd: Option<OwnedFd>,
}

impl LogindInhibitor {
    pub fn connect() -> Result<Self, WakeLockError> {
        let connection = zbus::blocking::Connection::system()?;
        Ok(Self {
            connection,
            fd: None,
        })
    }

    fn inhibit(&self) -> Result<OwnedFd, WakeLockError> {
        let reply = self.connection.call_method(
            Some("org.freedesktop.login1"),
            "/org/freedesktop/login1",
            Some("org.freedesktop.login1.Manager"),
            "Inhibit",
            &("sleep", "segue", "playback in progress", "block"),
        )?;
        let fd: OwnedFd = reply.body().deserialize()?;
        Ok(fd)
    }
}

impl Inhibitor for LogindInhibitor {
    fn acquire(&mut self) -> bool {
        if self.fd.is_some() {
            return false;
        }
        match self.inhibit() {
            Ok(fd) => {
                debug!("sleep inhibit acquired");
                self.fd = Some(fd);
                true
            }
            Err(err) => {
                warn!("sleep inhibit unavailable: {err}");
                false
            }
        }
    }

    fn release(&mut self) -> bool {
        match self.fd.take() {
            Some(fd) => {
                drop(fd);
                debug!("sleep inhibit released");
                true
            }
            None => false,
        }
    }

    fn held(&self) -> bool {
        self.fd.is_some()
    }
}

/// Used when no session bus is reachable (containers, CI, non-Linux).
pub struct NoopInhibitor;

impl Inhibitor for NoopInhibitor {
    fn acquire(&mut self) -> bool {
        false
    }

    fn release(&mut self) -> bool {
        false
    }

    fn held(&self) -> bool {
        false
    }
}

/// Best inhibitor available on this system.
pub fn system_inhibitor() -> Box<dyn Inhibitor> {
    match LogindInhibitor::connect() {
        Ok(inhibitor) => Box::new(inhibitor),
        Err(err) => {
            warn!("no sleep inhibitor: {err}");
            Box::new(NoopInhibitor)
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::Inhibitor;

    /// Records acquire/release transitions for assertions.
    #[derive(Default)]
    pub struct MockInhibitor {
        pub held: bool,
        pub transitions: Vec<&'static str>,
    }

    impl Inhibitor for MockInhibitor {
        fn acquire(&mut self) -> bool {
            if self.held {
                return false;
            }
            self.held = true;
            self.transitions.push("acquire");
            true
        }

        fn release(&mut self) -> bool {
            if !self.held {
                return false;
            }
            self.held = false;
            self.transitions.push("release");
            true
        }

        fn held(&self) -> bool {
            self.held
        }
    }
}
