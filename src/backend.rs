//! Audio output backends.
//!
//! Playback goes through the [`AudioBackend`] trait so the engine can fall
//! back from the in-process mixer to an external player when a file cannot
//! be decoded natively. Backends differ in what they can do: the rodio sink
//! pauses and seeks in place, the subprocess player can only be killed and
//! respawned at an offset. The engine papers over the difference with its
//! own position clock.

mod probe;
mod process;
mod sink;
mod types;

#[cfg(test)]
pub mod mock;

pub use probe::{decodable, probe_duration};
pub use process::ProcessBackend;
pub use sink::SinkBackend;
pub use types::{AudioBackend, SeekError};
