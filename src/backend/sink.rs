//! In-process backend built on a `rodio` sink.
//!
//! This is the preferred route: the sink pauses and resumes in place,
//! reports its own position and seeks without reopening the file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use log::warn;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use super::types::{AudioBackend, SeekError};

pub struct SinkBackend {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl SinkBackend {
    /// Open the default output device. Returns `None` when there is no
    /// usable audio output, in which case only the subprocess backend
    /// remains available.
    pub fn open() -> Option<Self> {
        match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; noisy
                // for a console app that redraws its progress line.
                stream.log_on_drop(false);
                Some(Self { stream, sink: None })
            }
            Err(err) => {
                warn!("no audio output device: {err}");
                None
            }
        }
    }
}

impl AudioBackend for SinkBackend {
    fn try_load(&mut self, path: &Path) -> bool {
        let Ok(file) = File::open(path) else {
            return false;
        };
        let source = match Decoder::new(BufReader::new(file)) {
            Ok(source) => source,
            Err(_) => return false,
        };

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.pause();
        self.sink = Some(sink);
        true
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        let Some(sink) = &self.sink else {
            return Err(SeekError::Failed("no track loaded".to_string()));
        };
        sink.try_seek(pos)
            .map_err(|err| SeekError::Failed(err.to_string()))
    }

    fn position(&self) -> Option<Duration> {
        self.sink.as_ref().map(|sink| sink.get_pos())
    }

    fn is_active(&mut self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn supports_pause(&self) -> bool {
        true
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn name(&self) -> &'static str {
        "rodio"
    }
}
