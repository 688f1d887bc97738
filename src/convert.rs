//! Format adapter: the one place that decides whether a downloaded file can
//! be handed to a backend as-is or must be transcoded first.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use thiserror::Error;

use crate::backend::decodable;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no transcoder available for {0:?}")]
    Unsupported(PathBuf),
    #[error("failed to run transcoder: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("transcoder failed: {0}")]
    Failed(String),
    #[error("transcoder succeeded but wrote nothing")]
    NoOutput,
}

pub trait Transcoder: Send + Sync {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// ffmpeg-based mp3 re-encode.
pub struct FfmpegTranscoder {
    bin: String,
    bitrate_kbps: u32,
}

impl FfmpegTranscoder {
    pub fn new(bin: &str, bitrate_kbps: u32) -> Self {
        Self {
            bin: bin.to_string(),
            bitrate_kbps,
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let bitrate = format!("{}k", self.bitrate_kbps);
        let result = Command::new(&self.bin)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-codec:a")
            .arg("libmp3lame")
            .arg("-b:a")
            .arg(&bitrate)
            .arg(output)
            .output()?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConvertError::Failed(stderr.trim().to_string()));
        }
        if !output.is_file() {
            return Err(ConvertError::NoOutput);
        }
        Ok(())
    }
}

pub struct FormatAdapter {
    transcoder: Option<Box<dyn Transcoder>>,
    probe: fn(&Path) -> bool,
}

impl FormatAdapter {
    pub fn new(transcoder: Option<Box<dyn Transcoder>>) -> Self {
        Self {
            transcoder,
            probe: decodable,
        }
    }

    /// Adapter with a custom playability probe instead of trial decoding.
    #[cfg(test)]
    pub fn with_probe(transcoder: Option<Box<dyn Transcoder>>, probe: fn(&Path) -> bool) -> Self {
        Self { transcoder, probe }
    }

    pub fn can_transcode(&self) -> bool {
        self.transcoder.is_some()
    }

    /// Whether a backend can take this file directly.
    pub fn is_playable(&self, path: &Path) -> bool {
        (self.probe)(path)
    }

    /// Hand back a playable path for `path`: the file itself when a backend
    /// takes it, otherwise an mp3 transcode next to it. On successful
    /// conversion the original is deleted so only one copy of a track ever
    /// sits in the temp directory.
    pub fn ensure_playable(&self, path: &Path) -> Result<PathBuf, ConvertError> {
        if self.is_playable(path) {
            debug!("{:?} is directly playable", path);
            return Ok(path.to_path_buf());
        }

        let Some(transcoder) = &self.transcoder else {
            return Err(ConvertError::Unsupported(path.to_path_buf()));
        };

        let output = path.with_extension("mp3");
        if output == path {
            // Already an mp3 that still won't decode; re-encoding the same
            // bytes will not help.
            return Err(ConvertError::Unsupported(path.to_path_buf()));
        }

        info!("transcoding {:?}", path);
        transcoder.transcode(path, &output)?;
        let _ = fs::remove_file(path);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use super::{ConvertError, FormatAdapter, Transcoder};

    struct FakeTranscoder {
        succeed: bool,
        calls: Mutex<u32>,
    }

    impl Transcoder for FakeTranscoder {
        fn transcode(&self, _input: &Path, output: &Path) -> Result<(), ConvertError> {
            *self.calls.lock().unwrap() += 1;
            if self.succeed {
                fs::write(output, b"transcoded").unwrap();
                Ok(())
            } else {
                Err(ConvertError::Failed("bad stream".to_string()))
            }
        }
    }

    #[test]
    fn unsupported_without_transcoder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.webm");
        fs::write(&input, b"opus-ish bytes").unwrap();

        let adapter = FormatAdapter::new(None);
        assert!(!adapter.can_transcode());
        let err = adapter.ensure_playable(&input).unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported(_)));
        // The original stays for the caller to dispose of.
        assert!(input.is_file());
    }

    #[test]
    fn transcode_replaces_original() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.webm");
        fs::write(&input, b"opus-ish bytes").unwrap();

        let adapter = FormatAdapter::new(Some(Box::new(FakeTranscoder {
            succeed: true,
            calls: Mutex::new(0),
        })));
        let out = adapter.ensure_playable(&input).unwrap();
        assert_eq!(out, dir.path().join("t.mp3"));
        assert!(out.is_file());
        assert!(!input.exists());
    }

    #[test]
    fn failed_transcode_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.webm");
        fs::write(&input, b"opus-ish bytes").unwrap();

        let adapter = FormatAdapter::new(Some(Box::new(FakeTranscoder {
            succeed: false,
            calls: Mutex::new(0),
        })));
        assert!(adapter.ensure_playable(&input).is_err());
        assert!(input.is_file());
    }

    #[test]
    fn undecodable_mp3_is_not_retranscoded() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.mp3");
        fs::write(&input, b"not really mp3").unwrap();

        let transcoder = FakeTranscoder {
            succeed: true,
            calls: Mutex::new(0),
        };
        let adapter = FormatAdapter::new(Some(Box::new(transcoder)));
        let err = adapter.ensure_playable(&input).unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported(_)));
    }
}
