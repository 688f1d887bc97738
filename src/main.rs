use std::env;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use log::{info, warn};

mod backend;
mod config;
mod convert;
mod engine;
mod fetch;
mod resolver;
mod session;
mod track;
mod ui;
mod wakelock;

use backend::{AudioBackend, ProcessBackend, SinkBackend};
use config::Settings;
use convert::{FfmpegTranscoder, FormatAdapter};
use engine::PlaybackEngine;
use fetch::{Downloader, YtDlpClient};
use resolver::{Resolver, YtDlpResolver};
use session::{SessionFlags, Streamer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Some(url) = env::args().nth(1) else {
        eprintln!("usage: segue <playlist-or-track-url>");
        std::process::exit(2);
    };

    let settings = Settings::load()?;
    settings.validate()?;

    // Transcoding requires a configured ffmpeg and a non-mobile host;
    // otherwise the downloader sticks to formats the backends play directly.
    let transcoder = match (&settings.paths.ffmpeg, settings.environment.mobile) {
        (Some(bin), false) => Some(Box::new(FfmpegTranscoder::new(
            bin,
            settings.download.transcode_bitrate_kbps,
        )) as Box<dyn convert::Transcoder>),
        _ => None,
    };
    let adapter = FormatAdapter::new(transcoder);

    let downloader = Arc::new(Downloader::new(
        Box::new(YtDlpClient::new(&settings.paths.ytdlp)),
        settings.paths.temp_dir.clone(),
        adapter.can_transcode(),
    ));

    let mut backends: Vec<Box<dyn AudioBackend>> = Vec::new();
    if let Some(sink) = SinkBackend::open() {
        backends.push(Box::new(sink));
    }
    backends.push(Box::new(ProcessBackend::new(&settings.paths.player)));

    let engine = PlaybackEngine::new(
        backends,
        wakelock::system_inhibitor(),
        settings.playback.fallback_duration(),
        settings.playback.end_grace(),
    );

    let flags = SessionFlags::new();
    spawn_control_threads(flags.clone());

    println!("resolving {url}");
    let tracks = YtDlpResolver::new(&settings.paths.ytdlp).resolve(&url)?;
    info!("{} tracks resolved", tracks.len());
    println!(
        "{} track(s) queued  [p] pause  [n] next  [f]/[b] seek 10s  [q] quit",
        tracks.len()
    );

    let mut streamer = Streamer::new(settings, engine, downloader, adapter, flags);
    streamer.run(tracks)?;
    Ok(())
}

/// Ctrl-C stops the session; single-letter stdin commands drive it.
fn spawn_control_threads(flags: Arc<SessionFlags>) {
    let ctrlc_flags = flags.clone();
    if let Err(err) = ctrlc::set_handler(move || ctrlc_flags.request_stop()) {
        warn!("no Ctrl-C handler: {err}");
    }

    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "p" | "pause" => flags.toggle_pause(),
                "n" | "next" | "s" | "skip" => flags.request_skip(),
                "f" | "fwd" => flags.request_seek_by(10),
                "b" | "back" => flags.request_seek_by(-10),
                "q" | "quit" | "stop" => {
                    flags.request_stop();
                    break;
                }
                "" => {}
                other => eprintln!("unknown command: {other}"),
            }
        }
    });
}
