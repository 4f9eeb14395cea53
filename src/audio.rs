use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("couldn't open sound file: {0}")]
    Open(#[from] std::io::Error),
    #[error("couldn't decode sound file: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// loops the alarm sound on its own thread until told to stop
pub struct AlarmPlayer {
    stop_signal: Arc<AtomicBool>,
}

impl AlarmPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// start ringing `path` from the beginning, replacing any ring already
    /// going. open and decode errors surface here, before any thread spawns.
    pub fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
        // restart semantics, silence the previous ring first
        self.stop();

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))?.repeat_infinite();

        let stop_signal = Arc::new(AtomicBool::new(false));
        self.stop_signal = Arc::clone(&stop_signal);

        maximize_volume();
        thread::spawn(move || {
            let (_stream, stream_handle) = match OutputStream::try_default() {
                Ok(output) => output,
                Err(err) => {
                    log::error!("no audio output device: {err}");
                    return;
                }
            };
            let sink = match Sink::try_new(&stream_handle) {
                Ok(sink) => sink,
                Err(err) => {
                    log::error!("couldn't open audio sink: {err}");
                    return;
                }
            };
            sink.set_volume(1.0);
            sink.append(source);
            sink.play();

            // hold the stream open and keep the volume pinned until stopped,
            // the user lowering it mid-ring defeats the alarm
            while !stop_signal.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(100));
                maximize_volume();
            }
            sink.stop();
        });
        Ok(())
    }

    /// idempotent, raising the flag twice is as good as once
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }
}

impl Default for AlarmPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// force system output volume to 100%
fn maximize_volume() {
    #[cfg(target_os = "macos")]
    let _ = std::process::Command::new("osascript")
        .arg("-e")
        .arg("set volume output volume 100")
        .output();
    #[cfg(target_os = "linux")]
    let _ = std::process::Command::new("amixer")
        .args(["-q", "sset", "Master", "100%", "unmute"])
        .output();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_raises_the_signal() {
        let player = AlarmPlayer::new();
        assert!(!player.stop_signal.load(Ordering::Relaxed));
        player.stop();
        assert!(player.stop_signal.load(Ordering::Relaxed));
    }

    #[test]
    fn playing_a_missing_file_fails_before_any_audio_starts() {
        let mut player = AlarmPlayer::new();
        let result = player.play(Path::new("/definitely/not/here.mp3"));
        assert!(matches!(result, Err(PlayerError::Open(_))));
    }

    #[test]
    fn playing_garbage_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();

        let mut player = AlarmPlayer::new();
        let result = player.play(&path);
        assert!(matches!(result, Err(PlayerError::Decode(_))));
    }
}
