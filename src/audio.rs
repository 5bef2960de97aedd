//! Audio cues for timer start and phase completion.

use pomotimer::settings::Settings;
use rodio::source::{SineWave, Source, Zero};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

/// Tone parameters taken from the beep settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beep {
    pub frequency: f32,
    pub duration: Duration,
    pub volume: f32,
}

impl Beep {
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Settings::default();
        let duration = finite_or(settings.beep_duration, defaults.beep_duration);
        let volume = finite_or(settings.beep_volume, defaults.beep_volume);
        Self {
            frequency: settings.beep_frequency.clamp(20, 20_000) as f32,
            duration: Duration::from_secs_f32(duration.clamp(0.05, 5.0)),
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    /// Creates a new audio player.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Plays a single beep when the timer starts.
    pub fn play_start(&self, beep: Beep) {
        if let Err(e) = self.play_tones(&[beep]) {
            warn!("Failed to play start beep: {}", e);
        }
    }

    /// Plays a rising two-tone chime when a phase completes.
    pub fn play_chime(&self, beep: Beep) {
        let second = Beep {
            // A major third above the base tone
            frequency: beep.frequency * 1.26,
            duration: beep.duration + Duration::from_millis(50),
            ..beep
        };
        if let Err(e) = self.play_tones(&[beep, second]) {
            warn!("Failed to play chime: {}", e);
        }
    }

    fn play_tones(&self, tones: &[Beep]) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;

        for (i, tone) in tones.iter().enumerate() {
            if i > 0 {
                let silence =
                    Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(50));
                sink.append(silence);
            }
            let wave = SineWave::new(tone.frequency)
                .take_duration(tone.duration)
                .amplify(tone.volume);
            sink.append(wave);
        }
        sink.detach(); // Play in background

        Ok(())
    }
}
