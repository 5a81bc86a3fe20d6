//! Side effects requested by a game session.
//!
//! Everything here is fire-and-forget except [`Presenter::speak`], whose
//! completion the playback loop waits on.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayContent {
    Message(String),
    Term {
        value: i64,
        position: usize,
        total: usize,
    },
    /// A term is being narrated but not shown.
    HiddenTerm { position: usize, total: usize },
    Blank,
    Answer { answer: String },
    Listening { attempt: u8, max_attempts: u8 },
    Recognized(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Number,
    Keypress,
    Clear,
    Correct,
    Incorrect,
}

impl SoundKind {
    /// Tone frequency (Hz) and length (ms).
    pub fn tone(self) -> (u32, u32) {
        match self {
            SoundKind::Number => (800, 100),
            SoundKind::Keypress => (600, 50),
            SoundKind::Clear => (400, 100),
            SoundKind::Correct => (1000, 300),
            SoundKind::Incorrect => (300, 500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticIntensity {
    Light,
    Medium,
    Success,
    Error,
}

impl HapticIntensity {
    /// Vibration pattern in milliseconds, alternating on/off.
    pub fn pattern(self) -> &'static [u32] {
        match self {
            HapticIntensity::Light => &[10],
            HapticIntensity::Medium => &[20],
            HapticIntensity::Success => &[10, 50, 10],
            HapticIntensity::Error => &[100, 50, 100],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    #[error("speech synthesis unavailable")]
    Unavailable,
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

#[async_trait]
pub trait Presenter: Send {
    fn display(&mut self, content: DisplayContent);

    fn play_sound(&mut self, kind: SoundKind);

    fn trigger_haptic(&mut self, intensity: HapticIntensity);

    /// Redraw the current content, e.g. after a terminal resize.
    fn refresh(&mut self) {}

    /// Narrate `value`; resolves when the utterance has finished.
    async fn speak(&mut self, value: i64, rate: f32, voice_uri: &str) -> Result<(), SpeechError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Display(DisplayContent),
    Sound(SoundKind),
    Haptic(HapticIntensity),
    Refresh,
    Speak { value: i64, rate: f32 },
}

/// Presenter that records every request with the (tokio) time it was made.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<(Instant, PresenterCall)>,
    speech_duration: Duration,
    speech_error: Option<SpeechError>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every utterance takes `duration` before it completes.
    pub fn with_speech_duration(mut self, duration: Duration) -> Self {
        self.speech_duration = duration;
        self
    }

    pub fn with_failing_speech(mut self, error: SpeechError) -> Self {
        self.speech_error = Some(error);
        self
    }

    fn record(&mut self, call: PresenterCall) {
        self.calls.push((Instant::now(), call));
    }

    pub fn displays(&self) -> Vec<&DisplayContent> {
        self.calls
            .iter()
            .filter_map(|(_, call)| match call {
                PresenterCall::Display(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn shown_terms(&self) -> Vec<i64> {
        self.displays()
            .into_iter()
            .filter_map(|content| match content {
                DisplayContent::Term { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn sounds(&self) -> Vec<SoundKind> {
        self.calls
            .iter()
            .filter_map(|(_, call)| match call {
                PresenterCall::Sound(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn refreshes(&self) -> usize {
        self.calls
            .iter()
            .filter(|(_, call)| *call == PresenterCall::Refresh)
            .count()
    }

    pub fn haptics(&self) -> Vec<HapticIntensity> {
        self.calls
            .iter()
            .filter_map(|(_, call)| match call {
                PresenterCall::Haptic(intensity) => Some(*intensity),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    fn display(&mut self, content: DisplayContent) {
        self.record(PresenterCall::Display(content));
    }

    fn play_sound(&mut self, kind: SoundKind) {
        self.record(PresenterCall::Sound(kind));
    }

    fn trigger_haptic(&mut self, intensity: HapticIntensity) {
        self.record(PresenterCall::Haptic(intensity));
    }

    fn refresh(&mut self) {
        self.record(PresenterCall::Refresh);
    }

    async fn speak(&mut self, value: i64, rate: f32, _voice_uri: &str) -> Result<(), SpeechError> {
        self.record(PresenterCall::Speak { value, rate });
        if let Some(err) = self.speech_error.clone() {
            return Err(err);
        }
        tokio::time::sleep(self.speech_duration).await;
        Ok(())
    }
}
