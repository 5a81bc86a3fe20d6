use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MIN_SEQUENCE_LENGTH: usize = 3;
pub const MAX_SEQUENCE_LENGTH: usize = 50;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("digit count must be between 2 and 5, got {0}")]
    InvalidDigitCount(u8),
    #[error("sequence length must be between 3 and 50, got {0}")]
    InvalidSequenceLength(usize),
    #[error("time on screen must be positive")]
    ZeroTimeOnScreen,
    #[error("speech rate must be positive, got {0}")]
    InvalidSpeechRate(f32),
    #[error("voice confidence threshold must be within 0..=1, got {0}")]
    InvalidConfidenceThreshold(f32),
}

/// Number of digits in every generated term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DigitCount {
    Two,
    Three,
    Four,
    Five,
}

impl DigitCount {
    pub fn digits(self) -> u8 {
        match self {
            DigitCount::Two => 2,
            DigitCount::Three => 3,
            DigitCount::Four => 4,
            DigitCount::Five => 5,
        }
    }

    /// Inclusive range a term with this many digits is drawn from.
    pub fn range(self) -> RangeInclusive<i64> {
        match self {
            DigitCount::Two => 10..=99,
            DigitCount::Three => 100..=999,
            DigitCount::Four => 1000..=9999,
            DigitCount::Five => 10000..=99999,
        }
    }
}

impl TryFrom<u8> for DigitCount {
    type Error = SettingsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(DigitCount::Two),
            3 => Ok(DigitCount::Three),
            4 => Ok(DigitCount::Four),
            5 => Ok(DigitCount::Five),
            other => Err(SettingsError::InvalidDigitCount(other)),
        }
    }
}

impl From<DigitCount> for u8 {
    fn from(dc: DigitCount) -> Self {
        dc.digits()
    }
}

/// Per-session configuration. Field names follow the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub digit_count: DigitCount,
    pub sequence_length: usize,
    /// Milliseconds each term stays on screen.
    pub time_on_screen: u64,
    /// Milliseconds of blank display between two terms.
    pub time_between: u64,
    pub sound_enabled: bool,
    pub haptic_enabled: bool,
    /// Narrate every term with text-to-speech.
    pub voice_enabled: bool,
    pub speech_rate: f32,
    #[serde(rename = "voiceURI")]
    pub voice_uri: String,
    pub voice_recognition_enabled: bool,
    pub voice_confidence_threshold: f32,
    pub voice_language: String,
    pub voice_auto_start: bool,
    /// Hide the visual term while narration is on.
    pub audio_only_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            digit_count: DigitCount::Two,
            sequence_length: 5,
            time_on_screen: 1000,
            time_between: 300,
            sound_enabled: true,
            haptic_enabled: true,
            voice_enabled: false,
            speech_rate: 1.0,
            voice_uri: String::new(),
            voice_recognition_enabled: false,
            voice_confidence_threshold: 0.7,
            voice_language: "en-US".to_string(),
            voice_auto_start: true,
            audio_only_mode: false,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&self.sequence_length) {
            return Err(SettingsError::InvalidSequenceLength(self.sequence_length));
        }
        if self.time_on_screen == 0 {
            return Err(SettingsError::ZeroTimeOnScreen);
        }
        if self.speech_rate.is_nan() || self.speech_rate <= 0.0 {
            return Err(SettingsError::InvalidSpeechRate(self.speech_rate));
        }
        if !(0.0..=1.0).contains(&self.voice_confidence_threshold) {
            return Err(SettingsError::InvalidConfidenceThreshold(
                self.voice_confidence_threshold,
            ));
        }
        Ok(())
    }

    /// The visual term is suppressed only when narration actually carries it.
    pub fn hides_terms(&self) -> bool {
        self.audio_only_mode && self.voice_enabled
    }
}
