//! Speech capture for spoken answers.
//!
//! The platform recognizer is abstracted behind [`SpeechRecognizer`], which
//! pushes raw [`RecognizerEvent`]s into a channel. [`VoiceCapture`] turns that
//! event stream into a single awaited result per listen attempt.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::number_parser::{
    get_confidence, parse_spoken_number, preprocess_transcript, validate_parse_result,
};
use crate::settings::GameSettings;

/// Hard limit on a single listen attempt.
pub const LISTEN_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoiceError {
    #[error("Network error - please check your internet connection")]
    Network,
    #[error("Microphone access denied - please allow microphone permissions")]
    PermissionDenied,
    #[error("No speech detected - please try speaking louder")]
    NoSpeech,
    #[error("Microphone not found - please check your microphone")]
    NoMicrophone,
    #[error("Speech service not available - please try again later")]
    ServiceUnavailable,
    #[error("Speech recognition error: {0}")]
    Other(String),
    #[error("Speech recognition not supported")]
    Unsupported,
    #[error("Already listening")]
    AlreadyListening,
    #[error("Speech recognition timeout")]
    Timeout,
    #[error("Speech recognition ended without result")]
    EndedWithoutResult,
    #[error("Could not understand \"{0}\"")]
    Unintelligible(String),
}

impl VoiceError {
    /// Map a platform error code onto the error taxonomy.
    pub fn from_code(code: &str) -> Self {
        match code {
            "network" => VoiceError::Network,
            "not-allowed" => VoiceError::PermissionDenied,
            "no-speech" => VoiceError::NoSpeech,
            "audio-capture" => VoiceError::NoMicrophone,
            "service-not-allowed" => VoiceError::ServiceUnavailable,
            other => VoiceError::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRecognitionResult {
    pub transcript: String,
    pub confidence: f32,
    pub is_final: bool,
}

/// Raw notifications from the platform recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Started,
    Result(VoiceRecognitionResult),
    Error(String),
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
    pub confidence_threshold: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl From<&GameSettings> for RecognizerConfig {
    fn from(settings: &GameSettings) -> Self {
        Self {
            language: settings.voice_language.clone(),
            confidence_threshold: settings.voice_confidence_threshold,
            ..Self::default()
        }
    }
}

/// Platform speech-recognition capability.
pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool;

    /// Begin one recognition pass, reporting through `events` until `End`.
    fn start(
        &mut self,
        config: &RecognizerConfig,
        events: UnboundedSender<RecognizerEvent>,
    ) -> Result<(), VoiceError>;

    fn stop(&mut self);

    /// Drop every event sink handed out by `start`.
    fn detach(&mut self) {}
}

/// A spoken answer that made it through preprocessing, parsing and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedNumber {
    pub value: i64,
    pub transcript: String,
    pub speech_confidence: f32,
    pub parse_confidence: f64,
}

/// Preprocess, parse and validate one recognizer result.
pub fn interpret(result: &VoiceRecognitionResult) -> Option<RecognizedNumber> {
    let preprocessed = preprocess_transcript(&result.transcript);
    let parsed = parse_spoken_number(&preprocessed);
    if !validate_parse_result(&preprocessed, parsed) {
        return None;
    }
    let value = parsed?;
    let parse_confidence = get_confidence(&preprocessed);

    info!(
        transcript = %result.transcript,
        preprocessed = %preprocessed,
        value,
        speech_confidence = result.confidence,
        parse_confidence,
        "voice answer recognized"
    );
    Some(RecognizedNumber {
        value,
        transcript: result.transcript.clone(),
        speech_confidence: result.confidence,
        parse_confidence,
    })
}

/// Stops a recognizer that is still running when the listen future goes away.
struct ListenGuard<'a, R: SpeechRecognizer>(&'a VoiceCapture<R>);

impl<R: SpeechRecognizer> Drop for ListenGuard<'_, R> {
    fn drop(&mut self) {
        self.0.stop_listening();
    }
}

pub struct VoiceCapture<R: SpeechRecognizer> {
    recognizer: Mutex<R>,
    config: RecognizerConfig,
    listening: AtomicBool,
}

impl<R: SpeechRecognizer> VoiceCapture<R> {
    pub fn new(recognizer: R, config: RecognizerConfig) -> Self {
        Self {
            recognizer: Mutex::new(recognizer),
            config,
            listening: AtomicBool::new(false),
        }
    }

    fn recognizer(&self) -> MutexGuard<'_, R> {
        self.recognizer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer().is_supported()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: RecognizerConfig) {
        self.config = config;
    }

    /// Resolves on the first final result at or above the confidence threshold.
    pub async fn start_listening(&self) -> Result<VoiceRecognitionResult, VoiceError> {
        if !self.is_supported() {
            return Err(VoiceError::Unsupported);
        }
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyListening);
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Err(e) = self.recognizer().start(&self.config, tx) {
            self.listening.store(false, Ordering::SeqCst);
            return Err(e);
        }
        let _guard = ListenGuard(self);

        let threshold = self.config.confidence_threshold;
        let wait_for_result = async {
            while let Some(event) = rx.recv().await {
                match event {
                    RecognizerEvent::Started => debug!("voice recognition started"),
                    RecognizerEvent::Result(result) => {
                        debug!(
                            transcript = %result.transcript,
                            confidence = result.confidence,
                            is_final = result.is_final,
                            "voice recognition result"
                        );
                        if result.is_final && result.confidence >= threshold {
                            return Ok(result);
                        }
                    }
                    RecognizerEvent::Error(code) => {
                        let err = VoiceError::from_code(&code);
                        warn!(%code, error = %err, "voice recognition error");
                        return Err(err);
                    }
                    RecognizerEvent::End => break,
                }
            }
            Err(VoiceError::EndedWithoutResult)
        };

        match tokio::time::timeout(LISTEN_TIMEOUT, wait_for_result).await {
            // the recognizer has finished on its own
            Ok(outcome) => {
                self.listening.store(false, Ordering::SeqCst);
                outcome
            }
            Err(_) => Err(VoiceError::Timeout),
        }
    }

    /// Listen once and interpret the transcript as a number.
    pub async fn listen_for_number(&self) -> Result<RecognizedNumber, VoiceError> {
        let result = self.start_listening().await?;
        interpret(&result).ok_or(VoiceError::Unintelligible(result.transcript))
    }

    pub fn stop_listening(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            self.recognizer().stop();
        }
    }

    pub fn cleanup(&self) {
        self.stop_listening();
        self.recognizer().detach();
    }
}

impl<R: SpeechRecognizer> Drop for VoiceCapture<R> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Recognizer for platforms without speech input.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(
        &mut self,
        _config: &RecognizerConfig,
        _events: UnboundedSender<RecognizerEvent>,
    ) -> Result<(), VoiceError> {
        Err(VoiceError::Unsupported)
    }

    fn stop(&mut self) {}
}

/// What a [`ScriptedRecognizer`] does on one `start` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedAttempt {
    Hear { transcript: String, confidence: f32 },
    Fail(String),
    /// Starts and then never reports anything.
    Silence,
    EndQuietly,
}

#[derive(Debug, Default)]
struct ScriptState {
    unsupported: bool,
    attempts: VecDeque<ScriptedAttempt>,
    pending: Option<UnboundedSender<RecognizerEvent>>,
    starts: usize,
    stops: usize,
}

/// Recognizer that replays a fixed list of attempts. Clones share the script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecognizer {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        let recognizer = Self::default();
        recognizer.state().unsupported = true;
        recognizer
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn then(self, attempt: ScriptedAttempt) -> Self {
        self.state().attempts.push_back(attempt);
        self
    }

    pub fn then_hear(self, transcript: &str, confidence: f32) -> Self {
        self.then(ScriptedAttempt::Hear {
            transcript: transcript.to_string(),
            confidence,
        })
    }

    pub fn then_fail(self, code: &str) -> Self {
        self.then(ScriptedAttempt::Fail(code.to_string()))
    }

    pub fn then_silence(self) -> Self {
        self.then(ScriptedAttempt::Silence)
    }

    pub fn starts(&self) -> usize {
        self.state().starts
    }

    pub fn stops(&self) -> usize {
        self.state().stops
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        !self.state().unsupported
    }

    fn start(
        &mut self,
        _config: &RecognizerConfig,
        events: UnboundedSender<RecognizerEvent>,
    ) -> Result<(), VoiceError> {
        let mut state = self.state();
        state.starts += 1;
        let attempt = state
            .attempts
            .pop_front()
            .unwrap_or(ScriptedAttempt::EndQuietly);

        // send errors mean the listener is gone already
        let _ = events.send(RecognizerEvent::Started);
        match attempt {
            ScriptedAttempt::Hear {
                transcript,
                confidence,
            } => {
                let _ = events.send(RecognizerEvent::Result(VoiceRecognitionResult {
                    transcript,
                    confidence,
                    is_final: true,
                }));
                let _ = events.send(RecognizerEvent::End);
            }
            ScriptedAttempt::Fail(code) => {
                let _ = events.send(RecognizerEvent::Error(code));
            }
            ScriptedAttempt::Silence => state.pending = Some(events),
            ScriptedAttempt::EndQuietly => {
                let _ = events.send(RecognizerEvent::End);
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state();
        state.stops += 1;
        if let Some(events) = state.pending.take() {
            let _ = events.send(RecognizerEvent::End);
        }
    }

    fn detach(&mut self) {
        self.state().pending = None;
    }
}
