//! Drives one session from "Get Ready" to a scored [`GameResult`].
//!
//! A session runs as a single future: fixed display timers, narration,
//! voice capture and keypad events are all awaited in turn on one task.
//! Every wait is tied to the session's epoch; bumping the epoch (a new
//! session, or [`CancelHandle::cancel`]) makes all pending waits of the old
//! session resolve to [`GameError::Cancelled`] before they can touch state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc::UnboundedReceiver, watch};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::presentation::{DisplayContent, HapticIntensity, Presenter, SoundKind};
use crate::runtime::GameEvent;
use crate::sequence::generate_sequence;
use crate::session::{GameResult, GameSession, RetryDecision, SessionState, VoiceRetry};
use crate::settings::{GameSettings, SettingsError};
use crate::voice::{RecognizerConfig, SpeechRecognizer, VoiceCapture};

pub const GET_READY_MESSAGE: &str = "Get Ready...";
pub const GET_READY_MS: u64 = 1500;
pub const GET_READY_PAUSE_MS: u64 = 500;
pub const ENTER_SUM_MESSAGE: &str = "Enter the sum:";
/// How long a recognized voice answer is shown before it is scored.
pub const VOICE_SUBMIT_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("session was cancelled")]
    Cancelled,
    #[error("input closed before an answer was submitted")]
    InputClosed,
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Cancels whatever session is currently running on the owning [`Game`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    epoch: Arc<watch::Sender<u64>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.epoch.send_modify(|epoch| *epoch += 1);
    }
}

struct SessionToken {
    epoch: u64,
    rx: watch::Receiver<u64>,
}

impl SessionToken {
    async fn superseded(&mut self) {
        while *self.rx.borrow_and_update() == self.epoch {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Run `fut` unless the session is superseded first.
    async fn guard<F: Future>(&mut self, fut: F) -> Result<F::Output, GameError> {
        tokio::select! {
            biased;
            _ = self.superseded() => Err(GameError::Cancelled),
            out = fut => Ok(out),
        }
    }

    async fn wait(&mut self, ms: u64) -> Result<(), GameError> {
        self.guard(sleep(Duration::from_millis(ms))).await
    }
}

enum ListenOutcome<T> {
    Heard(T),
    Manual(Option<GameEvent>),
}

pub struct Game<P: Presenter, R: SpeechRecognizer> {
    settings: GameSettings,
    presenter: P,
    voice: Option<VoiceCapture<R>>,
    session: GameSession,
    epoch: Arc<watch::Sender<u64>>,
}

impl<P: Presenter, R: SpeechRecognizer> std::fmt::Debug for Game<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<P: Presenter, R: SpeechRecognizer> Game<P, R> {
    pub fn new(
        settings: GameSettings,
        presenter: P,
        voice: Option<VoiceCapture<R>>,
    ) -> Result<Self, GameError> {
        settings.validate()?;
        let (epoch, _) = watch::channel(0);
        Ok(Self {
            settings,
            presenter,
            voice,
            session: GameSession::new(),
            epoch: Arc::new(epoch),
        })
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            epoch: Arc::clone(&self.epoch),
        }
    }

    /// Settings for the next session; the voice adapter follows along.
    pub fn update_settings(&mut self, settings: GameSettings) -> Result<(), GameError> {
        settings.validate()?;
        if let Some(voice) = self.voice.as_mut() {
            voice.update_config(RecognizerConfig::from(&settings));
        }
        self.settings = settings;
        Ok(())
    }

    /// Abandon any running session and return to idle.
    pub fn reset(&mut self) {
        self.epoch.send_modify(|epoch| *epoch += 1);
        if let Some(voice) = &self.voice {
            voice.stop_listening();
        }
        self.session = GameSession::new();
    }

    fn next_token(&mut self) -> SessionToken {
        self.epoch.send_modify(|epoch| *epoch += 1);
        let rx = self.epoch.subscribe();
        let epoch = *rx.borrow();
        SessionToken { epoch, rx }
    }

    fn voice_input_ready(&self) -> bool {
        self.settings.voice_recognition_enabled
            && self.settings.voice_auto_start
            && self.voice.as_ref().is_some_and(|v| v.is_supported())
    }

    fn sound(&mut self, kind: SoundKind) {
        if self.settings.sound_enabled {
            self.presenter.play_sound(kind);
        }
    }

    fn haptic(&mut self, intensity: HapticIntensity) {
        if self.settings.haptic_enabled {
            self.presenter.trigger_haptic(intensity);
        }
    }

    fn show_answer(&mut self) {
        let answer = self.session.user_answer.clone();
        self.presenter.display(DisplayContent::Answer { answer });
    }

    /// Play a freshly generated sequence and collect the answer.
    pub async fn play(
        &mut self,
        events: &mut UnboundedReceiver<GameEvent>,
    ) -> Result<GameResult, GameError> {
        let sequence = generate_sequence(self.settings.digit_count, self.settings.sequence_length);
        self.play_sequence(sequence, events).await
    }

    #[instrument(level = "info", skip_all, fields(terms = sequence.len()))]
    pub async fn play_sequence(
        &mut self,
        sequence: Vec<i64>,
        events: &mut UnboundedReceiver<GameEvent>,
    ) -> Result<GameResult, GameError> {
        let mut token = self.next_token();
        self.session.begin(sequence, Instant::now());
        info!(sum = self.session.correct_sum, "session started");

        let outcome = self.run(&mut token, events).await;
        match &outcome {
            Ok(result) => info!(
                correct = result.is_correct,
                score = result.score,
                response_ms = result.response_time,
                "session finished"
            ),
            Err(e) => {
                info!(error = %e, "session abandoned");
                if let Some(voice) = &self.voice {
                    voice.stop_listening();
                }
                self.session = GameSession::new();
            }
        }
        outcome
    }

    async fn run(
        &mut self,
        token: &mut SessionToken,
        events: &mut UnboundedReceiver<GameEvent>,
    ) -> Result<GameResult, GameError> {
        self.presenter
            .display(DisplayContent::Message(GET_READY_MESSAGE.to_string()));
        token.wait(GET_READY_MS).await?;
        token.wait(GET_READY_PAUSE_MS).await?;

        self.present_terms(token).await?;

        // keys pressed during playback are not part of the answer
        while let Ok(ev) = events.try_recv() {
            if ev == GameEvent::Quit {
                return Err(GameError::Cancelled);
            }
        }

        let voice = self.voice_input_ready();
        self.session.begin_input(Instant::now(), voice);
        debug!(voice, "answer acquisition started");
        if !voice {
            self.presenter
                .display(DisplayContent::Message(ENTER_SUM_MESSAGE.to_string()));
            self.show_answer();
        }

        let mut retry = VoiceRetry::default();
        loop {
            match self.session.state {
                SessionState::Input => {
                    let event = token.guard(events.recv()).await?;
                    match event {
                        Some(GameEvent::Quit) => return Err(GameError::Cancelled),
                        Some(GameEvent::Resize) => self.presenter.refresh(),
                        Some(ev) => {
                            if let Some(result) = self.apply_keypad(ev) {
                                return Ok(result);
                            }
                        }
                        None => return Err(GameError::InputClosed),
                    }
                }
                SessionState::VoiceListening => {
                    if let Some(result) = self.listen(token, events, &mut retry).await? {
                        return Ok(result);
                    }
                }
                SessionState::VoiceProcessing => {
                    let value = self.session.user_answer.parse::<i64>().unwrap_or_default();
                    self.presenter.display(DisplayContent::Recognized(value));
                    token.wait(VOICE_SUBMIT_DELAY_MS).await?;
                    if let Some(result) = self.submit() {
                        return Ok(result);
                    }
                }
                SessionState::Idle | SessionState::Playing | SessionState::Finished => {
                    return Err(GameError::Cancelled);
                }
            }
        }
    }

    #[instrument(level = "debug", skip_all)]
    async fn present_terms(&mut self, token: &mut SessionToken) -> Result<(), GameError> {
        let sequence = self.session.current_sequence.clone();
        let total = sequence.len();
        let on_screen = Duration::from_millis(self.settings.time_on_screen);
        let rate = self.settings.speech_rate;
        let voice_uri = self.settings.voice_uri.clone();

        for (index, &value) in sequence.iter().enumerate() {
            self.session.current_index = index;
            let position = index + 1;
            self.sound(SoundKind::Number);
            self.haptic(HapticIntensity::Light);

            let content = if self.settings.hides_terms() {
                DisplayContent::HiddenTerm { position, total }
            } else {
                DisplayContent::Term {
                    value,
                    position,
                    total,
                }
            };
            self.presenter.display(content);
            debug!(position, total, value, "term shown");

            if self.settings.voice_enabled {
                let presenter = &mut self.presenter;
                let (spoken, ()) = token
                    .guard(async {
                        tokio::join!(presenter.speak(value, rate, &voice_uri), sleep(on_screen))
                    })
                    .await?;
                if let Err(e) = spoken {
                    warn!(error = %e, value, "narration failed, continuing on the display timer");
                }
            } else {
                token.guard(sleep(on_screen)).await?;
            }

            if position < total {
                self.presenter.display(DisplayContent::Blank);
                token.wait(self.settings.time_between).await?;
            }
        }

        self.presenter.display(DisplayContent::Blank);
        Ok(())
    }

    /// One listen attempt. Failures consume the retry budget; a keypad event
    /// interrupts listening and switches to manual entry. Resizes only redraw.
    async fn listen(
        &mut self,
        token: &mut SessionToken,
        events: &mut UnboundedReceiver<GameEvent>,
        retry: &mut VoiceRetry,
    ) -> Result<Option<GameResult>, GameError> {
        let Some(voice) = self.voice.as_ref() else {
            self.session.fall_back_to_keypad();
            self.show_answer();
            return Ok(None);
        };

        self.presenter.display(DisplayContent::Listening {
            attempt: retry.attempt(),
            max_attempts: retry.max_attempts(),
        });

        let presenter = &mut self.presenter;
        let outcome = token
            .guard(async {
                let heard = voice.listen_for_number();
                tokio::pin!(heard);
                loop {
                    tokio::select! {
                        result = &mut heard => break ListenOutcome::Heard(result),
                        ev = events.recv() => match ev {
                            Some(GameEvent::Resize) => presenter.refresh(),
                            other => break ListenOutcome::Manual(other),
                        },
                    }
                }
            })
            .await?;

        match outcome {
            ListenOutcome::Heard(Ok(number)) => {
                self.session.voice_recognized(number.value);
            }
            ListenOutcome::Heard(Err(e)) => match retry.record_failure() {
                RetryDecision::Retry { attempt } => {
                    warn!(error = %e, attempt, "voice attempt failed, retrying");
                }
                RetryDecision::FallBack => {
                    warn!(error = %e, "voice attempts exhausted, switching to keypad");
                    self.session.fall_back_to_keypad();
                    self.show_answer();
                }
            },
            ListenOutcome::Manual(Some(GameEvent::Quit)) => return Err(GameError::Cancelled),
            ListenOutcome::Manual(Some(ev)) => {
                debug!(?ev, "keypad used while listening");
                self.session.fall_back_to_keypad();
                self.show_answer();
                return Ok(self.apply_keypad(ev));
            }
            ListenOutcome::Manual(None) => return Err(GameError::InputClosed),
        }
        Ok(None)
    }

    /// Apply a keypad event in the input state; returns the result on a
    /// successful submit.
    fn apply_keypad(&mut self, event: GameEvent) -> Option<GameResult> {
        match event {
            GameEvent::Digit(c) => {
                if self.session.push_digit(c) {
                    self.sound(SoundKind::Keypress);
                    self.haptic(HapticIntensity::Light);
                    self.show_answer();
                }
                None
            }
            GameEvent::Clear => {
                if self.session.clear_answer() {
                    self.sound(SoundKind::Clear);
                    self.haptic(HapticIntensity::Medium);
                    self.show_answer();
                }
                None
            }
            GameEvent::Submit => self.submit(),
            GameEvent::Quit | GameEvent::Resize => None,
        }
    }

    fn submit(&mut self) -> Option<GameResult> {
        let result = self.session.submit(Instant::now(), &self.settings)?;
        if result.is_correct {
            self.sound(SoundKind::Correct);
            self.haptic(HapticIntensity::Success);
        } else {
            self.sound(SoundKind::Incorrect);
            self.haptic(HapticIntensity::Error);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresenterCall, RecordingPresenter, SpeechError};
    use crate::voice::{RecognizerConfig, ScriptedRecognizer, UnsupportedRecognizer};
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    fn fast_settings() -> GameSettings {
        GameSettings {
            sequence_length: 3,
            time_on_screen: 1000,
            time_between: 300,
            ..GameSettings::default()
        }
    }

    fn keyboard_game(settings: GameSettings) -> Game<RecordingPresenter, UnsupportedRecognizer> {
        Game::new(settings, RecordingPresenter::new(), None).unwrap()
    }

    fn voice_game(
        recognizer: ScriptedRecognizer,
    ) -> Game<RecordingPresenter, ScriptedRecognizer> {
        let settings = GameSettings {
            voice_recognition_enabled: true,
            ..fast_settings()
        };
        let voice = VoiceCapture::new(recognizer, RecognizerConfig::from(&settings));
        Game::new(settings, RecordingPresenter::new(), Some(voice)).unwrap()
    }

    #[test]
    fn invalid_settings_fail_construction() {
        let settings = GameSettings {
            sequence_length: 1,
            ..GameSettings::default()
        };
        let game = Game::<RecordingPresenter, UnsupportedRecognizer>::new(
            settings,
            RecordingPresenter::new(),
            None,
        );
        assert_matches!(
            game,
            Err(GameError::Settings(SettingsError::InvalidSequenceLength(1)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn playback_timing_follows_settings() {
        let mut game = keyboard_game(fast_settings());
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(GameEvent::Submit).unwrap();

        let started = Instant::now();
        let handle = game.play_sequence(vec![11, 22, 33], &mut rx);
        let sender = async {
            // well after playback: 2000 ready + 3 * 1000 + 2 * 300
            sleep(Duration::from_millis(6000)).await;
            for c in "66".chars() {
                tx.send(GameEvent::Digit(c)).unwrap();
            }
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(handle, sender);
        let result = result.unwrap();

        assert!(result.is_correct);
        assert_eq!(result.response_time, 400);
        assert_eq!(started.elapsed(), Duration::from_millis(6000));
        assert_eq!(game.presenter().shown_terms(), vec![11, 22, 33]);
    }

    #[tokio::test(start_paused = true)]
    async fn narration_waits_for_the_slower_of_speech_and_timer() {
        let settings = GameSettings {
            voice_enabled: true,
            ..fast_settings()
        };
        let presenter = RecordingPresenter::new().with_speech_duration(Duration::from_millis(1800));
        let mut game: Game<_, UnsupportedRecognizer> =
            Game::new(settings, presenter, None).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let answer = async {
            // 2000 ready + 3 * 1800 + 2 * 300 = 8000
            sleep(Duration::from_millis(8100)).await;
            for c in "60".chars() {
                tx.send(GameEvent::Digit(c)).unwrap();
            }
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        assert_eq!(result.unwrap().response_time, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_narration_keeps_the_display_timer() {
        let settings = GameSettings {
            voice_enabled: true,
            audio_only_mode: true,
            ..fast_settings()
        };
        let presenter = RecordingPresenter::new().with_failing_speech(SpeechError::Unavailable);
        let mut game: Game<_, UnsupportedRecognizer> =
            Game::new(settings, presenter, None).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let answer = async {
            sleep(Duration::from_millis(5700)).await;
            tx.send(GameEvent::Digit('1')).unwrap();
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        assert_eq!(result.unwrap().response_time, 100);

        let presenter = game.presenter();
        assert!(presenter.shown_terms().is_empty());
        let spoken = presenter
            .calls
            .iter()
            .filter(|(_, c)| matches!(c, PresenterCall::Speak { .. }))
            .count();
        assert_eq!(spoken, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_typed_during_playback_are_discarded() {
        let mut game = keyboard_game(fast_settings());
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(GameEvent::Digit('9')).unwrap();

        let play = game.play_sequence(vec![10, 10, 10], &mut rx);
        let answer = async {
            sleep(Duration::from_secs(10)).await;
            for c in "30".chars() {
                tx.send(GameEvent::Digit(c)).unwrap();
            }
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        let result = result.unwrap();
        assert_eq!(result.user_answer, 30);
        assert!(result.is_correct);
    }

    #[tokio::test(start_paused = true)]
    async fn voice_answer_is_shown_then_submitted() {
        let recognizer = ScriptedRecognizer::new().then_hear("sixty", 0.9);
        let mut game = voice_game(recognizer.clone());
        let (_tx, mut rx) = mpsc::unbounded_channel();

        let result = game.play_sequence(vec![10, 20, 30], &mut rx).await.unwrap();
        assert!(result.is_correct);
        assert_eq!(result.response_time, VOICE_SUBMIT_DELAY_MS);
        assert_eq!(recognizer.starts(), 1);
        assert!(game
            .presenter()
            .displays()
            .contains(&&DisplayContent::Recognized(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn voice_retries_then_succeeds() {
        let recognizer = ScriptedRecognizer::new()
            .then_fail("no-speech")
            .then_hear("blah", 0.9)
            .then_hear("fifty nine", 0.9);
        let mut game = voice_game(recognizer.clone());
        let (_tx, mut rx) = mpsc::unbounded_channel();

        let result = game.play_sequence(vec![10, 20, 30], &mut rx).await.unwrap();
        assert_eq!(result.user_answer, 59);
        assert_eq!(result.accuracy_percentage, 98);
        assert_eq!(recognizer.starts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keypad_interrupts_listening() {
        let recognizer = ScriptedRecognizer::new().then_silence();
        let mut game = voice_game(recognizer.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let answer = async {
            sleep(Duration::from_millis(5600 + 2000)).await;
            for c in "60".chars() {
                tx.send(GameEvent::Digit(c)).unwrap();
            }
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        let result = result.unwrap();
        assert_eq!(result.user_answer, 60);
        assert_eq!(result.response_time, 2000);
        assert_eq!(recognizer.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_during_input_cancels() {
        let mut game = keyboard_game(fast_settings());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let quit = async {
            sleep(Duration::from_secs(7)).await;
            tx.send(GameEvent::Quit).unwrap();
        };
        let (result, ()) = tokio::join!(play, quit);
        assert_matches!(result, Err(GameError::Cancelled));
        assert_eq!(game.session().state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_handle_stops_playback() {
        let mut game = keyboard_game(fast_settings());
        let cancel = game.cancel_handle();
        let (_tx, mut rx) = mpsc::unbounded_channel();

        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let stop = async {
            sleep(Duration::from_millis(2500)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(play, stop);
        assert_matches!(result, Err(GameError::Cancelled));
        // cancelled in the middle of the first term
        assert_eq!(game.presenter().shown_terms(), vec![10]);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_is_reported() {
        let mut game = keyboard_game(fast_settings());
        let (tx, mut rx) = mpsc::unbounded_channel::<GameEvent>();
        drop(tx);
        assert_matches!(
            game.play_sequence(vec![10, 20, 30], &mut rx).await,
            Err(GameError::InputClosed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_respects_sound_and_haptic_switches() {
        let settings = GameSettings {
            sound_enabled: false,
            haptic_enabled: false,
            ..fast_settings()
        };
        let mut game = keyboard_game(settings);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let answer = async {
            sleep(Duration::from_secs(7)).await;
            tx.send(GameEvent::Digit('5')).unwrap();
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        assert!(!result.unwrap().is_correct);
        assert!(game.presenter().sounds().is_empty());
        assert!(game.presenter().haptics().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn input_phase_prompts_and_redraws_on_resize() {
        let mut game = keyboard_game(fast_settings());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let play = game.play_sequence(vec![10, 20, 30], &mut rx);
        let answer = async {
            sleep(Duration::from_millis(6000)).await;
            tx.send(GameEvent::Resize).unwrap();
            for c in "60".chars() {
                tx.send(GameEvent::Digit(c)).unwrap();
            }
            tx.send(GameEvent::Submit).unwrap();
        };
        let (result, ()) = tokio::join!(play, answer);
        // the prompt does not move the response clock
        assert_eq!(result.unwrap().response_time, 400);

        let presenter = game.presenter();
        assert_eq!(presenter.refreshes(), 1);
        let displays = presenter.displays();
        let prompt = displays
            .iter()
            .position(|d| **d == DisplayContent::Message(ENTER_SUM_MESSAGE.to_string()))
            .unwrap();
        assert_eq!(displays[prompt - 1], &DisplayContent::Blank);
        assert_eq!(
            displays[prompt + 1],
            &DisplayContent::Answer {
                answer: String::new()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_after_abandoned_listen_returns_to_idle() {
        let recognizer = ScriptedRecognizer::new().then_silence();
        let mut game = voice_game(recognizer.clone());
        let (_tx, mut rx) = mpsc::unbounded_channel();

        // drop the session future halfway through the first listen attempt
        let abandoned = tokio::time::timeout(
            Duration::from_millis(7000),
            game.play_sequence(vec![10, 20, 30], &mut rx),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(game.session().state, SessionState::VoiceListening);
        assert_eq!(recognizer.starts(), 1);

        game.reset();
        assert_eq!(game.session().state, SessionState::Idle);
        assert!(game.session().current_sequence.is_empty());
        assert_eq!(recognizer.stops(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn updated_threshold_reaches_the_recognizer() {
        let recognizer = ScriptedRecognizer::new().then_hear("sixty", 0.6);
        let mut game = voice_game(recognizer.clone());
        game.update_settings(GameSettings {
            voice_recognition_enabled: true,
            voice_confidence_threshold: 0.5,
            ..fast_settings()
        })
        .unwrap();
        let (_tx, mut rx) = mpsc::unbounded_channel();

        let result = game.play_sequence(vec![10, 20, 30], &mut rx).await.unwrap();
        assert!(result.is_correct);
        assert_eq!(recognizer.starts(), 1);
    }

    #[test]
    fn invalid_update_keeps_current_settings() {
        let mut game = keyboard_game(fast_settings());
        let update = GameSettings {
            sequence_length: 0,
            ..fast_settings()
        };
        assert_matches!(
            game.update_settings(update),
            Err(GameError::Settings(SettingsError::InvalidSequenceLength(0)))
        );
        assert_eq!(game.settings(), &fast_settings());
    }
}
