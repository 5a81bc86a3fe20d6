use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::time::Instant;

use crate::scoring::{calculate_score, validate_answer, DifficultyLevel};
use crate::sequence::calculate_sum;
use crate::settings::GameSettings;

pub const MAX_ANSWER_LEN: usize = 6;
pub const MAX_VOICE_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SessionState {
    Idle,
    Playing,
    Input,
    VoiceListening,
    VoiceProcessing,
    Finished,
}

/// Outcome of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub is_correct: bool,
    pub user_answer: i64,
    pub correct_answer: i64,
    /// Milliseconds from the start of answer acquisition to submission.
    pub response_time: u64,
    pub score: u32,
    pub sequence: Vec<i64>,
    pub accuracy_percentage: u32,
    pub difficulty_multiplier: f64,
    pub speed_bonus: u32,
    pub difficulty: DifficultyLevel,
    pub completed_at: DateTime<Local>,
}

/// Mutable state of one session. Transitions that do not apply in the
/// current state are ignored and report `false`.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub state: SessionState,
    pub current_sequence: Vec<i64>,
    pub current_index: usize,
    pub user_answer: String,
    pub correct_sum: i64,
    pub start_time: Option<Instant>,
    /// Response-time origin, set once per session.
    pub input_start_time: Option<Instant>,
    pub end_time: Option<Instant>,
    pub is_voice_mode: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            current_sequence: Vec::new(),
            current_index: 0,
            user_answer: String::new(),
            correct_sum: 0,
            start_time: None,
            input_start_time: None,
            end_time: None,
            is_voice_mode: false,
        }
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, sequence: Vec<i64>, now: Instant) {
        *self = Self {
            state: SessionState::Playing,
            correct_sum: calculate_sum(&sequence),
            current_sequence: sequence,
            start_time: Some(now),
            ..Self::default()
        };
    }

    pub fn begin_input(&mut self, now: Instant, voice: bool) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.input_start_time.get_or_insert(now);
        self.is_voice_mode = voice;
        self.state = if voice {
            SessionState::VoiceListening
        } else {
            SessionState::Input
        };
        true
    }

    pub fn push_digit(&mut self, digit: char) -> bool {
        if self.state != SessionState::Input
            || !digit.is_ascii_digit()
            || self.user_answer.len() >= MAX_ANSWER_LEN
        {
            return false;
        }
        self.user_answer.push(digit);
        true
    }

    pub fn clear_answer(&mut self) -> bool {
        if self.state != SessionState::Input {
            return false;
        }
        self.user_answer.clear();
        true
    }

    pub fn can_submit(&self) -> bool {
        match self.state {
            SessionState::Input => !self.user_answer.is_empty(),
            SessionState::VoiceProcessing => true,
            _ => false,
        }
    }

    pub fn voice_recognized(&mut self, value: i64) -> bool {
        if self.state != SessionState::VoiceListening {
            return false;
        }
        self.user_answer = value.to_string();
        self.state = SessionState::VoiceProcessing;
        true
    }

    /// Give up on speech and take the answer from the keypad.
    pub fn fall_back_to_keypad(&mut self) -> bool {
        if self.state != SessionState::VoiceListening {
            return false;
        }
        self.is_voice_mode = false;
        self.user_answer.clear();
        self.state = SessionState::Input;
        true
    }

    pub fn response_time_ms(&self, now: Instant) -> u64 {
        self.input_start_time
            .map(|start| now.saturating_duration_since(start).as_millis() as u64)
            .unwrap_or(0)
    }

    /// Score the buffered answer and finish the session.
    pub fn submit(&mut self, now: Instant, settings: &GameSettings) -> Option<GameResult> {
        if !self.can_submit() {
            return None;
        }
        let user_answer = self.user_answer.parse::<i64>().ok()?;
        let response_time = self.response_time_ms(now);
        let breakdown = calculate_score(user_answer, self.correct_sum, response_time, settings);

        self.end_time = Some(now);
        self.state = SessionState::Finished;

        Some(GameResult {
            is_correct: validate_answer(&self.user_answer, self.correct_sum),
            user_answer,
            correct_answer: self.correct_sum,
            response_time,
            score: breakdown.score,
            sequence: self.current_sequence.clone(),
            accuracy_percentage: breakdown.accuracy_percentage,
            difficulty_multiplier: breakdown.difficulty_multiplier,
            speed_bonus: breakdown.speed_bonus,
            difficulty: DifficultyLevel::classify(settings),
            completed_at: Local::now(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u8 },
    FallBack,
}

/// Counts consecutive failed listen attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceRetry {
    failures: u8,
    max_attempts: u8,
}

impl Default for VoiceRetry {
    fn default() -> Self {
        Self::new(MAX_VOICE_ATTEMPTS)
    }
}

impl VoiceRetry {
    pub fn new(max_attempts: u8) -> Self {
        Self {
            failures: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// 1-based number of the attempt about to run.
    pub fn attempt(&self) -> u8 {
        self.failures + 1
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.max_attempts {
            RetryDecision::FallBack
        } else {
            RetryDecision::Retry {
                attempt: self.attempt(),
            }
        }
    }
}
