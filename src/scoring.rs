//! Score computation for a single answer.
//!
//! The score is additive: a difficulty-scaled base (100 points per unit of
//! difficulty multiplier) weighted by answer accuracy, plus a speed bonus that
//! decays exponentially with response time and is only paid out when the
//! answer earned accuracy points at all.

use crate::settings::{DigitCount, GameSettings};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Relative error up to which an answer still earns partial credit (inclusive).
pub const PARTIAL_CREDIT_MAX_ERROR: f64 = 0.25;
/// Lowest accuracy paid for an answer inside the partial-credit window.
pub const PARTIAL_CREDIT_FLOOR: f64 = 0.05;
pub const MAX_SPEED_BONUS: f64 = 50.0;
/// Responses this slow or slower get no speed bonus.
pub const SPEED_BONUS_CUTOFF_MS: u64 = 5000;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
    Extreme,
    Elite,
}

impl DifficultyLevel {
    /// Bands are checked hardest first; any single qualifying setting
    /// is enough to land in a band.
    pub fn classify(settings: &GameSettings) -> Self {
        let digits = settings.digit_count;
        let length = settings.sequence_length;
        let on_screen = settings.time_on_screen;

        if digits == DigitCount::Five || length >= 30 || on_screen <= 100 {
            DifficultyLevel::Elite
        } else if digits == DigitCount::Four || length >= 15 || on_screen <= 300 {
            DifficultyLevel::Extreme
        } else if digits == DigitCount::Three || length >= 8 || on_screen <= 800 {
            DifficultyLevel::Hard
        } else if digits == DigitCount::Two && length <= 4 && on_screen >= 1500 {
            DifficultyLevel::Easy
        } else {
            DifficultyLevel::Medium
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            DifficultyLevel::Easy => 1.0,
            DifficultyLevel::Medium => 1.5,
            DifficultyLevel::Hard => 2.0,
            DifficultyLevel::Extreme => 3.0,
            DifficultyLevel::Elite => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub score: u32,
    pub accuracy_percentage: u32,
    pub difficulty_multiplier: f64,
    pub speed_bonus: u32,
}

pub fn calculate_accuracy_multiplier(user_answer: i64, correct_answer: i64) -> f64 {
    if user_answer == correct_answer {
        return 1.0;
    }
    if correct_answer == 0 {
        warn!(user_answer, "relative error undefined for a zero sum, no partial credit");
        return 0.0;
    }

    let error = (user_answer - correct_answer).abs() as f64;
    let percentage_error = error / correct_answer.abs() as f64;

    if percentage_error <= PARTIAL_CREDIT_MAX_ERROR {
        (1.0 - percentage_error).max(PARTIAL_CREDIT_FLOOR)
    } else {
        0.0
    }
}

pub fn calculate_speed_bonus(response_time_ms: u64) -> u32 {
    if response_time_ms >= SPEED_BONUS_CUTOFF_MS {
        return 0;
    }
    let secs = response_time_ms as f64 / 1000.0;
    (MAX_SPEED_BONUS * (-secs / 2.0).exp()).round() as u32
}

pub fn difficulty_multiplier(settings: &GameSettings) -> f64 {
    DifficultyLevel::classify(settings).multiplier()
}

pub fn calculate_score(
    user_answer: i64,
    correct_answer: i64,
    response_time_ms: u64,
    settings: &GameSettings,
) -> ScoreBreakdown {
    let accuracy = calculate_accuracy_multiplier(user_answer, correct_answer);
    let difficulty_multiplier = difficulty_multiplier(settings);

    let base_score = difficulty_multiplier * 100.0;
    let accuracy_score = base_score * accuracy;

    let speed_bonus = if accuracy_score > 0.0 {
        calculate_speed_bonus(response_time_ms)
    } else {
        0
    };

    ScoreBreakdown {
        score: (accuracy_score + speed_bonus as f64).round() as u32,
        accuracy_percentage: (accuracy * 100.0).round() as u32,
        difficulty_multiplier,
        speed_bonus,
    }
}

pub fn validate_answer(user_answer: &str, correct_sum: i64) -> bool {
    user_answer
        .trim()
        .parse::<i64>()
        .map(|n| n == correct_sum)
        .unwrap_or(false)
}

/// `850ms` below one second, `1.234s` above.
pub fn format_time(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.3}s", ms as f64 / 1000.0)
    }
}
