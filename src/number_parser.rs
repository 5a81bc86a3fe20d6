//! Turns speech-to-text transcripts into integers.
//!
//! Recognizers are inconsistent about how they render numbers: some emit
//! digits ("234"), some spell digits one by one ("two three four") and some
//! produce proper English ("two hundred thirty four"). All three forms are
//! accepted, tried in that order.

use itertools::Itertools;
use tracing::debug;

pub const MIN_SPOKEN_VALUE: i64 = -99_999;
pub const MAX_SPOKEN_VALUE: i64 = 99_999;

const MAX_SPELLED_DIGITS: usize = 5;

fn word_value(word: &str) -> Option<i64> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        "thousand" => 1000,
        _ => return None,
    };
    Some(value)
}

fn is_negative_marker(word: &str) -> bool {
    matches!(word, "negative" | "minus")
}

fn in_range(n: i64) -> bool {
    (MIN_SPOKEN_VALUE..=MAX_SPOKEN_VALUE).contains(&n)
}

/// Common mishearings, applied word by word.
fn correct_homophone(word: &str) -> &str {
    match word {
        "to" | "too" => "two",
        "for" | "fore" => "four",
        "ate" => "eight",
        "won" => "one",
        "tree" | "free" => "three",
        "sex" | "sick" => "six",
        "heaven" => "seven",
        "tent" | "teen" => "ten",
        "dirty" => "thirty",
        "fourty" => "forty",
        other => other,
    }
}

pub fn preprocess_transcript(transcript: &str) -> String {
    transcript
        .to_lowercase()
        .split_whitespace()
        .map(correct_homophone)
        .join(" ")
}

pub fn parse_spoken_number(transcript: &str) -> Option<i64> {
    let clean = transcript.trim().to_lowercase();
    if clean.is_empty() {
        return None;
    }

    parse_direct(&clean)
        .or_else(|| parse_digit_sequence(&clean))
        .or_else(|| parse_words(&clean))
}

fn parse_direct(text: &str) -> Option<i64> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    let digits = numeric.strip_prefix('-').unwrap_or(&numeric);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    numeric.parse::<i64>().ok().filter(|n| in_range(*n))
}

fn parse_digit_sequence(text: &str) -> Option<i64> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_SPELLED_DIGITS {
        return None;
    }

    let digits: Option<String> = words
        .iter()
        .map(|w| word_value(w).filter(|v| *v < 10))
        .map(|v| v.map(|d| d.to_string()))
        .collect();
    digits?.parse::<i64>().ok()
}

fn parse_words(text: &str) -> Option<i64> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|t| !t.is_empty())
        .collect();

    let negative = tokens.iter().any(|t| is_negative_marker(t));

    let mut result: i64 = 0;
    let mut current: i64 = 0;
    let mut recognized = false;

    for token in tokens.iter().filter(|t| !is_negative_marker(t)) {
        // anything else is recognizer noise
        let Some(value) = word_value(token) else {
            continue;
        };
        recognized = true;

        match value {
            100 => {
                if current == 0 {
                    current = 1;
                }
                current = current.saturating_mul(100);
            }
            1000 => {
                if current == 0 {
                    current = 1;
                }
                result = result.saturating_add(current.saturating_mul(1000));
                current = 0;
            }
            v => current = current.saturating_add(v),
        }
    }

    if !recognized {
        return None;
    }

    let mut value = result.saturating_add(current);
    if negative {
        value = -value;
    }
    Some(value).filter(|n| in_range(*n))
}

/// How much of the transcript looks like a number, in `[0, 1]`.
pub fn get_confidence(transcript: &str) -> f64 {
    let clean = transcript.trim().to_lowercase();
    if !clean.is_empty() && clean.chars().all(|c| c.is_ascii_digit()) {
        return 1.0;
    }

    let words: Vec<&str> = clean.split_whitespace().collect();
    let recognized = words
        .iter()
        .filter(|w| word_value(w).is_some() || is_negative_marker(w))
        .count();
    if recognized == 0 {
        return 0.0;
    }

    let confidence = recognized as f64 / words.len() as f64;
    if words.len() <= 3 && confidence >= 0.8 {
        (confidence + 0.2).min(1.0)
    } else {
        confidence
    }
}

/// Final gate before a parsed voice answer is accepted.
pub fn validate_parse_result(input: &str, result: Option<i64>) -> bool {
    match result {
        Some(n) if in_range(n) => true,
        Some(n) => {
            debug!(input, value = n, "parsed value outside the answer range");
            false
        }
        None => false,
    }
}
