use crate::settings::DigitCount;
use itertools::Itertools;
use rand::Rng;

/// Draw `length` terms uniformly from the band of `digit_count`.
pub fn generate_sequence(digit_count: DigitCount, length: usize) -> Vec<i64> {
    generate_sequence_with(&mut rand::thread_rng(), digit_count, length)
}

pub fn generate_sequence_with<R: Rng>(
    rng: &mut R,
    digit_count: DigitCount,
    length: usize,
) -> Vec<i64> {
    let band = digit_count.range();
    (0..length).map(|_| rng.gen_range(band.clone())).collect()
}

pub fn calculate_sum(sequence: &[i64]) -> i64 {
    sequence.iter().sum()
}

/// Renders `12 + 34 + 56 = 102`.
pub fn format_sequence(sequence: &[i64]) -> String {
    format!(
        "{} = {}",
        sequence.iter().join(" + "),
        calculate_sum(sequence)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn sequences_have_requested_length_and_band() {
        for digit_count in [
            DigitCount::Two,
            DigitCount::Three,
            DigitCount::Four,
            DigitCount::Five,
        ] {
            for length in [3, 10, 50] {
                let seq = generate_sequence(digit_count, length);
                assert_eq!(seq.len(), length);
                assert!(seq.iter().all(|n| digit_count.range().contains(n)));
                assert_eq!(calculate_sum(&seq), seq.iter().copied().sum::<i64>());
            }
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_sequence_with(&mut StdRng::seed_from_u64(7), DigitCount::Three, 12);
        let b = generate_sequence_with(&mut StdRng::seed_from_u64(7), DigitCount::Three, 12);
        assert_eq!(a, b);
    }

    #[test]
    fn two_digit_terms_keep_their_width() {
        let seq = generate_sequence_with(&mut StdRng::seed_from_u64(42), DigitCount::Two, 500);
        assert!(seq.iter().all(|n| n.to_string().len() == 2));
    }

    #[test]
    fn sum_of_empty_sequence_is_zero() {
        assert_eq!(calculate_sum(&[]), 0);
    }

    #[test]
    fn test_format_sequence() {
        assert_eq!(format_sequence(&[12, 34, 56]), "12 + 34 + 56 = 102");
    }
}
