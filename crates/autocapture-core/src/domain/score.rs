//! Round score computation.

use std::time::Duration;

use super::area::Difficulty;

/// Longest round the service credits.
pub const MAX_ROUND_DURATION: Duration = Duration::from_secs(120);

/// Points earned per second of a round.
///
/// Unknown tiers use the `High` rate so a round always scores something.
pub fn points_per_second(difficulty: Difficulty) -> u64 {
    match difficulty {
        Difficulty::Low => 5,
        Difficulty::Medium => 10,
        Difficulty::High | Difficulty::Unknown(_) => 20,
    }
}

/// `rate(difficulty) * min(elapsed, MAX_ROUND_DURATION)` in whole seconds.
pub fn round_score(difficulty: Difficulty, elapsed: Duration) -> u64 {
    let seconds = elapsed.min(MAX_ROUND_DURATION).as_secs();
    points_per_second(difficulty) * seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::low(Difficulty::Low, 120, 600)]
    #[case::medium(Difficulty::Medium, 120, 1200)]
    #[case::high(Difficulty::High, 120, 2400)]
    #[case::medium_capped(Difficulty::Medium, 150, 1200)]
    #[case::short_round(Difficulty::Low, 30, 150)]
    #[case::unknown_uses_high_rate(Difficulty::Unknown(7), 60, 1200)]
    #[case::nothing_elapsed(Difficulty::High, 0, 0)]
    fn score_table(#[case] difficulty: Difficulty, #[case] secs: u64, #[case] expected: u64) {
        assert_eq!(round_score(difficulty, Duration::from_secs(secs)), expected);
    }

    #[test]
    fn fractional_seconds_are_truncated() {
        assert_eq!(round_score(Difficulty::Low, Duration::from_millis(10_900)), 50);
    }
}
