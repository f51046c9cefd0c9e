//! Human-like delay before a move is executed.

use std::time::Duration;

use rand::Rng;

/// Delay parameters, all in milliseconds except the divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub base: u64,
    /// Exclusive upper bound of the uniform roll.
    pub random: u64,
    pub div: u64,
    pub multi: u64,
}

/// `base + (roll % div) * multi`, with `roll` uniform in `0..random`.
///
/// A result that is not representable (zero divisor, overflow) yields
/// `fallback` instead.
pub fn compute_delay<R: Rng + ?Sized>(rng: &mut R, jitter: Jitter, fallback: Duration) -> Duration {
    let roll = if jitter.random == 0 {
        0
    } else {
        rng.gen_range(0..jitter.random)
    };
    let millis = roll
        .checked_rem(jitter.div)
        .and_then(|r| r.checked_mul(jitter.multi))
        .and_then(|r| r.checked_add(jitter.base));
    match millis {
        Some(ms) => Duration::from_millis(ms),
        None => {
            tracing::debug!("Delay not representable for {:?}, using fallback", jitter);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FALLBACK: Duration = Duration::from_millis(1000);

    #[test]
    fn test_delay_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let jitter = Jitter {
            base: 5000,
            random: 2000,
            div: 10,
            multi: 1000,
        };
        for _ in 0..200 {
            let delay = compute_delay(&mut rng, jitter, FALLBACK);
            let ms = delay.as_millis() as u64;
            assert!((5000..=14_000).contains(&ms), "{ms}");
            assert_eq!(ms % 1000, 0);
        }
    }

    #[test]
    fn test_zero_divisor_uses_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        let jitter = Jitter {
            base: 5000,
            random: 2000,
            div: 0,
            multi: 1000,
        };
        assert_eq!(compute_delay(&mut rng, jitter, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_overflow_uses_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        let jitter = Jitter {
            base: u64::MAX,
            random: 0,
            div: 1,
            multi: 1,
        };
        // 0 % 1 * 1 + MAX does not overflow.
        assert_eq!(
            compute_delay(&mut rng, jitter, FALLBACK),
            Duration::from_millis(u64::MAX)
        );

        // Any non-zero roll times MAX, plus one, overflows.
        let seed = (0..)
            .find(|s| StdRng::seed_from_u64(*s).gen_range(0..10u64) != 0)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let jitter = Jitter {
            base: 1,
            random: 10,
            div: 10,
            multi: u64::MAX,
        };
        assert_eq!(compute_delay(&mut rng, jitter, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_no_randomness() {
        let mut rng = StdRng::seed_from_u64(3);
        let jitter = Jitter {
            base: 250,
            random: 0,
            div: 10,
            multi: 1000,
        };
        assert_eq!(compute_delay(&mut rng, jitter, FALLBACK), Duration::from_millis(250));
    }
}
