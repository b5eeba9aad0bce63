use std::time::Duration;

/// Bounded exponential backoff with jitter, shared by the reconcile-error
/// path (spec.md §4.2 "exponential backoff with jitter") and the model-list
/// probe retry path (spec.md §4.5: base 100 ms, factor 2, jitter 10%,
/// capped at 4 attempts).
///
/// `attempt` is zero-based (the first retry is `attempt == 0`). `jitter01`
/// is a caller-supplied value in `[0.0, 1.0)` so this stays a pure function
/// -- callers source randomness once (e.g. from `rand::random()`) and pass
/// it in, keeping this easy to test deterministically.
#[must_use]
pub fn jittered_backoff(attempt: u32, base: Duration, factor: f64, max: Duration, jitter01: f64) -> Duration {
    let exp = factor.powi(attempt.min(32) as i32);
    let scaled = base.mul_f64(exp).min(max);
    // jitter01 in [0, 1) maps to a +/-10% sway around the scaled delay.
    let sway = 1.0 + (jitter01 - 0.5) * 0.2;
    scaled.mul_f64(sway.max(0.0))
}

/// The probe backoff schedule spec.md §4.5 names explicitly.
#[must_use]
pub fn probe_backoff(attempt: u32, jitter01: f64) -> Duration {
    jittered_backoff(attempt, Duration::from_millis(100), 2.0, Duration::from_secs(10), jitter01)
}

/// The reconcile-error backoff schedule spec.md §4.2 names as "bounded
/// maximum retry interval", reusing the same shape per spec.md §9's
/// explicit instruction to share it between the two call sites.
#[must_use]
pub fn reconcile_backoff(attempt: u32, jitter01: f64) -> Duration {
    jittered_backoff(attempt, Duration::from_secs(1), 2.0, Duration::from_secs(120), jitter01)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_exponentially_before_capping() {
        let d0 = jittered_backoff(0, Duration::from_millis(100), 2.0, Duration::from_secs(10), 0.5);
        let d1 = jittered_backoff(1, Duration::from_millis(100), 2.0, Duration::from_secs(10), 0.5);
        assert!(d1 > d0);
    }

    #[test]
    fn caps_at_max() {
        let d = jittered_backoff(20, Duration::from_millis(100), 2.0, Duration::from_secs(10), 0.5);
        assert!(d <= Duration::from_secs(10) + Duration::from_millis(1));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let base = jittered_backoff(3, Duration::from_millis(100), 2.0, Duration::from_secs(60), 0.5);
        let low = jittered_backoff(3, Duration::from_millis(100), 2.0, Duration::from_secs(60), 0.0);
        let high = jittered_backoff(3, Duration::from_millis(100), 2.0, Duration::from_secs(60), 0.999);
        assert!(low <= base);
        assert!(high >= base);
    }

    #[test]
    fn probe_backoff_reaches_four_attempts_under_max() {
        for attempt in 0..4 {
            let d = probe_backoff(attempt, 0.5);
            assert!(d <= Duration::from_secs(10));
        }
    }
}
