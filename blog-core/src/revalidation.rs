use std::time::Duration;

use chrono::{DateTime, Utc};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 12);

/// Process-wide staleness window. A generated page older than `max_age` is
/// still served, and the request that notices it kicks off a background
/// regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    pub max_age: Duration,
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl RevalidationPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn is_stale(&self, generated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(generated_at);
        match age.to_std() {
            Ok(age) => age >= self.max_age,
            // generated in the future (clock skew): fresh
            Err(_) => false,
        }
    }

    /// Seconds, for `Cache-Control: s-maxage`.
    pub fn max_age_secs(&self) -> u64 {
        self.max_age.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn twelve_hour_window() {
        let policy = RevalidationPolicy::default();
        let built = Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap();
        assert!(!policy.is_stale(built, built + chrono::Duration::hours(11)));
        assert!(policy.is_stale(built, built + chrono::Duration::hours(12)));
        assert_eq!(policy.max_age_secs(), 43_200);
    }

    #[test]
    fn clock_skew_is_fresh() {
        let policy = RevalidationPolicy::new(Duration::ZERO);
        let built = Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap();
        assert!(!policy.is_stale(built, built - chrono::Duration::seconds(5)));
    }
}
