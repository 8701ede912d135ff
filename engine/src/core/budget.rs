//! Wall-clock budget for a single run.

use std::time::Duration;

/// Default budget applied to new test cases.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time budget: either no limit (run inline) or a positive duration (run on a
/// worker and cancel on expiry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBudget {
    Unlimited,
    Limited(Duration),
}

impl Default for TimeBudget {
    fn default() -> Self {
        TimeBudget::Limited(DEFAULT_TIMEOUT)
    }
}

impl TimeBudget {
    /// Budget from a seconds value. Zero, negative and non-finite values mean
    /// no limit.
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            TimeBudget::Limited(Duration::from_secs_f64(secs))
        } else {
            TimeBudget::Unlimited
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        if duration.is_zero() {
            TimeBudget::Unlimited
        } else {
            TimeBudget::Limited(duration)
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        match self {
            TimeBudget::Unlimited => None,
            TimeBudget::Limited(duration) => Some(*duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_seconds_are_unlimited() {
        assert_eq!(TimeBudget::from_secs_f64(0.0), TimeBudget::Unlimited);
        assert_eq!(TimeBudget::from_secs_f64(-3.0), TimeBudget::Unlimited);
        assert_eq!(TimeBudget::from_secs_f64(f64::NAN), TimeBudget::Unlimited);
    }

    #[test]
    fn positive_seconds_are_limited() {
        assert_eq!(
            TimeBudget::from_secs_f64(1.5).limit(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(TimeBudget::default().limit(), Some(DEFAULT_TIMEOUT));
        assert_eq!(TimeBudget::from_duration(Duration::ZERO), TimeBudget::Unlimited);
    }
}
