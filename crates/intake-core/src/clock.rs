use chrono::{DateTime, Utc};

/// Time source for generated upload names
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Unix timestamp in seconds, used as the generated-name prefix
    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Build from unix seconds; out-of-range values fall back to the epoch
    pub fn from_timestamp(secs: i64) -> Self {
        FixedClock(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_timestamp() {
        let clock = FixedClock::from_timestamp(1_700_000_000);
        assert_eq!(clock.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.timestamp() > 1_577_836_800);
    }
}
