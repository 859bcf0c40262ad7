//! Timestamp helpers.

use chrono::Utc;

/// Returns the current time as epoch seconds.
///
/// This is the resolution persisted in step execution state records;
/// 0 is reserved for "never run".
#[must_use]
pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_epoch_seconds_is_positive() {
        assert!(now_epoch_seconds() > 1_600_000_000);
    }
}
