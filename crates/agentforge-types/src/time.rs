//! Timestamp helpers shared by every storage backend.

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time truncated to microseconds.
///
/// Every backend persists timestamps as RFC 3339 strings with microsecond
/// precision, so values produced here survive a storage round trip unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_now_has_no_sub_microsecond_component() {
        let ts = now();
        assert_eq!(ts.nanosecond() % 1_000, 0);
    }
}
