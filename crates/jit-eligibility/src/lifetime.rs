//! Remaining session lifetime from recorded elevation times.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jit_types::Session;
use serde::Serialize;

/// How much of a session's lifetime is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remaining {
    /// Elevation time is known; this much is left (zero once elapsed).
    Known { remaining: Duration },

    /// No elevation time was recorded for this session.
    Unknown { total: Duration },
}

impl Remaining {
    /// Duration to show the user: what is left when known, otherwise the
    /// total granted lifetime. Never a made-up zero for unknown sessions.
    pub fn display_duration(&self) -> Duration {
        match self {
            Remaining::Known { remaining } => *remaining,
            Remaining::Unknown { total } => *total,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Remaining::Known { .. })
    }

    pub fn is_elapsed(&self) -> bool {
        matches!(self, Remaining::Known { remaining } if remaining.is_zero())
    }
}

/// `duration - (now - elevated_at)`, clamped at zero.
pub fn remaining_lifetime(
    session: &Session,
    elevated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Remaining {
    let total = Duration::from_secs(session.duration_secs);
    let Some(elevated_at) = elevated_at else {
        return Remaining::Unknown { total };
    };

    // A timestamp in the future means nothing has elapsed yet.
    let elapsed = (now - elevated_at).to_std().unwrap_or(Duration::ZERO);
    Remaining::Known {
        remaining: total.saturating_sub(elapsed),
    }
}

/// Compact human form: `45m`, `1h 05m`, `30s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m:02}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jit_store::{Store, StoreConfig};
    use jit_types::Provider;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn session(id: &str) -> Session {
        Session::new(id, Provider::Azure, "sub-1", "Owner", 3600)
    }

    #[test]
    fn test_remaining_after_recorded_elevation() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(StoreConfig::new(tmp.path())).unwrap();
        store.record_session_timestamp("sess-1", t0()).unwrap();

        let now = t0() + chrono::Duration::minutes(15);
        let stamps = store.session_timestamps_at(now);
        let remaining = remaining_lifetime(&session("sess-1"), stamps.get("sess-1").copied(), now);

        assert_eq!(
            remaining,
            Remaining::Known {
                remaining: Duration::from_secs(2700)
            }
        );
        assert_eq!(format_duration(remaining.display_duration()), "45m");
    }

    #[test]
    fn test_unrecorded_session_is_unknown_not_zero() {
        let remaining = remaining_lifetime(&session("sess-2"), None, t0());

        assert!(!remaining.is_known());
        assert_eq!(remaining.display_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let remaining = remaining_lifetime(
            &session("sess-1"),
            Some(t0()),
            t0() + chrono::Duration::hours(2),
        );
        assert!(remaining.is_elapsed());
        assert_eq!(remaining.display_duration(), Duration::ZERO);
    }

    #[test]
    fn test_future_elevation_counts_as_full() {
        let remaining = remaining_lifetime(
            &session("sess-1"),
            Some(t0() + chrono::Duration::minutes(1)),
            t0(),
        );
        assert_eq!(remaining.display_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(2700)), "45m");
        assert_eq!(format_duration(Duration::from_secs(3900)), "1h 05m");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }
}
