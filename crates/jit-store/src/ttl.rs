//! Freshness evaluation against stored write times.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Decides whether a timestamped record is still fresh.
///
/// The horizon is a property of the reader, not of the record: the same
/// entry can be fresh for one process and stale for another configured with
/// a shorter TTL.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl TtlPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Absolute distance between `written_at` and `now`.
    ///
    /// Absolute so that a record stamped slightly in the future (clock skew
    /// between writer and reader) still ages out.
    pub fn age(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let millis = (now - written_at).num_milliseconds().unsigned_abs();
        Duration::from_millis(millis)
    }

    /// Fresh iff `age < ttl`.
    pub fn is_fresh(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.age(written_at, now) < self.ttl
    }
}
