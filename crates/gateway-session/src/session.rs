//! A single catalogue session: its opaque id and the point at which the
//! catalogue considers it expired.

use crate::transport::IssuedSession;
use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn from_issued(issued: IssuedSession) -> Self {
        Self {
            id: issued.session_id,
            expires_at: Utc::now() + Duration::seconds(issued.lifetime_secs),
        }
    }

    /// Seconds left before the catalogue considers this session expired;
    /// negative once it has already lapsed.
    pub fn remaining_lifetime_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    pub fn needs_refresh(&self, threshold_secs: i64) -> bool {
        self.remaining_lifetime_secs() < threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_does_not_need_refresh() {
        let session = Session::from_issued(IssuedSession {
            session_id: "abc".into(),
            lifetime_secs: 3600,
        });
        assert!(!session.needs_refresh(60));
    }

    #[test]
    fn test_near_expiry_session_needs_refresh() {
        let session = Session::from_issued(IssuedSession {
            session_id: "abc".into(),
            lifetime_secs: 30,
        });
        assert!(session.needs_refresh(60));
    }

    #[test]
    fn test_remaining_lifetime_decreases_with_shorter_issue() {
        let short = Session::from_issued(IssuedSession {
            session_id: "a".into(),
            lifetime_secs: 10,
        });
        let long = Session::from_issued(IssuedSession {
            session_id: "b".into(),
            lifetime_secs: 1000,
        });
        assert!(short.remaining_lifetime_secs() < long.remaining_lifetime_secs());
    }
}
