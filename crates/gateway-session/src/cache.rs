//! The authenticator cache: maps `(mechanism, username)` to the most
//! recently issued session for that identity, so a client performing
//! explicit login doesn't pay a handshake per call. Bounded LRU, independent
//! of the main pool's free list.

use crate::session::Session;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub struct AuthenticatorCache {
    inner: Mutex<LruCache<(String, String), Session>>,
}

impl AuthenticatorCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Return a cached session for this identity if it's still fresh beyond
    /// `threshold_secs`; callers are responsible for refreshing/re-logging
    /// in on a miss.
    pub fn get_fresh(&self, mechanism: &str, username: &str, threshold_secs: i64) -> Option<Session> {
        let mut cache = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let key = (mechanism.to_string(), username.to_string());
        match cache.get(&key) {
            Some(session) if !session.needs_refresh(threshold_secs) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn put(&self, mechanism: &str, username: &str, session: Session) {
        let mut cache = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        cache.put((mechanism.to_string(), username.to_string()), session);
    }

    pub fn invalidate(&self, mechanism: &str, username: &str) {
        let mut cache = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        cache.pop(&(mechanism.to_string(), username.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::IssuedSession;

    fn session(id: &str, lifetime: i64) -> Session {
        Session::from_issued(IssuedSession {
            session_id: id.into(),
            lifetime_secs: lifetime,
        })
    }

    #[test]
    fn test_put_then_get_fresh() {
        let cache = AuthenticatorCache::new(2);
        cache.put("db", "alice", session("s1", 3600));
        let hit = cache.get_fresh("db", "alice", 60).unwrap();
        assert_eq!(hit.id, "s1");
    }

    #[test]
    fn test_stale_entry_is_not_returned() {
        let cache = AuthenticatorCache::new(2);
        cache.put("db", "alice", session("s1", 10));
        assert!(cache.get_fresh("db", "alice", 60).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = AuthenticatorCache::new(1);
        cache.put("db", "alice", session("s1", 3600));
        cache.put("db", "bob", session("s2", 3600));
        assert!(cache.get_fresh("db", "alice", 60).is_none());
        assert!(cache.get_fresh("db", "bob", 60).is_some());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = AuthenticatorCache::new(2);
        cache.put("db", "alice", session("s1", 3600));
        cache.invalidate("db", "alice");
        assert!(cache.get_fresh("db", "alice", 60).is_none());
    }
}
