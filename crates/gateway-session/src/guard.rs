//! The RAII session guard returned by [`crate::pool::SessionPool::borrow`].
//!
//! Mirrors how a pooled database connection already returns itself to its
//! pool on drop in this codebase's existing connection-pool usage: `Drop`
//! pushes the session back onto the pool's free list unless the caller
//! explicitly escaped via [`SessionGuard::into_invalidated`], made explicit
//! here since the catalogue transport has no driver-level pool doing it for
//! us.

use crate::pool::PoolInner;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;

pub struct SessionGuard {
    pool: Arc<PoolInner>,
    session: Option<Session>,
    // Held for its Drop impl: releases the pool's outstanding-borrow permit
    // when the guard goes away, regardless of which path got it there.
    _permit: OwnedSemaphorePermit,
    invalidated: bool,
}

impl SessionGuard {
    pub(crate) fn new(pool: Arc<PoolInner>, session: Session, permit: OwnedSemaphorePermit) -> Self {
        Self {
            pool,
            session: Some(session),
            _permit: permit,
            invalidated: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.as_ref().expect("session present until drop").id
    }

    /// Escape hatch for callers that know the session is no longer good
    /// (the catalogue reported it gone): marks the guard so `Drop` does not
    /// return it to the free list, and hands the session back so the caller
    /// can log it out.
    pub fn into_invalidated(mut self) -> Session {
        self.invalidated = true;
        self.session.take().expect("session present until drop")
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.invalidated {
            return;
        }
        if let Some(session) = self.session.take() {
            self.pool.return_session(session);
        }
    }
}
