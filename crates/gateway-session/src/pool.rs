//! C3: the session pool. Owns *N* sessions for a single configured
//! identity, bounded by a mutex-guarded free list and a counting semaphore
//! over outstanding borrows — a ready queue plus a busy count guarded by a
//! semaphore, adapted here to catalogue sessions with an RAII guard that
//! returns itself on drop instead of requiring an explicit release call.

use crate::error::{Result, SessionError};
use crate::guard::SessionGuard;
use crate::session::Session;
use crate::transport::CatalogueTransport;
use gateway_core::AppConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// State shared between the pool handle, outstanding guards, and the
/// background maintenance task.
pub(crate) struct PoolInner {
    transport: Arc<dyn CatalogueTransport>,
    free: StdMutex<VecDeque<Session>>,
    semaphore: Arc<Semaphore>,
    mechanism: String,
    username: String,
    password: String,
    refresh_threshold_secs: i64,
    refresh_timeout: Duration,
}

impl PoolInner {
    async fn authenticate(&self) -> Result<Session> {
        let issued = self.transport.login(&self.mechanism, &self.username, &self.password).await?;
        Ok(Session::from_issued(issued))
    }

    /// Refresh a session out-of-line; if the catalogue rejects the refresh
    /// (or it times out), fall back to a fresh login rather than handing the
    /// caller a session that's about to expire.
    async fn refresh_or_reauthenticate(&self, session: Session) -> Result<Session> {
        match tokio::time::timeout(self.refresh_timeout, self.transport.refresh(&session.id)).await {
            Ok(Ok(issued)) => Ok(Session::from_issued(issued)),
            _ => self.authenticate().await,
        }
    }

    pub(crate) fn return_session(&self, session: Session) {
        self.free.lock().unwrap_or_else(|p| p.into_inner()).push_back(session);
    }
}

pub struct SessionPool {
    inner: Arc<PoolInner>,
    borrow_timeout: Duration,
}

impl SessionPool {
    /// Construct the pool and eagerly authenticate `client_pool_init_size`
    /// sessions before returning, so the first requests don't pay the
    /// handshake latency. Spawns the background maintenance task.
    pub async fn new(transport: Arc<dyn CatalogueTransport>, config: AppConfig) -> Result<Self> {
        let (username, password) = match &config.test_user_credentials {
            Some(creds) => (creds.username.clone(), creds.password.clone()),
            None => (String::new(), String::new()),
        };

        let inner = Arc::new(PoolInner {
            transport,
            free: StdMutex::new(VecDeque::new()),
            semaphore: Arc::new(Semaphore::new(config.client_pool_max_size.max(1))),
            mechanism: config.test_mechanism.clone(),
            username,
            password,
            refresh_threshold_secs: config.session_refresh_threshold_secs,
            refresh_timeout: Duration::from_millis(config.refresh_timeout_ms),
        });

        let init_size = config.client_pool_init_size.min(config.client_pool_max_size);
        for _ in 0..init_size {
            let session = inner.authenticate().await?;
            inner.return_session(session);
        }

        let maintenance_inner = inner.clone();
        let interval = Duration::from_secs(config.maintenance_interval_secs.max(1));
        tokio::spawn(async move {
            Self::run_maintenance(maintenance_inner, interval).await;
        });

        Ok(Self {
            inner,
            borrow_timeout: Duration::from_millis(config.borrow_timeout_ms),
        })
    }

    /// Borrow a session, blocking up to `borrow_timeout_ms` if the pool is
    /// at capacity. Refreshes the session out-of-line first if its
    /// remaining lifetime is below the configured threshold.
    pub async fn borrow(&self) -> Result<SessionGuard> {
        let permit = tokio::time::timeout(self.borrow_timeout, self.inner.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| SessionError::PoolExhausted)?
            .map_err(|_| SessionError::PoolExhausted)?;

        let popped = self
            .inner
            .free
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        let session = match popped {
            Some(s) => s,
            None => self.inner.authenticate().await?,
        };

        let session = if session.needs_refresh(self.inner.refresh_threshold_secs) {
            self.inner.refresh_or_reauthenticate(session).await?
        } else {
            session
        };

        Ok(SessionGuard::new(self.inner.clone(), session, permit))
    }

    /// Return a session to the pool. Equivalent to dropping the guard;
    /// exposed explicitly to match the public three-operation contract.
    pub fn release(&self, guard: SessionGuard) {
        drop(guard);
    }

    /// Drop a session the catalogue reported as gone: skips the free list
    /// and logs it out on the transport.
    pub async fn invalidate(&self, guard: SessionGuard) {
        let session = guard.into_invalidated();
        if let Err(e) = self.inner.transport.logout(&session.id).await {
            tracing::warn!(error = %e, session = %session.id, "logout of invalidated session failed");
        }
    }

    /// Periodically refresh idle sessions so an active borrow never
    /// observes an expired one.
    async fn run_maintenance(inner: Arc<PoolInner>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let stale: Vec<Session> = {
                let mut free = inner.free.lock().unwrap_or_else(|p| p.into_inner());
                let mut kept = VecDeque::with_capacity(free.len());
                let mut stale = Vec::new();
                while let Some(session) = free.pop_front() {
                    if session.needs_refresh(inner.refresh_threshold_secs) {
                        stale.push(session);
                    } else {
                        kept.push_back(session);
                    }
                }
                *free = kept;
                stale
            };

            for session in stale {
                match inner.refresh_or_reauthenticate(session).await {
                    Ok(refreshed) => inner.return_session(refreshed),
                    Err(e) => tracing::warn!(error = %e, "background session refresh failed"),
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn free_len(&self) -> usize {
        self.inner.free.lock().unwrap().len()
    }
}
