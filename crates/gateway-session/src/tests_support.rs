//! In-process fake of [`crate::transport::CatalogueTransport`] shared by
//! this crate's own tests.

use crate::error::{Result, SessionError};
use crate::transport::{CatalogueTransport, IssuedSession};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeTransport {
    next_id: AtomicU64,
    pub(crate) default_lifetime_secs: i64,
    pub(crate) fail_login: Mutex<bool>,
    pub(crate) logged_out: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn with_lifetime(lifetime_secs: i64) -> Self {
        Self {
            default_lifetime_secs: lifetime_secs,
            ..Default::default()
        }
    }
}

#[async_trait]
impl CatalogueTransport for FakeTransport {
    async fn login(&self, _mechanism: &str, username: &str, _password: &str) -> Result<IssuedSession> {
        if *self.fail_login.lock().unwrap() {
            return Err(SessionError::AuthenticationFailed(username.to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let lifetime = if self.default_lifetime_secs == 0 {
            3600
        } else {
            self.default_lifetime_secs
        };
        Ok(IssuedSession {
            session_id: format!("fake-session-{id}"),
            lifetime_secs: lifetime,
        })
    }

    async fn refresh(&self, session_id: &str) -> Result<IssuedSession> {
        let lifetime = if self.default_lifetime_secs == 0 {
            3600
        } else {
            self.default_lifetime_secs
        };
        Ok(IssuedSession {
            session_id: session_id.to_string(),
            lifetime_secs: lifetime,
        })
    }

    async fn logout(&self, session_id: &str) -> Result<()> {
        self.logged_out.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}
