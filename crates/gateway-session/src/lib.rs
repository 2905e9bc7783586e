//! C3: a pooled, auto-refreshing catalogue session client.
//!
//! Unlike this codebase's previous JWT-validation crate, there is no bearer
//! token to verify locally — the catalogue itself is the identity provider.
//! This crate instead owns the session *lifecycle*: authenticating,
//! pooling, refreshing, and releasing the opaque session ids the catalogue
//! issues.
//!
//! # Layout
//!
//! - [`transport`] - the login/refresh/logout calls, behind a trait
//! - [`session`] - a single session's id and remaining lifetime
//! - [`pool`] - the bounded pool: borrow/release/invalidate
//! - [`guard`] - the RAII guard `borrow()` returns
//! - [`cache`] - the bounded authenticator cache for explicit logins
//! - [`error`] - this crate's own narrow error type

pub mod cache;
pub mod error;
pub mod guard;
pub mod pool;
pub mod session;
pub mod transport;

#[cfg(test)]
mod tests_support;

pub use cache::AuthenticatorCache;
pub use error::{Result, SessionError};
pub use guard::SessionGuard;
pub use pool::SessionPool;
pub use session::Session;
pub use transport::{CatalogueTransport, IssuedSession, ReqwestTransport};
