//! Auth-provider contract.
//!
//! The synchronization core treats authentication as an external
//! collaborator: something that yields a stable user identity and a stream
//! of login/logout transitions, and that can be told to finalize a logout.
//! [`LocalAuthProvider`] is a watch-channel-backed implementation for
//! embedders and tests; production deployments adapt their identity SDK to
//! the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::Result;

/// The authenticated user as seen by the synchronization core.
///
/// `id` is the stable identifier every folder and note is keyed by;
/// display attributes ride along for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: None,
        }
    }
}

/// Source of user identity and login/logout transitions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Subscribe to user transitions. The receiver's current value is the
    /// last-known user (`None` = signed out).
    fn watch(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Finalize a logout with the identity backend. Called by the core
    /// after local session state has been cleared; no remote data is
    /// deleted.
    async fn log_out(&self) -> Result<()>;
}

/// In-process auth provider backed by a watch channel.
///
/// `sign_in`/`sign_out` drive the stream; `log_out` resolves to a local
/// `sign_out`. Useful for tests and single-process embedders.
pub struct LocalAuthProvider {
    tx: watch::Sender<Option<AuthUser>>,
}

impl LocalAuthProvider {
    /// Create a provider with nobody signed in.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Create a provider with a user already signed in.
    pub fn signed_in(user: AuthUser) -> Self {
        let (tx, _) = watch::channel(Some(user));
        Self { tx }
    }

    /// Publish a signed-in user.
    pub fn sign_in(&self, user: AuthUser) {
        tracing::debug!(
            subsystem = "auth",
            component = "local",
            op = "sign_in",
            user_id = %user.id,
            "User signed in"
        );
        self.tx.send_replace(Some(user));
    }

    /// Publish a signed-out state.
    pub fn sign_out(&self) {
        tracing::debug!(
            subsystem = "auth",
            component = "local",
            op = "sign_out",
            "User signed out"
        );
        self.tx.send_replace(None);
    }

    /// Last-published user.
    pub fn current(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.tx.subscribe()
    }

    async fn log_out(&self) -> Result<()> {
        self.sign_out();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid_utils::new_v7;

    #[tokio::test]
    async fn test_watch_sees_sign_in_and_out() {
        let auth = LocalAuthProvider::new();
        let mut rx = auth.watch();
        assert!(rx.borrow().is_none());

        let user = AuthUser::new(new_v7(), "Alice");
        auth.sign_in(user.clone());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&user));

        auth.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_log_out_clears_current() {
        let auth = LocalAuthProvider::signed_in(AuthUser::new(new_v7(), "Bob"));
        assert!(auth.current().is_some());

        auth.log_out().await.unwrap();
        assert!(auth.current().is_none());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_last_known_user() {
        let auth = LocalAuthProvider::new();
        let user = AuthUser::new(new_v7(), "Carol");
        auth.sign_in(user.clone());

        // Subscribing after the fact still observes the snapshot.
        let rx = auth.watch();
        assert_eq!(rx.borrow().as_ref(), Some(&user));
    }
}
