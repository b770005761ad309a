//! Session supervisor.
//!
//! [`SyncCore`] binds the auth provider's login/logout stream to session
//! lifecycle: a [`SyncSession`] is constructed and bootstrapped when a user
//! signs in, republished to subscribers, and torn down (local state only)
//! when the user signs out. A repeated event for the same user id is a
//! no-op.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use quire_core::{AuthProvider, AuthUser, Error, Gateway, Result};

use crate::config::SyncConfig;
use crate::session::SyncSession;
use crate::state::Published;

/// Supervisor owning the auth subscription and the current session.
pub struct SyncCore {
    session: Arc<Published<Option<SyncSession>>>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncCore {
    /// Start the supervisor. If a user is already signed in, a session is
    /// built for them immediately.
    pub fn start(auth: Arc<dyn AuthProvider>, gateway: Gateway, config: SyncConfig) -> Self {
        let session: Arc<Published<Option<SyncSession>>> = Arc::new(Published::new(None));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let published = session.clone();
        let task = tokio::spawn(async move {
            let mut users = auth.watch();
            let mut current_user: Option<Uuid> = None;

            // A user may already be signed in when the core starts.
            let initial = users.borrow_and_update().clone();
            if let Some(user) = initial {
                current_user = Some(user.id);
                build_session(&published, &gateway, &config, &user).await;
            }

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(
                            subsystem = "sync",
                            component = "core",
                            op = "shutdown",
                            "Supervisor stopping"
                        );
                        break;
                    }
                    changed = users.changed() => {
                        if changed.is_err() {
                            // Auth provider dropped; nothing more to supervise.
                            break;
                        }
                        let user = users.borrow_and_update().clone();
                        match user {
                            Some(user) if current_user != Some(user.id) => {
                                current_user = Some(user.id);
                                build_session(&published, &gateway, &config, &user).await;
                            }
                            Some(_) => {
                                // Same user re-published; nothing to do.
                            }
                            None => {
                                if current_user.take().is_some() {
                                    teardown_session(&published, auth.as_ref()).await;
                                }
                            }
                        }
                    }
                }
            }
        });

        Self {
            session,
            shutdown_tx,
            task,
        }
    }

    /// Snapshot of the current session, if a user is signed in.
    pub fn session(&self) -> Option<SyncSession> {
        self.session.get()
    }

    /// Subscribe to session transitions (login publishes `Some`, logout
    /// publishes `None`).
    pub fn watch_session(&self) -> watch::Receiver<Option<SyncSession>> {
        self.session.subscribe()
    }

    /// Signal the supervisor to stop. Published state is left as-is.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".to_string()))?;
        Ok(())
    }

    /// True once the supervisor task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn build_session(
    published: &Published<Option<SyncSession>>,
    gateway: &Gateway,
    config: &SyncConfig,
    user: &AuthUser,
) {
    info!(
        subsystem = "sync",
        component = "core",
        op = "login",
        user_id = %user.id,
        "Constructing session"
    );

    let session = SyncSession::new(gateway.clone(), user.id, config);
    if let Err(e) = session.bootstrap().await {
        warn!(
            subsystem = "sync",
            component = "core",
            op = "login",
            user_id = %user.id,
            error = %e,
            "Session bootstrap failed; session published empty"
        );
    }
    published.set(Some(session));
}

async fn teardown_session(published: &Published<Option<SyncSession>>, auth: &dyn AuthProvider) {
    if let Some(session) = published.get() {
        session.clear_local_state();
    }
    published.set(None);

    // Local reset only; the provider finalizes the logout. No remote
    // deletion occurs.
    if let Err(e) = auth.log_out().await {
        warn!(
            subsystem = "sync",
            component = "core",
            op = "logout",
            error = %e,
            "Auth provider logout failed"
        );
    }
    info!(
        subsystem = "sync",
        component = "core",
        op = "logout",
        "Session torn down"
    );
}
