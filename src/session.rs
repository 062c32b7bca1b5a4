//! Application-wide auth state, mirrored from the client's session events.
//!
//! An [`AuthStore`] is created once at startup and handed to whatever needs to
//! gate on the signed-in user. It resolves the initial user with a one-shot
//! fetch, then overwrites its state on every [`AuthEvent`](crate::AuthEvent)
//! until it is shut down.

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::KrewbiClient;
use crate::model::User;
use crate::route::Route;

/// Snapshot of who is signed in.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    /// `true` until the first answer is known. While loading the user is unknown,
    /// not absent.
    pub loading: bool,
}

impl AuthState {
    fn unresolved() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    fn resolved(user: Option<User>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Owns the subscription to the client's auth events.
pub struct AuthStore {
    client: KrewbiClient,
    state: Arc<watch::Sender<AuthState>>,
    listener: Option<JoinHandle<()>>,
}

impl AuthStore {
    /// Subscribe to auth events, fetch the current user, and keep the state in
    /// sync until [`shutdown`](Self::shutdown). Must be called inside a tokio runtime.
    pub fn start(client: KrewbiClient) -> Self {
        let (state, _) = watch::channel(AuthState::unresolved());
        let state = Arc::new(state);

        // Subscribe before the initial fetch so no change can slip between them.
        let mut events = client.subscribe_auth_events();
        let listener = {
            let client = client.clone();
            let state = state.clone();
            tokio::spawn(async move {
                let user = resolve_user(&client).await;
                state.send_replace(AuthState::resolved(user));

                loop {
                    match events.recv().await {
                        Ok(event) => {
                            debug!(kind = %event.kind, "auth state change");
                            state.send_replace(AuthState::resolved(event.session.map(|s| s.user)));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "auth listener lagged, resyncing from client");
                            let user = client.session().map(|s| s.user);
                            state.send_replace(AuthState::resolved(user));
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        Self {
            client,
            state,
            listener: Some(listener),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait until the initial user is known and return that state.
    pub async fn ready(&self) -> AuthState {
        let mut rx = self.watch();
        let state = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            // Sender lives in `self`, so this only happens mid-teardown.
            Err(_) => self.state(),
        };
        state
    }

    /// Re-fetch the current user from the auth service.
    pub async fn refresh_user(&self) {
        self.state.send_modify(|s| s.loading = true);
        let user = resolve_user(&self.client).await;
        self.state.send_replace(AuthState::resolved(user));
    }

    /// Stop listening for auth events. State is left as it was.
    pub fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            debug!("auth store stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn resolve_user(client: &KrewbiClient) -> Option<User> {
    match client.current_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "could not load current user");
            None
        }
    }
}

/// What a protected view should do for a given auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state still loading; render a placeholder, do not redirect.
    Pending,
    /// Signed in; render the protected content.
    Allow,
    /// Not signed in; navigate here. Returned once per guard.
    Redirect(Route),
    /// Not signed in and the redirect was already issued; render nothing.
    Blocked,
}

/// Gate for views that require a signed-in user.
#[derive(Debug, Default)]
pub struct AuthGuard {
    redirected: bool,
}

impl AuthGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, state: &AuthState) -> GuardDecision {
        if state.loading {
            return GuardDecision::Pending;
        }
        if state.is_authenticated() {
            self.redirected = false;
            return GuardDecision::Allow;
        }
        if self.redirected {
            GuardDecision::Blocked
        } else {
            self.redirected = true;
            GuardDecision::Redirect(Route::login())
        }
    }
}
