use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use crate::api::{self, Backend};
use crate::config::ClientConfig;
use crate::error::{KrewbiError, Result};
use crate::model::*;

const AUTH_EVENT_CAPACITY: usize = 16;

/// The main entry point for talking to the Krewbi backend.
///
/// `KrewbiClient` wraps a [`reqwest::Client`], holds the current session, and
/// publishes every session change on an auth event stream. It is cheap to
/// clone; clones share the session and the stream.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> krewbi::Result<()> {
/// use krewbi::{ClientConfig, KrewbiClient};
///
/// let client = KrewbiClient::new(ClientConfig::from_env()?);
/// let matches = client.list_active_matches().await?;
/// println!("Found {} upcoming matches", matches.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KrewbiClient {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Backend,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl KrewbiClient {
    /// Create a new client with default HTTP settings.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need to configure timeouts, proxies, headers, etc.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend: Backend::new(client, config),
                session: RwLock::new(None),
                events,
            }),
        }
    }

    /// Create a client from `KREWBI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.backend.config()
    }

    // -- session ----------------------------------------------------------

    /// The session currently held by this client, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().clone()
    }

    /// Install a session obtained elsewhere (e.g. restored from storage).
    pub fn set_session(&self, session: Session) {
        self.store_session(AuthEventKind::SignedIn, session);
    }

    /// Subscribe to session changes. Events sent before subscribing are not replayed.
    pub fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn require_session(&self) -> Result<Session> {
        self.session().ok_or(KrewbiError::Unauthenticated)
    }

    fn store_session(&self, kind: AuthEventKind, session: Session) {
        *self.inner.session.write() = Some(session.clone());
        self.emit(kind, Some(session));
    }

    fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        // No subscribers is fine.
        let _ = self.inner.events.send(AuthEvent { kind, session });
    }

    // -- auth -------------------------------------------------------------

    /// The signed-in user as the auth service currently sees it, or `None` without a session.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Option<User>> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        api::auth::get_user(self.backend(), &token).await.map(Some)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = api::auth::sign_in_with_password(self.backend(), email, password).await?;
        self.store_session(AuthEventKind::SignedIn, session.clone());
        Ok(session)
    }

    /// Build the redirect for an OAuth sign-in. Keep the returned verifier for
    /// [`exchange_code_for_session`](Self::exchange_code_for_session).
    pub fn oauth_authorize(&self, provider: OAuthProvider) -> Result<OAuthRedirect> {
        api::auth::authorize(self.backend(), provider)
    }

    /// Trade the `code` from an auth callback for a session.
    #[instrument(skip_all)]
    pub async fn exchange_code_for_session(&self, code: &str, code_verifier: &str) -> Result<Session> {
        let session = api::auth::exchange_code(self.backend(), code, code_verifier).await?;
        self.store_session(AuthEventKind::SignedIn, session.clone());
        Ok(session)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome> {
        let outcome = api::auth::sign_up(self.backend(), &request).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.store_session(AuthEventKind::SignedIn, session.clone());
        }
        Ok(outcome)
    }

    /// Revoke the session on the backend and forget it locally.
    ///
    /// The local session is cleared and `SignedOut` is published even when the
    /// revoke call fails; the error is still returned.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let previous = self.inner.session.write().take();
        let result = match previous {
            Some(session) => api::auth::sign_out(self.backend(), &session.access_token).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "sign-out request failed, session cleared locally");
        }
        self.emit(AuthEventKind::SignedOut, None);
        result
    }

    /// Ask the backend to email a password reset link.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        api::auth::reset_password(self.backend(), email).await
    }

    #[instrument(skip(self, new_password))]
    pub async fn update_password(&self, new_password: &str) -> Result<User> {
        let mut session = self.require_session()?;
        let user =
            api::auth::update_password(self.backend(), &session.access_token, new_password).await?;
        session.user = user.clone();
        self.store_session(AuthEventKind::UserUpdated, session);
        Ok(user)
    }

    /// Save the user's name and phone number, then refresh the stored user.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, profile: ProfileUpdate) -> Result<User> {
        let mut session = self.require_session()?;
        let user = api::auth::update_profile(self.backend(), &session.access_token, &profile).await?;
        session.user = user.clone();
        self.store_session(AuthEventKind::UserUpdated, session);
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn resend_confirmation(&self, email: &str) -> Result<()> {
        api::auth::resend_confirmation(self.backend(), email).await
    }

    /// Exchange the refresh token for a new session.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<Session> {
        let current = self.require_session()?;
        let session = api::auth::refresh(self.backend(), &current.refresh_token).await?;
        self.store_session(AuthEventKind::TokenRefreshed, session.clone());
        Ok(session)
    }

    // -- matches ----------------------------------------------------------

    /// Active matches from today (UTC) onwards, soonest first, each with a stats snapshot.
    pub async fn list_active_matches(&self) -> Result<MatchList> {
        self.list_active_matches_from(Utc::now().date_naive()).await
    }

    /// Active matches scheduled on or after `from`.
    #[instrument(skip(self))]
    pub async fn list_active_matches_from(&self, from: NaiveDate) -> Result<MatchList> {
        let token = self.access_token();
        api::matches::list_active_matches(self.backend(), token.as_deref(), from).await
    }

    /// A match with its stats snapshot, or `None` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get_match(&self, match_id: &str) -> Result<Option<MatchWithStats>> {
        let token = self.access_token();
        api::matches::get_match(self.backend(), token.as_deref(), match_id).await
    }

    /// Registered participants. Never fails; degraded results are tagged.
    #[instrument(skip(self))]
    pub async fn list_players(&self, match_id: &str) -> Fetched<Vec<MatchPlayer>> {
        let token = self.access_token();
        api::players::list_players(self.backend(), token.as_deref(), match_id).await
    }

    /// Register the signed-in user. Does not refresh stats.
    #[instrument(skip(self))]
    pub async fn register(&self, match_id: &str, position: Position) -> Result<()> {
        let session = self.require_session()?;
        api::registrations::insert(self.backend(), &session, match_id, position).await
    }

    /// Remove the signed-in user's registration.
    #[instrument(skip(self))]
    pub async fn unregister(&self, match_id: &str) -> Result<()> {
        let session = self.require_session()?;
        api::registrations::delete(self.backend(), &session, match_id).await
    }

    /// Whether the signed-in user is registered.
    ///
    /// Returns `false` without a session and on any query error, so a `false`
    /// may be a false negative.
    #[instrument(skip(self))]
    pub async fn is_registered(&self, match_id: &str) -> bool {
        let Some(session) = self.session() else {
            return false;
        };
        match api::registrations::exists(self.backend(), &session, match_id).await {
            Ok(registered) => registered,
            Err(e) => {
                warn!(error = %e, "registration check failed, reporting not registered");
                false
            }
        }
    }
}
