//! Registration workflow behind a match detail view.
//!
//! A [`MatchDetailView`] loads one match with its players and the viewer's
//! registration status, gates the register/cancel actions, and reloads the
//! whole aggregate after every successful mutation. Counters are never
//! patched locally: the backend is the only source of truth for capacity.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, instrument, warn};

use crate::client::KrewbiClient;
use crate::error::{KrewbiError, Result};
use crate::model::{Fetched, MatchPlayer, MatchWithStats, Position};
use crate::route::Route;
use crate::session::AuthState;

const LOAD_FAILED: &str = "Could not load the match";
const SIGN_IN_REQUIRED: &str = "You must sign in to register";
const AUTH_PENDING: &str = "Still checking your session, try again in a moment";
const NO_SPOTS_LEFT: &str = "No spots left for that position";
const NOT_READY: &str = "The match is not ready yet";
const ALREADY_REGISTERED: &str = "You are already registered for this match";
const NOT_REGISTERED: &str = "You are not registered for this match";
const BUSY: &str = "Another request is still in progress";
const REGISTERED: &str = "You are registered!";
const UNREGISTERED: &str = "Registration cancelled";

/// Where the view is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready { registered: bool },
    NotFound,
}

/// Toast-equivalent message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// What the UI should show or do after a workflow step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notice: Option<Notice>,
    pub redirect: Option<Route>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            notice: Some(Notice::Success(message.into())),
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            notice: Some(Notice::Error(message.into())),
            redirect: None,
        }
    }

    /// A mutation is already in flight for this view.
    pub fn busy() -> Self {
        Self::error(BUSY)
    }

    pub fn redirect_to(mut self, route: Route) -> Self {
        self.redirect = Some(route);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.notice, Some(Notice::Error(_)))
    }
}

/// Which action buttons are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableActions {
    pub register_player: bool,
    pub register_goalkeeper: bool,
    pub cancel: bool,
}

impl AvailableActions {
    pub fn register(&self, position: Position) -> bool {
        match position {
            Position::Player => self.register_player,
            Position::Goalkeeper => self.register_goalkeeper,
        }
    }
}

/// Clears the in-flight flag when a mutation ends, including when its
/// future is dropped mid-request.
struct InFlight<'a>(&'a Mutex<ViewInner>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().registering = false;
    }
}

struct ViewInner {
    state: ViewState,
    details: Option<MatchWithStats>,
    players: Fetched<Vec<MatchPlayer>>,
    registering: bool,
    disposed: bool,
}

/// State machine for one match detail view.
///
/// Clones share state, so a UI can keep one handle for rendering while
/// another drives an action.
#[derive(Clone)]
pub struct MatchDetailView {
    client: KrewbiClient,
    auth: watch::Receiver<AuthState>,
    match_id: Arc<str>,
    inner: Arc<Mutex<ViewInner>>,
}

impl MatchDetailView {
    pub fn new(client: KrewbiClient, auth: watch::Receiver<AuthState>, match_id: &str) -> Self {
        Self {
            client,
            auth,
            match_id: Arc::from(match_id),
            inner: Arc::new(Mutex::new(ViewInner {
                state: ViewState::Loading,
                details: None,
                players: Fetched::Live(Vec::new()),
                registering: false,
                disposed: false,
            })),
        }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub fn state(&self) -> ViewState {
        self.inner.lock().state
    }

    pub fn details(&self) -> Option<MatchWithStats> {
        self.inner.lock().details.clone()
    }

    pub fn players(&self) -> Fetched<Vec<MatchPlayer>> {
        self.inner.lock().players.clone()
    }

    /// Whether a register/cancel request is in flight.
    pub fn is_registering(&self) -> bool {
        self.inner.lock().registering
    }

    pub fn available_actions(&self) -> AvailableActions {
        let inner = self.inner.lock();
        let idle = !inner.registering && !inner.disposed;
        match (inner.state, &inner.details) {
            (ViewState::Ready { registered: false }, Some(details)) => AvailableActions {
                register_player: idle && details.has_spot_for(Position::Player),
                register_goalkeeper: idle && details.has_spot_for(Position::Goalkeeper),
                cancel: false,
            },
            (ViewState::Ready { registered: true }, _) => AvailableActions {
                cancel: idle,
                ..AvailableActions::default()
            },
            _ => AvailableActions::default(),
        }
    }

    /// Mark the view as gone. Responses that arrive afterwards are dropped.
    pub fn dispose(&self) {
        self.inner.lock().disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// Initial load: match, stats and players together, then the viewer's
    /// registration status when signed in. Only acts while `Loading`.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn load(&self) -> Outcome {
        {
            let inner = self.inner.lock();
            if inner.disposed || inner.state != ViewState::Loading {
                debug!(state = ?inner.state, "load ignored");
                return Outcome::none();
            }
        }

        let (details, players) = match self.fetch_aggregate().await {
            Ok(Some(aggregate)) => aggregate,
            Ok(None) => {
                let err = KrewbiError::NotFound {
                    match_id: self.match_id.to_string(),
                };
                warn!(error = %err, "nothing to show");
                return self.commit(
                    Outcome::error(err.user_message()).redirect_to(Route::Home),
                    |v| v.state = ViewState::NotFound,
                );
            }
            Err(e) => {
                error!(error = %e, "failed to load match");
                return self.commit(Outcome::error(LOAD_FAILED), |v| {
                    v.state = ViewState::NotFound
                });
            }
        };

        let registered = if self.settled_auth().await.is_authenticated() {
            self.client.is_registered(&self.match_id).await
        } else {
            false
        };

        self.commit(Outcome::none(), |v| {
            v.details = Some(details);
            v.players = players;
            v.state = ViewState::Ready { registered };
        })
    }

    /// Register the viewer in `position`.
    ///
    /// Rejected locally, without a request, when another mutation is in
    /// flight, when the view is not ready, when the viewer is already
    /// registered, or when the position has no spots left. Without a signed-in
    /// user the outcome redirects to the sign-in page. While the auth state is
    /// still loading this waits for it.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn register(&self, position: Position) -> Outcome {
        let auth = self.settled_auth().await;
        {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return Outcome::none();
            }
            if inner.registering {
                return Outcome::busy();
            }
            match inner.state {
                ViewState::Ready { registered: false } => {}
                ViewState::Ready { registered: true } => return Outcome::error(ALREADY_REGISTERED),
                ViewState::Loading | ViewState::NotFound => return Outcome::error(NOT_READY),
            }
            let has_spot = inner
                .details
                .as_ref()
                .is_some_and(|d| d.has_spot_for(position));
            if !has_spot {
                return Outcome::error(NO_SPOTS_LEFT);
            }
            if auth.loading {
                return Outcome::error(AUTH_PENDING);
            }
            if !auth.is_authenticated() {
                return Outcome::error(SIGN_IN_REQUIRED).redirect_to(Route::login());
            }
            inner.registering = true;
        }
        let in_flight = InFlight(self.inner.as_ref());

        let outcome = match self.client.register(&self.match_id, position).await {
            Ok(()) => {
                self.commit(Outcome::none(), |v| {
                    v.state = ViewState::Ready { registered: true }
                });
                self.refresh().await;
                Outcome::success(REGISTERED)
            }
            Err(e) => failure_outcome(e),
        };

        self.finish_mutation(in_flight, outcome)
    }

    /// Cancel the viewer's registration.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub async fn unregister(&self) -> Outcome {
        {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return Outcome::none();
            }
            if inner.registering {
                return Outcome::busy();
            }
            if inner.state != (ViewState::Ready { registered: true }) {
                return Outcome::error(NOT_REGISTERED);
            }
            inner.registering = true;
        }
        let in_flight = InFlight(self.inner.as_ref());

        let outcome = match self.client.unregister(&self.match_id).await {
            Ok(()) => {
                self.commit(Outcome::none(), |v| {
                    v.state = ViewState::Ready { registered: false }
                });
                self.refresh().await;
                Outcome::success(UNREGISTERED)
            }
            Err(e) => failure_outcome(e),
        };

        self.finish_mutation(in_flight, outcome)
    }

    async fn fetch_aggregate(&self) -> Result<Option<(MatchWithStats, Fetched<Vec<MatchPlayer>>)>> {
        let (details, players) = tokio::join!(
            self.client.get_match(&self.match_id),
            self.client.list_players(&self.match_id)
        );
        Ok(details?.map(|d| (d, players)))
    }

    /// Reload match, stats and players as one unit after a mutation.
    async fn refresh(&self) {
        match self.fetch_aggregate().await {
            Ok(Some((details, players))) => {
                self.commit((), |v| {
                    v.details = Some(details);
                    v.players = players;
                });
            }
            Ok(None) => {
                warn!("match disappeared during refresh");
                self.commit((), |v| v.state = ViewState::NotFound);
            }
            Err(e) => error!(error = %e, "refresh after mutation failed, keeping previous data"),
        }
    }

    fn finish_mutation(&self, in_flight: InFlight<'_>, outcome: Outcome) -> Outcome {
        drop(in_flight);
        if self.is_disposed() {
            Outcome::none()
        } else {
            outcome
        }
    }

    /// The viewer's auth state once it has resolved.
    async fn settled_auth(&self) -> AuthState {
        let mut auth = self.auth.clone();
        let state = match auth.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            // Store gone before resolving; keep whatever it last published.
            Err(_) => self.auth.borrow().clone(),
        };
        state
    }

    /// Apply `update` unless the view was disposed; in that case the response is stale.
    fn commit<T: Default>(&self, result: T, update: impl FnOnce(&mut ViewInner)) -> T {
        let mut inner = self.inner.lock();
        if inner.disposed {
            debug!("view disposed, dropping response");
            return T::default();
        }
        update(&mut inner);
        result
    }
}

fn failure_outcome(err: KrewbiError) -> Outcome {
    match err {
        KrewbiError::Unauthenticated => Outcome::error(SIGN_IN_REQUIRED).redirect_to(Route::login()),
        KrewbiError::AlreadyRegistered
        | KrewbiError::RegistrationFailed { .. }
        | KrewbiError::UnregistrationFailed { .. } => {
            warn!(error = %err, "mutation rejected");
            Outcome::error(err.user_message())
        }
        other => {
            error!(error = %other, "unexpected failure");
            Outcome::error(other.user_message())
        }
    }
}
