//! The session controller: the one authoritative view of who is signed in.
//!
//! It owns the in-memory operator and the saved route, drives the
//! [`SessionState`] machine, and is the only place allowed to turn an
//! auth failure into a silent state change (a forced logout).
//!
//! # Wiring
//!
//! ```text
//!   ApiClient ── notify_session_expired() ──→ SessionExpiryNotifier
//!                                                   │ callback (Weak)
//!                                                   ▼
//!                                   SessionController::force_logout()
//!                                                   │
//!                                                   ▼
//!                                   SessionExpiredPrompt + Countdown
//! ```
//!
//! The callback and the countdown only hold weak references, so dropping
//! the last controller handle tears everything down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use podium_client::{AuthEvent, SessionExpiryNotifier};
use podium_protocol::AuthenticatedUser;
use podium_store::{TokenStore, UserMetadataStore};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::countdown::Countdown;
use crate::{
    Authenticator, GuardDecision, LoginOutcome, Navigator, SessionConfig, SessionError,
    SessionState,
};

/// Mutable session data, always read and written under one lock.
#[derive(Debug, Default)]
struct Shared {
    state: SessionState,
    user: Option<AuthenticatedUser>,
    saved_route: Option<String>,
    loading: bool,
    countdown: Option<Countdown>,
    refreshes: u64,
    last_refresh: Option<Instant>,
}

struct Inner<A: Authenticator> {
    auth: A,
    tokens: TokenStore,
    users: UserMetadataStore,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<SessionState>,
}

/// Session lifecycle entry points for the UI.
///
/// Cheap to clone; clones share one session.
pub struct SessionController<A: Authenticator> {
    inner: Arc<Inner<A>>,
}

impl<A: Authenticator> Clone for SessionController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Authenticator> SessionController<A> {
    /// Creates a controller in the loading state. Call [`restore`] once
    /// at start-up to settle it.
    ///
    /// [`restore`]: SessionController::restore
    pub fn new(
        auth: A,
        tokens: TokenStore,
        users: UserMetadataStore,
        navigator: impl Navigator,
        config: SessionConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Arc::new(Inner {
                auth,
                tokens,
                users,
                navigator: Arc::new(navigator),
                config,
                shared: Mutex::new(Shared {
                    loading: true,
                    ..Shared::default()
                }),
                state_tx,
            }),
        }
    }

    // -- Wiring -----------------------------------------------------------

    /// Makes this controller the notifier's session-expired callback,
    /// replacing any previous one.
    pub fn register_expiry_listener(&self, notifier: &SessionExpiryNotifier) {
        let weak = Arc::downgrade(&self.inner);
        notifier.set_session_expired_callback(move || {
            if let Some(inner) = weak.upgrade() {
                inner.force_logout();
            }
        });
    }

    /// Counts token refreshes announced by the API client.
    ///
    /// The task ends when the client is dropped or when the last
    /// controller handle is.
    pub fn follow_token_refreshes(
        &self,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::TokenRefreshed) => match weak.upgrade() {
                        Some(inner) => inner.note_token_refreshed(),
                        None => break,
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "missed token refresh events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // -- Lifecycle --------------------------------------------------------

    /// Settles the start-up state from what storage holds.
    ///
    /// A valid stored access token restores the session with no network
    /// call. Otherwise one refresh is attempted. Either way the stored
    /// operator must be an admin, or everything is cleared.
    pub async fn restore(&self) -> SessionState {
        let inner = &self.inner;
        if inner.tokens.is_access_token_present_and_valid() {
            tracing::debug!("stored access token is valid");
            return inner.hydrate();
        }

        match inner.auth.refresh_token().await {
            Ok(_) => {
                tracing::info!("session restored with a refreshed access token");
                inner.hydrate()
            }
            Err(err) => {
                tracing::info!(error = %err, "no session to restore");
                inner.discard_stored_session();
                inner.settle_unauthenticated();
                SessionState::Unauthenticated
            }
        }
    }

    /// Signs in. Only administrators get a session.
    ///
    /// On success the operator is persisted, the saved route (if any) is
    /// consumed and the navigator is sent there.
    ///
    /// # Errors
    /// - [`SessionError::Api`] with the server's message on bad
    ///   credentials or network failure.
    /// - [`SessionError::Forbidden`] for any role other than `admin`;
    ///   the tokens just issued are discarded.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        let inner = &self.inner;
        {
            let mut shared = inner.lock();
            shared.countdown = None;
            inner.transition(&mut shared, SessionState::Authenticating);
        }

        let grant = match inner.auth.login(email, password).await {
            Ok(grant) => grant,
            Err(err) => {
                tracing::info!(email, error = %err, "login failed");
                inner.settle_unauthenticated();
                return Err(err.into());
            }
        };

        let user = AuthenticatedUser::new(
            grant.email.unwrap_or_else(|| email.to_string()),
            grant.role.unwrap_or_default(),
        );
        if !user.is_admin() {
            tracing::warn!(email = %user.email, role = %user.role, "non-admin login rejected");
            inner.discard_stored_session();
            inner.settle_unauthenticated();
            return Err(SessionError::Forbidden { role: user.role });
        }

        inner.users.save(&user);
        let redirect_to = {
            let mut shared = inner.lock();
            shared.user = Some(user.clone());
            shared.loading = false;
            inner.transition(&mut shared, SessionState::Authenticated);
            shared
                .saved_route
                .take()
                .unwrap_or_else(|| inner.config.default_landing_route.clone())
        };
        tracing::info!(email = %user.email, redirect_to = %redirect_to, "logged in");
        inner.navigator.navigate(&redirect_to);

        Ok(LoginOutcome { user, redirect_to })
    }

    /// Signs out and returns to the entry route.
    pub fn logout(&self) {
        let inner = &self.inner;
        inner.discard_stored_session();
        {
            let mut shared = inner.lock();
            shared.user = None;
            shared.loading = false;
            shared.countdown = None;
            inner.transition(&mut shared, SessionState::Unauthenticated);
        }
        tracing::info!("logged out");
        inner.navigator.navigate(&inner.config.entry_route);
    }

    /// Ends a session the server no longer honours and opens the
    /// session-expired prompt. Normally only called through the notifier.
    pub fn force_logout(&self) {
        self.inner.force_logout();
    }

    /// Closes the session-expired prompt early and returns to the entry
    /// route. Does nothing outside the prompt.
    pub fn acknowledge_session_expired(&self) {
        self.inner.acknowledge();
    }

    // -- Saved route ------------------------------------------------------

    /// Remembers the current route for the next login, unless it is the
    /// public entry route.
    pub fn save_current_route(&self) {
        let route = self.inner.navigator.current_route();
        if self.inner.config.is_protected(&route) {
            tracing::debug!(route, "saving route for after relogin");
            self.inner.lock().saved_route = Some(route);
        }
    }

    /// Returns the saved route once; later calls get `None`.
    pub fn get_and_clear_saved_route(&self) -> Option<String> {
        self.inner.lock().saved_route.take()
    }

    // -- Queries ----------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.inner.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().user.is_some()
    }

    /// `true` until [`restore`](SessionController::restore) has settled.
    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    /// What a protected page should render.
    pub fn guard(&self) -> GuardDecision {
        let shared = self.inner.lock();
        if shared.loading {
            return GuardDecision::Loading;
        }
        match &shared.user {
            Some(user) => GuardDecision::Allow(user.clone()),
            None => GuardDecision::RequireLogin,
        }
    }

    /// Follows state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Seconds left on the session-expired prompt, if it is counting.
    pub fn relogin_countdown(&self) -> Option<watch::Receiver<u64>> {
        self.inner.lock().countdown.as_ref().map(Countdown::subscribe)
    }

    /// How many refreshes the API client has announced, and when the last
    /// one happened.
    pub fn token_refreshes(&self) -> (u64, Option<Instant>) {
        let shared = self.inner.lock();
        (shared.refreshes, shared.last_refresh)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }
}

impl<A: Authenticator> std::fmt::Debug for SessionController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("SessionController")
            .field("state", &shared.state)
            .field("user", &shared.user)
            .field("loading", &shared.loading)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Inner
// ---------------------------------------------------------------------------

impl<A: Authenticator> Inner<A> {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, shared: &mut Shared, next: SessionState) {
        let previous = shared.state;
        if previous != next {
            tracing::info!(from = %previous, to = %next, "session state changed");
        }
        shared.state = next;
        self.state_tx.send_replace(next);
    }

    /// Clears tokens and remembered operator. Storage only.
    fn discard_stored_session(&self) {
        self.auth.logout();
        self.users.clear();
    }

    fn settle_unauthenticated(&self) {
        let mut shared = self.lock();
        shared.user = None;
        shared.loading = false;
        self.transition(&mut shared, SessionState::Unauthenticated);
    }

    /// Loads the remembered operator, admins only.
    fn hydrate(&self) -> SessionState {
        match self.users.load() {
            Some(user) if user.is_admin() => {
                tracing::info!(email = %user.email, "session restored");
                let mut shared = self.lock();
                shared.user = Some(user);
                shared.loading = false;
                self.transition(&mut shared, SessionState::Authenticated);
                SessionState::Authenticated
            }
            stored => {
                tracing::warn!(
                    role = stored.as_ref().map(|u| u.role.as_str()).unwrap_or("<none>"),
                    "stored operator is not an admin, clearing session"
                );
                self.discard_stored_session();
                self.settle_unauthenticated();
                SessionState::Unauthenticated
            }
        }
    }

    fn force_logout(self: &Arc<Self>) {
        let current = self.navigator.current_route();
        self.discard_stored_session();

        let mut shared = self.lock();
        if shared.state != SessionState::Authenticated {
            tracing::debug!(state = %shared.state, "forced logout outside a session, storage cleared");
            return;
        }

        tracing::warn!(route = %current, "session expired, forcing logout");
        if self.config.is_protected(&current) {
            shared.saved_route = Some(current);
        }
        shared.user = None;
        self.transition(&mut shared, SessionState::SessionExpiredPrompt);
        shared.countdown = self.start_countdown();
    }

    fn start_countdown(self: &Arc<Self>) -> Option<Countdown> {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::debug!("no runtime, session-expired prompt waits for acknowledgment");
            return None;
        }
        let weak = Arc::downgrade(self);
        Some(Countdown::start(
            self.config.relogin_countdown_secs,
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.acknowledge();
                }
            },
        ))
    }

    fn acknowledge(&self) {
        {
            let mut shared = self.lock();
            if shared.state != SessionState::SessionExpiredPrompt {
                return;
            }
            shared.countdown = None;
            self.transition(&mut shared, SessionState::Unauthenticated);
        }
        tracing::info!("session-expired prompt acknowledged");
        self.navigator.navigate(&self.config.entry_route);
    }

    fn note_token_refreshed(&self) {
        let mut shared = self.lock();
        shared.refreshes += 1;
        shared.last_refresh = Some(Instant::now());
        tracing::debug!(refreshes = shared.refreshes, "access token refreshed");
    }
}
