//! `Podium` builder: wires one of everything at the application root.
//!
//! ```text
//!            ┌──────────── TokenStore ────────────┐
//!            ▼                                    ▼
//!   RequestExecutor ──→ AuthService ──→ SessionController
//!            │              │                     ▲
//!            ▼              ▼                     │ force_logout (Weak)
//!        ApiClient ── SessionExpiryNotifier ──────┘
//! ```
//!
//! The notifier is created here and handed to both sides, so neither the
//! client nor the controller reaches for a global.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use podium_client::{
    ApiClient, AuthService, ClientConfig, HeaderBuilder, RequestExecutor, SessionExpiryNotifier,
};
use podium_session::{MemoryNavigator, Navigator, SessionConfig, SessionController, SessionState};
use podium_store::{MemoryStorage, Storage, TokenStore, UserMetadataStore};
use podium_transport::{HttpTransport, ReqwestTransport};

use crate::PodiumError;

/// The authenticator the session controller drives in a wired app.
pub type SharedAuth<T> = Arc<AuthService<T>>;

/// Builder for a [`Podium`] instance.
///
/// Everything but the client configuration has a default: in-memory
/// storage, an in-memory navigator starting at `/`, the default
/// [`SessionConfig`] and a [`ReqwestTransport`].
pub struct PodiumBuilder<T: HttpTransport = ReqwestTransport> {
    config: Option<ClientConfig>,
    storage: Option<Arc<dyn Storage>>,
    navigator: Option<Arc<dyn Navigator>>,
    session_config: SessionConfig,
    transport: T,
}

impl PodiumBuilder<ReqwestTransport> {
    pub fn new() -> Self {
        Self {
            config: None,
            storage: None,
            navigator: None,
            session_config: SessionConfig::default(),
            transport: ReqwestTransport::new(),
        }
    }
}

impl Default for PodiumBuilder<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HttpTransport> PodiumBuilder<T> {
    /// Sets the client configuration. Without it, [`build`] reads the
    /// environment.
    ///
    /// [`build`]: PodiumBuilder::build
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets where tokens and operator metadata persist.
    pub fn storage(mut self, storage: impl Storage) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Like [`storage`](PodiumBuilder::storage), for a backend the caller
    /// also keeps a handle to.
    pub fn shared_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Swaps the HTTP transport, e.g. for a scripted one in tests.
    pub fn transport<U: HttpTransport>(self, transport: U) -> PodiumBuilder<U> {
        PodiumBuilder {
            config: self.config,
            storage: self.storage,
            navigator: self.navigator,
            session_config: self.session_config,
            transport,
        }
    }

    /// Wires the stack and registers the session controller as the
    /// session-expired listener.
    ///
    /// # Errors
    /// [`PodiumError::Config`] if no configuration was given and the
    /// environment lacks a required variable.
    pub fn build(self) -> Result<Podium<T>, PodiumError> {
        let config = match self.config {
            Some(config) => config,
            None => ClientConfig::from_env()?,
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));

        let tokens = TokenStore::new(Arc::clone(&storage), config.token_keys.clone());
        let users = UserMetadataStore::new(storage, config.user_keys.clone());
        let notifier = SessionExpiryNotifier::new();

        let executor = Arc::new(RequestExecutor::new(
            config.base_url.clone(),
            HeaderBuilder::new(tokens.clone()),
            self.transport,
        ));
        let auth = Arc::new(AuthService::new(Arc::clone(&executor), tokens.clone()));
        let api = ApiClient::new(executor, Arc::clone(&auth), tokens.clone(), notifier.clone())
            .with_coalesced_refresh(config.coalesce_refresh);
        let session = SessionController::new(
            Arc::clone(&auth),
            tokens.clone(),
            users.clone(),
            navigator,
            self.session_config,
        );
        session.register_expiry_listener(&notifier);

        tracing::info!(
            base_url = %config.base_url,
            coalesce_refresh = config.coalesce_refresh,
            "podium wired"
        );

        Ok(Podium {
            config,
            tokens,
            users,
            notifier,
            auth,
            api,
            session,
            following: AtomicBool::new(false),
        })
    }
}

/// One wired application: API client, session controller and the state
/// they share.
pub struct Podium<T: HttpTransport = ReqwestTransport> {
    config: ClientConfig,
    tokens: TokenStore,
    users: UserMetadataStore,
    notifier: SessionExpiryNotifier,
    auth: SharedAuth<T>,
    api: ApiClient<T, SharedAuth<T>>,
    session: SessionController<SharedAuth<T>>,
    following: AtomicBool,
}

impl Podium<ReqwestTransport> {
    pub fn builder() -> PodiumBuilder<ReqwestTransport> {
        PodiumBuilder::new()
    }
}

impl<T: HttpTransport> Podium<T> {
    /// Settles the session from storage. Call once at start-up, inside
    /// the runtime.
    ///
    /// Also starts forwarding the client's token-refresh announcements to
    /// the controller.
    pub async fn start(&self) -> SessionState {
        if !self.following.swap(true, Ordering::AcqRel) {
            self.session.follow_token_refreshes(self.api.subscribe());
        }
        self.session.restore().await
    }

    /// The client every resource service goes through.
    pub fn api(&self) -> &ApiClient<T, SharedAuth<T>> {
        &self.api
    }

    pub fn session(&self) -> &SessionController<SharedAuth<T>> {
        &self.session
    }

    pub fn auth(&self) -> &AuthService<T> {
        &self.auth
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn users(&self) -> &UserMetadataStore {
        &self.users
    }

    pub fn notifier(&self) -> &SessionExpiryNotifier {
        &self.notifier
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
