//! Shared fixtures for the session controller tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use podium_client::{ApiError, AuthError, HttpError, LoginGrant, SessionExpiryNotifier};
use podium_protocol::{AuthenticatedUser, TokenPair};
use podium_session::{
    Authenticator, MemoryNavigator, Navigator, SessionConfig, SessionController,
};
use podium_store::{MemoryStorage, TokenKeys, TokenStore, UserKeys, UserMetadataStore};

// =========================================================================
// ScriptedAuthenticator
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginScript {
    /// Issues tokens `A`/`R` for the given role.
    Grant(&'static str),
    /// Answers 401 like the backend does for bad credentials.
    BadCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScript {
    /// Mints access token `B` if a refresh token is stored.
    Succeed,
    /// The refresh token is rejected.
    Reject,
}

/// An [`Authenticator`] that follows a script and counts its calls.
///
/// Like the real service, it writes tokens through the token store.
pub struct ScriptedAuthenticator {
    tokens: TokenStore,
    login: Mutex<LoginScript>,
    refresh: Mutex<RefreshScript>,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl ScriptedAuthenticator {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens,
            login: Mutex::new(LoginScript::Grant("admin")),
            refresh: Mutex::new(RefreshScript::Succeed),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn script_login(&self, script: LoginScript) {
        *self.login.lock().unwrap() = script;
    }

    pub fn script_refresh(&self, script: RefreshScript) {
        *self.refresh.lock().unwrap() = script;
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

fn http_401(detail: &str) -> ApiError {
    HttpError {
        status: 401,
        message: format!("(401) {detail}"),
        data: serde_json::json!({ "detail": detail }),
    }
    .into()
}

impl Authenticator for ScriptedAuthenticator {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginGrant, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let script = *self.login.lock().unwrap();
        match script {
            LoginScript::Grant(role) => {
                self.tokens.set_tokens("A", Some("R"));
                Ok(LoginGrant {
                    tokens: TokenPair::new("A", "R"),
                    email: Some(email.to_string()),
                    role: Some(role.to_string()),
                })
            }
            LoginScript::BadCredentials => Err(http_401(
                "No active account found with the given credentials",
            )),
        }
    }

    async fn refresh_token(&self) -> Result<TokenPair, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let refresh = self
            .tokens
            .refresh_token()
            .ok_or(AuthError::MissingRefreshToken)?;
        let script = *self.refresh.lock().unwrap();
        match script {
            RefreshScript::Succeed => {
                self.tokens.set_tokens("B", None);
                Ok(TokenPair::new("B", refresh))
            }
            RefreshScript::Reject => Err(http_401("Token is invalid or expired")),
        }
    }

    fn logout(&self) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.clear_tokens();
    }
}

// =========================================================================
// Harness
// =========================================================================

pub type TestController = SessionController<Arc<ScriptedAuthenticator>>;

pub struct Harness {
    pub tokens: TokenStore,
    pub users: UserMetadataStore,
    pub auth: Arc<ScriptedAuthenticator>,
    pub navigator: MemoryNavigator,
    pub notifier: SessionExpiryNotifier,
    pub controller: TestController,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(
            storage.clone(),
            TokenKeys::new("auth_token", "auth_refresh_token"),
        );
        let users = UserMetadataStore::new(storage, UserKeys::default());
        let auth = Arc::new(ScriptedAuthenticator::new(tokens.clone()));
        let navigator = MemoryNavigator::default();
        let notifier = SessionExpiryNotifier::new();
        let controller = SessionController::new(
            Arc::clone(&auth),
            tokens.clone(),
            users.clone(),
            navigator.clone(),
            config,
        );
        controller.register_expiry_listener(&notifier);
        Self {
            tokens,
            users,
            auth,
            navigator,
            notifier,
            controller,
        }
    }

    /// Stores a session as a previous run would have left it.
    pub fn remember(&self, access: &str, role: &str) {
        self.tokens.set_tokens(access, Some("R"));
        self.users
            .save(&AuthenticatedUser::new("chef@paris2024.fr", role));
    }

    /// Logs in as admin and browses to `route`.
    pub async fn signed_in_at(&self, route: &str) {
        self.controller
            .login("chef@paris2024.fr", "motdepasse")
            .await
            .unwrap();
        self.navigator.navigate(route);
    }
}

/// A JWT-shaped token whose `exp` is `exp`. The signature is junk.
pub fn jwt_with_exp(exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"user_id":1}}"#));
    format!("{header}.{claims}.c2ln")
}

pub const LONG_AGO: u64 = 1_000_000_000;
pub const FAR_FUTURE: u64 = 4_000_000_000;
