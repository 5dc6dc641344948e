//! Session lifecycle: login routing, token validation, forced logout.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::backend::{AuthBackend, BackendError, BackendResult, ManagerBackend, TokenStore};
use crate::models::{Credentials, Role, User};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// A persisted token is being validated.
    Checking,
    Authenticated,
}

/// Cloned view of the session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub auth: AuthState,
    pub user: Option<User>,
    pub error: Option<String>,
    /// A login request is in flight.
    pub is_loading: bool,
    /// A token validation is in flight.
    pub is_auth_loading: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            user: None,
            error: None,
            is_loading: false,
            is_auth_loading: false,
        }
    }
}

/// Session controller over the shared token store.
///
/// Admin logins go to the auth backend with the role in the payload; any
/// other role goes to the blood-manager login endpoint without one.
pub struct SessionStore {
    auth: Arc<dyn AuthBackend>,
    managers: Arc<dyn ManagerBackend>,
    tokens: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
    // Single-flight guard for token validation.
    validation: tokio::sync::Mutex<()>,
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        managers: Arc<dyn ManagerBackend>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            auth,
            managers,
            tokens,
            state: RwLock::new(SessionState::default()),
            validation: tokio::sync::Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        self.state.write().unwrap().error = None;
    }

    /// Authenticate and persist the returned token.
    pub async fn login(&self, credentials: &Credentials) -> BackendResult<User> {
        {
            let mut state = self.state.write().unwrap();
            state.is_loading = true;
            state.error = None;
        }

        let outcome = match credentials.role {
            Role::Admin => self.auth.login(credentials).await,
            _ => {
                self.managers
                    .login(&credentials.email, &credentials.password)
                    .await
            }
        };

        match outcome {
            Ok(login) => {
                self.tokens.save(&login.access_token);
                debug!(email = %login.user.email, "login succeeded");
                let mut state = self.state.write().unwrap();
                state.auth = AuthState::Authenticated;
                state.user = Some(login.user.clone());
                state.is_loading = false;
                Ok(login.user)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                let mut state = self.state.write().unwrap();
                state.auth = AuthState::Unauthenticated;
                state.user = None;
                state.error = Some(err.to_string());
                state.is_loading = false;
                Err(err)
            }
        }
    }

    /// Clear the session and the persisted token.
    pub fn logout(&self) {
        self.tokens.clear();
        *self.state.write().unwrap() = SessionState::default();
    }

    /// Hook target for the HTTP layer's 401/403 handling. The token is
    /// already cleared by the client at that point.
    pub fn force_logout(&self) {
        warn!("session expired, forcing logout");
        self.tokens.clear();
        *self.state.write().unwrap() = SessionState::default();
    }

    /// Startup pass: validate any persisted token.
    pub async fn initialize(&self) -> BackendResult<bool> {
        self.check_auth().await
    }

    /// Validate the persisted token against the auth backend.
    ///
    /// At most one validation runs at a time: a second caller awaits the
    /// in-flight pass and reports its outcome without a duplicate backend
    /// call. A transport failure keeps the token (the backend being down
    /// says nothing about token validity); only an explicit rejection
    /// clears it.
    pub async fn check_auth(&self) -> BackendResult<bool> {
        let Some(token) = self.tokens.load() else {
            let mut state = self.state.write().unwrap();
            state.auth = AuthState::Unauthenticated;
            state.user = None;
            state.is_auth_loading = false;
            return Ok(false);
        };

        let _guard = match self.validation.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // Another validation is in flight; wait for it and report
                // the state it produced.
                let _wait = self.validation.lock().await;
                return Ok(self.snapshot().is_authenticated());
            }
        };

        let previous = {
            let mut state = self.state.write().unwrap();
            let previous = (state.auth, state.user.clone());
            state.auth = AuthState::Checking;
            state.is_auth_loading = true;
            previous
        };

        match self.auth.verify_token(&token).await {
            Ok(user) => {
                debug!(email = %user.email, "token validated");
                let mut state = self.state.write().unwrap();
                state.auth = AuthState::Authenticated;
                state.user = Some(user);
                state.error = None;
                state.is_auth_loading = false;
                Ok(true)
            }
            Err(BackendError::Network(err)) => {
                warn!(error = %err, "token validation unreachable, keeping token");
                let mut state = self.state.write().unwrap();
                state.auth = previous.0;
                state.user = previous.1;
                state.is_auth_loading = false;
                Err(BackendError::Network(err))
            }
            Err(err) => {
                debug!(error = %err, "token rejected, clearing it");
                self.tokens.clear();
                let mut state = self.state.write().unwrap();
                state.auth = AuthState::Unauthenticated;
                state.user = None;
                state.is_auth_loading = false;
                Ok(false)
            }
        }
    }
}
