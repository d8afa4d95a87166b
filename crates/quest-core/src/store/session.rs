//! ============================================================================
//! Session Store - the authenticated identity and its loading/error state
//! ============================================================================
//! Holds at most one user. The user's id is persisted in `SessionDb` so a
//! later start can restore the session silently. Any failure that puts the
//! session in doubt clears both the in-memory user and the persisted id.
//! ============================================================================

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::{read_lock, write_lock};
use crate::api::Backend;
use crate::db::SessionDb;
use crate::types::{LoginRequest, ProfileUpdate, QuestError, RegisterRequest, Result, User};
use crate::validate;

/// Observable session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<QuestError>,
}

pub struct SessionStore {
    backend: Arc<dyn Backend>,
    db: Arc<SessionDb>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>, db: Arc<SessionDb>) -> Self {
        Self {
            backend,
            db,
            state: RwLock::new(SessionState::default()),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn snapshot(&self) -> SessionState {
        read_lock(&self.state).clone()
    }

    pub fn current_user(&self) -> Option<User> {
        read_lock(&self.state).user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        read_lock(&self.state).user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        read_lock(&self.state).loading
    }

    pub fn last_error(&self) -> Option<QuestError> {
        read_lock(&self.state).error.clone()
    }

    /// The acting user, or `NoActiveUser`
    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(QuestError::NoActiveUser)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Restore a persisted session, if any. Never fails: a session that
    /// cannot be restored is treated as no session.
    pub async fn restore(&self) -> Option<User> {
        let user_id = match self.db.session_user_id() {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!("No persisted session to restore");
                self.set_state(None, None);
                return None;
            }
            Err(e) => {
                warn!("Could not read persisted session: {}", e);
                self.set_state(None, Some(e));
                return None;
            }
        };

        self.begin_loading();
        match self.backend.fetch_user(user_id).await {
            Ok(user) => {
                info!("Restored session for user {}", user.id);
                self.set_state(Some(user.clone()), None);
                Some(user)
            }
            Err(e) => {
                warn!("Session restore for user {} failed: {}", user_id, e);
                self.forget_persisted();
                self.set_state(None, Some(e));
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        validate::validate_credentials(email, password).map_err(|e| self.fail_session(e))?;

        let credentials = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        self.begin_loading();
        match self.backend.authenticate(&credentials).await {
            Ok(user) => Ok(self.establish(user)),
            Err(e) => Err(self.fail_session(e)),
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        validate::validate_name(name)
            .and_then(|_| validate::validate_email(email))
            .and_then(|_| validate::validate_password(password))
            .map_err(|e| self.fail_session(e))?;

        let registration = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        self.begin_loading();
        match self.backend.register_user(&registration).await {
            Ok(user) => Ok(self.establish(user)),
            Err(e) => Err(self.fail_session(e)),
        }
    }

    /// Drop the session locally. Idempotent, no network call.
    pub fn logout(&self) {
        let was_authenticated = self.is_authenticated();
        self.forget_persisted();
        self.set_state(None, None);
        if was_authenticated {
            info!("Logged out");
        }
    }

    /// Re-fetch the user by the known id (memory first, then durable
    /// storage). Without a known id this fails with `NoActiveUser` and
    /// makes no request.
    pub async fn reload_user(&self) -> Result<User> {
        let known_id = match self.current_user() {
            Some(user) => Some(user.id),
            None => self.db.session_user_id().unwrap_or_else(|e| {
                warn!("Could not read persisted session: {}", e);
                None
            }),
        };

        let Some(user_id) = known_id else {
            return Err(self.fail_local(QuestError::NoActiveUser));
        };

        self.begin_loading();
        match self.backend.fetch_user(user_id).await {
            Ok(user) => {
                debug!("Reloaded user {}", user.id);
                self.set_state(Some(user.clone()), None);
                Ok(user)
            }
            Err(e) => Err(self.fail_session(e)),
        }
    }

    /// Update profile fields. The returned record replaces the user whole.
    /// A failed update keeps the current session.
    pub async fn update_profile(&self, changes: &ProfileUpdate) -> Result<User> {
        let user = self.require_user().map_err(|e| self.fail_local(e))?;

        let checked = if changes.is_empty() {
            Err(QuestError::Validation("nothing to update".into()))
        } else {
            changes
                .name
                .as_deref()
                .map_or(Ok(()), validate::validate_name)
                .and_then(|_| changes.email.as_deref().map_or(Ok(()), validate::validate_email))
                .and_then(|_| changes.password.as_deref().map_or(Ok(()), validate::validate_password))
        };
        checked.map_err(|e| self.fail_local(e))?;

        self.begin_loading();
        match self.backend.update_user(user.id, changes).await {
            Ok(updated) => {
                info!("Updated profile for user {}", updated.id);
                self.set_state(Some(updated.clone()), None);
                Ok(updated)
            }
            Err(e) => {
                let mut state = write_lock(&self.state);
                state.loading = false;
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn establish(&self, user: User) -> User {
        if let Err(e) = self.db.save_session(user.id) {
            warn!("Logged in but could not persist session: {}", e);
        }
        info!("Session established for user {}", user.id);
        self.set_state(Some(user.clone()), None);
        user
    }

    /// A failure that invalidates the session
    fn fail_session(&self, error: QuestError) -> QuestError {
        warn!("Session failure: {}", error);
        self.forget_persisted();
        self.set_state(None, Some(error.clone()));
        error
    }

    /// A precondition/validation failure: record it, leave the session alone
    fn fail_local(&self, error: QuestError) -> QuestError {
        let mut state = write_lock(&self.state);
        state.loading = false;
        state.error = Some(error.clone());
        error
    }

    fn forget_persisted(&self) {
        if let Err(e) = self.db.clear_session() {
            warn!("Could not clear persisted session: {}", e);
        }
    }

    fn begin_loading(&self) {
        let mut state = write_lock(&self.state);
        state.loading = true;
        state.error = None;
    }

    fn set_state(&self, user: Option<User>, error: Option<QuestError>) {
        *write_lock(&self.state) = SessionState {
            user,
            loading: false,
            error,
        };
    }
}
