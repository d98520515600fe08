use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{ProfileUpdate, RegistrationStatus, UserProfile};
use crate::storage::{KeyValueStore, TOKEN_KEY};

/// Snapshot of the session as seen by UI collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Bearer token; empty when anonymous
    pub token: String,
    /// Only populated by an explicit profile fetch
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Owns the token lifecycle: restore on construction, login, logout.
///
/// Construct once and share behind an `Arc`. All state lives behind one
/// lock, and the lock is never held across an await. Writes to the stored
/// token happen while holding the write lock.
pub struct SessionStore {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Session>,
}

impl SessionStore {
    /// Seed the session from storage. A stored token is trusted as-is until
    /// a request using it fails.
    pub fn new(client: ApiClient, storage: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let token = storage.get(TOKEN_KEY)?.unwrap_or_default();
        if !token.is_empty() {
            info!("Restored session token from storage");
        }
        Ok(Self {
            client,
            storage,
            state: RwLock::new(Session { token, user: None }),
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn token(&self) -> String {
        self.state.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).user.clone()
    }

    /// Derived from the current token on every call
    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_authenticated()
    }

    /// Exchange credentials for a token and commit it to memory and storage.
    ///
    /// On failure nothing changes and the error is returned. Note that a 401
    /// from the login endpoint still passes through the pipeline's forced
    /// logout, which removes any previously stored token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let token = match self.client.authenticate(username, password).await {
            Ok(token) => token,
            Err(e) => {
                error!(username = username, error = %e, "Login failed");
                return Err(e);
            }
        };

        // Storage and memory change under the same write guard so a
        // concurrent logout lands entirely before or after this commit.
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
                error!(username = username, error = %e, "Login succeeded but the token could not be stored");
                return Err(e.into());
            }
            state.token = token;
        }
        info!(username = username, "Logged in");
        Ok(())
    }

    /// Drop the token and profile from memory and storage. Always succeeds.
    pub fn logout(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = self.storage.remove(TOKEN_KEY) {
                warn!(error = %e, "Failed to remove stored token during logout");
            }
            state.token.clear();
            state.user = None;
        }
        info!("Logged out");
    }

    /// Fetch the signed-in user's profile and keep it on the session.
    /// Login never calls this on its own.
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let profile = self.client.fetch_profile().await?;
        self.state.write().unwrap_or_else(PoisonError::into_inner).user = Some(profile.clone());
        Ok(profile)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let profile = self.client.update_profile(update).await?;
        self.state.write().unwrap_or_else(PoisonError::into_inner).user = Some(profile.clone());
        Ok(profile)
    }

    /// Create the author account. Does not log in.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String, ApiError> {
        self.client.register(username, email, password).await
    }

    pub async fn registration_status(&self) -> Result<RegistrationStatus, ApiError> {
        self.client.registration_status().await
    }
}

// ============================================================================
// Tests
// ============================================================================
