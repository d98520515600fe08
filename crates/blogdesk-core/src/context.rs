//! Service wiring.
//!
//! `AppContext` builds every shared service exactly once and hands out
//! references. Front ends hold one context for the life of the process
//! instead of reaching for globals.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::api::{ApiClient, ApiError, Pipeline};
use crate::auth::SessionStore;
use crate::config::Config;
use crate::navigation::Navigator;
use crate::storage::KeyValueStore;
use crate::toast::ToastQueue;

pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub navigator: Arc<dyn Navigator>,
    pub client: ApiClient,
    pub session: Arc<SessionStore>,
    pub toasts: ToastQueue,
}

impl AppContext {
    /// Wire the standard pipeline, session store and toast queue around the
    /// given storage and navigator.
    pub fn new(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let pipeline = Pipeline::standard(storage.clone(), navigator.clone(), config.login_path.clone());
        let client = ApiClient::from_config(&config, pipeline)?;
        let session = Arc::new(SessionStore::new(client.clone(), storage.clone())?);
        let toasts = ToastQueue::with_default_duration(config.toast_duration());

        Ok(Self {
            config,
            storage,
            navigator,
            client,
            session,
            toasts,
        })
    }

    /// Like [`AppContext::new`], opening the storage backend named in the config
    pub fn from_config(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let storage = config.open_storage().context("Failed to open credential storage")?;
        Self::new(config, storage, navigator).context("Failed to initialize services")
    }
}
