//! blogdesk core library.
//!
//! Client-side session and feedback layer for the blog backend:
//!
//! - [`api`]: `ApiClient` and the interceptor `Pipeline` that attaches the
//!   bearer token and handles 401 responses
//! - [`auth`]: `SessionStore`, the token lifecycle and derived
//!   authentication state
//! - [`toast`]: `ToastQueue`, short-lived notifications with timed expiry
//! - [`storage`]: persistent key-value stores for the token
//! - [`navigation`]: the redirect hook used on forced logout
//! - [`context`]: `AppContext`, which wires the above together once

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod navigation;
pub mod storage;
pub mod toast;

pub use api::{ApiClient, ApiError, Pipeline};
pub use auth::{Session, SessionStore};
pub use config::Config;
pub use context::AppContext;
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator, LOGIN_PATH};
pub use storage::{KeyValueStore, TOKEN_KEY};
pub use toast::{Toast, ToastId, ToastKind, ToastQueue};
