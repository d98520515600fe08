//! Authentication module for managing the user session.
//!
//! This module provides `SessionStore`, which owns the bearer token: it is
//! seeded from persistent storage at startup, replaced by a successful
//! login and cleared by logout. `is_authenticated` is derived from the token
//! on every read.

pub mod session;

pub use session::{Session, SessionStore};
