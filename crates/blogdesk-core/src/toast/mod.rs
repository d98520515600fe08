//! Transient user-facing notifications.
//!
//! `ToastQueue` holds the visible toasts in display order and removes each
//! one when its duration elapses. Front ends read snapshots with
//! [`ToastQueue::toasts`] or follow changes through [`ToastQueue::subscribe`].

pub mod queue;

pub use queue::{Toast, ToastId, ToastKind, ToastQueue};
