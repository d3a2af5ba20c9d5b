//! Fire-and-forget notifications.
//!
//! This crate provides:
//! - `NotificationSink` trait for delivery backends
//! - `NtfySink` publishing to an ntfy server over HTTP
//! - `InMemorySink` for tests
//! - `Notifier`, which dispatches notifications on the runtime without
//!   making the caller wait or fail

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod ntfy;
pub mod sink;

pub use config::NtfyConfig;
pub use dispatcher::Notifier;
pub use error::NotificationError;
pub use memory::InMemorySink;
pub use ntfy::NtfySink;
pub use sink::{Notification, NotificationSink, Priority};
