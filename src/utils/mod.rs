//! Utility modules for browser APIs.
//!
//! Provides:
//! - [`dom`] - window, storage and URL hash helpers
//! - [`HttpRemoteClient`] - browse API client with timeout
//! - [`WebSocketTransport`] - live-update socket
//! - [`logger`] - `log` backend for the browser console

pub mod dom;
mod fetch;
pub mod format;
pub mod logger;
mod socket;

pub use fetch::{HttpRemoteClient, fetch_object_url, preview_url, revoke_object_url};
pub use socket::{SocketEvent, SocketHandler, WebSocketTransport};
