//! Error taxonomy for the navigation engine.
//!
//! - [`PathError`] - local path validation failures
//! - [`ExplorerError`] - everything that can turn a navigation into an
//!   `Error` phase, including remote and live-channel failures

use thiserror::Error;

/// Malformed path input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path contains a NUL byte.
    #[error("path contains a null byte")]
    NullByte,
    /// `..` would climb above the share root.
    #[error("path escapes the share root: {0}")]
    AboveRoot(String),
    /// Entry name is empty, `.`/`..`, or contains a separator.
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
}

/// Errors surfaced by navigation, fetching and the live-update channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorerError {
    /// Local validation failed; never retried.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    /// Network, timeout or server-side failure.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    /// The remote denied access to the path.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The path no longer exists on the remote.
    #[error("not found: {0}")]
    NotFound(String),
    /// The live-update transport is down; listings may be out of date.
    #[error("live updates paused: channel disconnected")]
    ChannelDisconnected,
}

impl ExplorerError {
    /// Map an HTTP status code from the remote API into the taxonomy.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            401 | 403 => Self::PermissionDenied(detail),
            404 => Self::NotFound(detail),
            _ => Self::RemoteUnavailable(format!("HTTP {}: {}", status, detail)),
        }
    }

    /// Whether the UI should offer a retry control.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::ChannelDisconnected)
    }

    /// Whether the error should be shown as a terminal (blocking) message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::InvalidPath(_))
    }
}
