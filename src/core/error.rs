//! Custom error types for the web layer.
//!
//! - [`FetchError`] - network/fetch-related errors for HTTP requests
//! - [`SocketError`] - live-update WebSocket setup failures
//!
//! Both fold into the engine's [`ExplorerError`] taxonomy at the seam.

use std::fmt;

use sharenav_core::ExplorerError;

/// Network/fetch-related errors for HTTP requests.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// Browser window not available
    NoWindow,
    /// Failed to create HTTP request
    RequestCreationFailed,
    /// Network request failed (CORS, offline, etc.)
    NetworkError(String),
    /// HTTP error response (non-2xx status) with the server's detail text
    HttpError(u16, String),
    /// Failed to read response body
    ResponseReadFailed,
    /// Invalid response content (not text)
    InvalidContent,
    /// JSON parsing error
    JsonParseError(String),
    /// Request timed out
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => write!(f, "Browser window not available"),
            Self::RequestCreationFailed => write!(f, "Failed to create request"),
            Self::NetworkError(msg) => write!(f, "Network error: {}", msg),
            Self::HttpError(status, detail) if detail.is_empty() => {
                write!(f, "HTTP error: {}", status)
            }
            Self::HttpError(status, detail) => write!(f, "HTTP error {}: {}", status, detail),
            Self::ResponseReadFailed => write!(f, "Failed to read response"),
            Self::InvalidContent => write!(f, "Invalid response content"),
            Self::JsonParseError(msg) => write!(f, "JSON parse error: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<FetchError> for ExplorerError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::HttpError(status, detail) => ExplorerError::from_status(status, detail),
            other => ExplorerError::RemoteUnavailable(other.to_string()),
        }
    }
}

/// WebSocket setup errors.
#[derive(Debug, Clone)]
pub enum SocketError {
    /// Could not derive the ws:// URL from the page location
    InvalidLocation,
    /// The WebSocket constructor threw
    OpenFailed(String),
    /// Send on a socket that is not open
    NotOpen,
    /// Message could not be serialized
    Encode(String),
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLocation => write!(f, "Cannot derive live-update URL"),
            Self::OpenFailed(msg) => write!(f, "Failed to open socket: {}", msg),
            Self::NotOpen => write!(f, "Socket is not open"),
            Self::Encode(msg) => write!(f, "Failed to encode message: {}", msg),
        }
    }
}

impl std::error::Error for SocketError {}

impl From<SocketError> for ExplorerError {
    fn from(error: SocketError) -> Self {
        log::debug!("live transport error: {}", error);
        ExplorerError::ChannelDisconnected
    }
}
