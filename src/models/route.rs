//! Hash-based routing.
//!
//! URL format: `#/<connection-id>/<path>` with each path segment
//! percent-encoded (e.g. `#/3f1c2a9e/Team%20Files/report.pdf`).

use sharenav_core::{ConnectionId, RemotePath};

/// Application routes for hash-based navigation.
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// No connection chosen: `#/` or empty hash
    Home,
    /// Browsing a connection. The path is decoded but not yet validated.
    Browse {
        connection: ConnectionId,
        raw_path: String,
    },
}

impl Route {
    /// Parse URL hash into Route
    pub fn from_hash(hash: &str) -> Self {
        let rest = hash.trim_start_matches('#').trim_start_matches('/');
        let (connection, path) = rest.split_once('/').unwrap_or((rest, ""));

        if connection.is_empty() {
            return Self::Home;
        }

        let raw_path = path
            .split('/')
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| segment.to_string())
            })
            .collect::<Vec<_>>()
            .join("/");

        Self::Browse {
            connection: ConnectionId::new(connection),
            raw_path: format!("/{}", raw_path),
        }
    }

    /// Route for a validated location.
    pub fn browse(connection: &ConnectionId, path: &RemotePath) -> Self {
        Self::Browse {
            connection: connection.clone(),
            raw_path: path.to_string(),
        }
    }

    /// Convert Route to URL hash
    pub fn to_hash(&self) -> String {
        match self {
            Self::Home => "#/".to_string(),
            Self::Browse {
                connection,
                raw_path,
            } => {
                let encoded = raw_path
                    .trim_start_matches('/')
                    .split('/')
                    .map(|segment| urlencoding::encode(segment).into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                format!("#/{}/{}", connection, encoded)
            }
        }
    }

    /// Get current route from browser URL
    pub fn current() -> Self {
        Self::from_hash(&crate::utils::dom::get_hash())
    }
}
