//! Directory listing retrieval.
//!
//! [`RemoteClient`] is the seam to the browse API; the application provides
//! an HTTP implementation and tests provide in-memory fakes.
//! [`ListingFetcher`] turns raw payloads into normalized listings.
//!
//! Results are published into the cache by the navigation layer, and only
//! while the request is still current.

use crate::error::ExplorerError;
use crate::models::{ConnectionId, DirectoryListing, Entry, EntryPayload, ListingPayload};
use crate::path::RemotePath;

/// Remote access collaborator.
///
/// Implementations attach credentials, enforce request timeouts (a timeout
/// is reported as [`ExplorerError::RemoteUnavailable`]) and map HTTP
/// statuses with [`ExplorerError::from_status`].
#[allow(async_fn_in_trait)]
pub trait RemoteClient {
    /// List a directory. If the server paginates, the implementation must
    /// assemble every page before returning.
    async fn list_directory(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<ListingPayload, ExplorerError>;

    /// Fetch a single entry's metadata.
    async fn file_info(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<EntryPayload, ExplorerError>;
}

/// Fetches and normalizes listings through a [`RemoteClient`].
pub struct ListingFetcher<C> {
    client: C,
}

impl<C: RemoteClient> ListingFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the full listing for `path`.
    pub async fn fetch(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<DirectoryListing, ExplorerError> {
        log::debug!("fetching listing {}:{}", connection, path);
        let payload = self.client.list_directory(connection, path).await?;
        Ok(DirectoryListing::from_payload(path.clone(), payload))
    }

    /// Fetch metadata for a single path. The root is always a directory.
    pub async fn entry_info(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<Entry, ExplorerError> {
        let Some(name) = path.name() else {
            return Ok(Entry::directory(""));
        };
        let payload = self.client.file_info(connection, path).await?;
        payload.into_entry().ok_or_else(|| {
            ExplorerError::RemoteUnavailable(format!("malformed entry record for {}", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    struct StaticClient;

    impl RemoteClient for StaticClient {
        async fn list_directory(
            &self,
            _connection: &ConnectionId,
            path: &RemotePath,
        ) -> Result<ListingPayload, ExplorerError> {
            if path.to_query() == "private" {
                return Err(ExplorerError::from_status(403, "private"));
            }
            Ok(serde_json::from_str(
                r#"{"path": "", "items": [
                    {"name": "b.png", "type": "file", "size": 3},
                    {"name": "a", "type": "directory"}
                ], "total": 2}"#,
            )
            .unwrap())
        }

        async fn file_info(
            &self,
            _connection: &ConnectionId,
            path: &RemotePath,
        ) -> Result<EntryPayload, ExplorerError> {
            Ok(EntryPayload {
                name: path.name().unwrap_or_default().to_string(),
                path: path.to_query(),
                kind: EntryKind::File,
                size: Some(1),
                mime_type: None,
                created_at: None,
                modified_at: None,
                is_readable: true,
                is_hidden: false,
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_preserves_server_order() {
        let fetcher = ListingFetcher::new(StaticClient);
        let listing = fetcher
            .fetch(&ConnectionId::new("c"), &RemotePath::root())
            .await
            .unwrap();
        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a"]);
        assert_eq!(listing.total, 2);
    }

    #[tokio::test]
    async fn test_fetch_propagates_permission_error() {
        let fetcher = ListingFetcher::new(StaticClient);
        let err = fetcher
            .fetch(
                &ConnectionId::new("c"),
                &RemotePath::normalize("/private").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_entry_info() {
        let fetcher = ListingFetcher::new(StaticClient);
        let conn = ConnectionId::new("c");
        let root = fetcher.entry_info(&conn, &RemotePath::root()).await.unwrap();
        assert!(root.is_dir());
        let file = fetcher
            .entry_info(&conn, &RemotePath::normalize("/x.txt").unwrap())
            .await
            .unwrap();
        assert_eq!(file.name, "x.txt");
    }
}
