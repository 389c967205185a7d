//! Per-directory listing cache.
//!
//! Holds the last known listing for each `(connection, path)` pair with a
//! stale-while-revalidate policy: invalidated entries keep serving their
//! data until a refresh replaces them. Size is bounded by
//! least-recently-viewed eviction, and the currently navigated directory is
//! pinned so it can never be evicted from under the view.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{ChangeKind, ConnectionId, Delta, DirectoryListing};
use crate::path::RemotePath;

/// Cache lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub connection: ConnectionId,
    pub path: RemotePath,
}

impl CacheKey {
    pub fn new(connection: &ConnectionId, path: &RemotePath) -> Self {
        Self {
            connection: connection.clone(),
            path: path.clone(),
        }
    }
}

/// A cached listing plus bookkeeping.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub listing: DirectoryListing,
    pub fetched_at: DateTime<Utc>,
    /// Data may be out of date; the next view should revalidate.
    pub stale: bool,
    /// A refresh request is in flight.
    pub refreshing: bool,
    /// Logical clock value of the most recent view.
    last_viewed: u64,
}

/// Bounded listing cache keyed by connection and path.
#[derive(Debug)]
pub struct DirectoryCache {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
    pinned: Option<CacheKey>,
    clock: u64,
}

impl DirectoryCache {
    /// Create a cache holding at most `capacity` directories (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            pinned: None,
            clock: 0,
        }
    }

    pub fn get(&self, connection: &ConnectionId, path: &RemotePath) -> Option<&CacheEntry> {
        self.entries.get(&CacheKey::new(connection, path))
    }

    /// Record a view of the entry, updating its recency.
    pub fn view(&mut self, connection: &ConnectionId, path: &RemotePath) -> Option<&CacheEntry> {
        let tick = self.tick();
        let entry = self.entries.get_mut(&CacheKey::new(connection, path))?;
        entry.last_viewed = tick;
        Some(entry)
    }

    /// Store a fresh listing, replacing any previous one.
    pub fn put(&mut self, connection: &ConnectionId, path: &RemotePath, listing: DirectoryListing) {
        let tick = self.tick();
        self.entries.insert(
            CacheKey::new(connection, path),
            CacheEntry {
                listing,
                fetched_at: Utc::now(),
                stale: false,
                refreshing: false,
                last_viewed: tick,
            },
        );
        self.evict();
    }

    /// Patch a cached listing in place.
    ///
    /// Returns `true` if an entry for the path exists. Deltas for paths that
    /// have never been fetched are dropped.
    pub fn apply_delta(
        &mut self,
        connection: &ConnectionId,
        path: &RemotePath,
        delta: &Delta,
    ) -> bool {
        let Some(cached) = self.entries.get_mut(&CacheKey::new(connection, path)) else {
            log::debug!("dropping delta for unobserved path {}", path);
            return false;
        };
        let listing = &mut cached.listing;

        match delta.change {
            ChangeKind::Created | ChangeKind::Updated => {
                if let Some(entry) = &delta.entry {
                    listing.upsert(entry.clone());
                }
            }
            ChangeKind::Removed => {
                listing.remove(&delta.entry_name);
            }
            ChangeKind::Renamed => {
                let previous = delta
                    .previous_name
                    .as_deref()
                    .and_then(|old| listing.remove(old));
                match (&delta.entry, previous) {
                    (Some(entry), _) => listing.upsert(entry.clone()),
                    (None, Some(mut moved)) => {
                        moved.name = delta.entry_name.clone();
                        moved.hidden = moved.hidden || moved.name.starts_with('.');
                        listing.upsert(moved);
                    }
                    (None, None) => {}
                }
            }
        }
        true
    }

    /// Mark an entry stale without removing it.
    pub fn invalidate(&mut self, connection: &ConnectionId, path: &RemotePath) -> bool {
        match self.entries.get_mut(&CacheKey::new(connection, path)) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_refreshing(&mut self, connection: &ConnectionId, path: &RemotePath, value: bool) {
        if let Some(entry) = self.entries.get_mut(&CacheKey::new(connection, path)) {
            entry.refreshing = value;
        }
    }

    pub fn remove(&mut self, connection: &ConnectionId, path: &RemotePath) -> Option<CacheEntry> {
        self.entries.remove(&CacheKey::new(connection, path))
    }

    /// Protect the currently navigated directory from eviction.
    pub fn pin(&mut self, connection: &ConnectionId, path: &RemotePath) {
        self.pinned = Some(CacheKey::new(connection, path));
    }

    pub fn is_pinned(&self, connection: &ConnectionId, path: &RemotePath) -> bool {
        self.pinned
            .as_ref()
            .is_some_and(|key| &key.connection == connection && &key.path == path)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop least-recently-viewed entries until within capacity.
    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let victim = self
                .entries
                .iter()
                .filter(|(key, _)| self.pinned.as_ref() != Some(*key))
                .min_by_key(|(_, entry)| entry.last_viewed)
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    log::debug!("evicting cached listing {}:{}", key.connection, key.path);
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
