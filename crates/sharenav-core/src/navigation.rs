//! Navigation state.
//!
//! Tracks where the explorer is (connection, path, phase), what is selected
//! and what is being previewed. Every navigation or refresh bumps the epoch
//! and hands out a [`FetchTicket`]; a fetch result may only commit while its
//! ticket is still current.
//!
//! User requests (navigations, deep-link lookups, connection switches) also
//! bump a separate request counter. A deep link resolving its target holds a
//! [`ResolveTicket`] against that counter, so background refreshes do not
//! cancel it but any later request does.

use crate::error::ExplorerError;
use crate::models::{ConnectionId, DirectoryListing, Entry};
use crate::path::RemotePath;

/// Load phase of the current path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Error(ExplorerError),
}

impl Phase {
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading)
    }

    pub fn error(&self) -> Option<&ExplorerError> {
        match self {
            Phase::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Proof that a fetch was requested at a given epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub epoch: u64,
    pub connection: ConnectionId,
    pub path: RemotePath,
}

/// Proof that a deep-link lookup was requested; see
/// [`NavigationState::begin_resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveTicket {
    pub request: u64,
    pub connection: ConnectionId,
    pub path: RemotePath,
}

/// Result of offering a fetch result to the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Listing published and now current.
    Committed,
    /// A newer request superseded this one; nothing changed.
    Discarded,
    /// The fetch failed; the phase now holds the error.
    Failed(ExplorerError),
    /// The path no longer exists; navigate here instead.
    Fallback(RemotePath),
}

// =============================================================================
// Preview
// =============================================================================

/// An open preview and the gallery it can step through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewState {
    gallery: Vec<Entry>,
    index: usize,
}

impl PreviewState {
    /// Build a preview for `name` within `listing`.
    ///
    /// Previewable entries get a gallery of every entry sharing their
    /// category, in listing order. Anything else previews alone.
    pub fn open(listing: &DirectoryListing, name: &str) -> Option<Self> {
        let target = listing.get(name)?;
        if target.is_dir() {
            return None;
        }

        let Some(category) = target.preview_category() else {
            return Some(Self {
                gallery: vec![target.clone()],
                index: 0,
            });
        };

        let gallery: Vec<Entry> = listing
            .entries
            .iter()
            .filter(|e| e.preview_category() == Some(category))
            .cloned()
            .collect();
        let index = gallery.iter().position(|e| e.name == name)?;
        Some(Self { gallery, index })
    }

    pub fn entry(&self) -> &Entry {
        &self.gallery[self.index]
    }

    pub fn gallery(&self) -> &[Entry] {
        &self.gallery
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.gallery.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Step forward; no wraparound.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Follow listing changes. Returns `false` if the shown entry is gone.
    fn reconcile(&mut self, listing: &DirectoryListing) -> bool {
        let current = self.entry().name.clone();
        self.gallery.retain(|e| listing.contains(&e.name));
        for entry in &mut self.gallery {
            if let Some(fresh) = listing.get(&entry.name) {
                *entry = fresh.clone();
            }
        }
        match self.gallery.iter().position(|e| e.name == current) {
            Some(idx) => {
                self.index = idx;
                true
            }
            None => false,
        }
    }
}

/// Arguments for invoking a viewer on the previewed entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewRequest {
    pub connection: ConnectionId,
    pub path: RemotePath,
    pub gallery: Vec<RemotePath>,
    pub index: usize,
}

// =============================================================================
// NavigationState
// =============================================================================

#[derive(Clone, Debug)]
pub struct NavigationState {
    connection: ConnectionId,
    path: RemotePath,
    phase: Phase,
    selected: Option<String>,
    preview: Option<PreviewState>,
    last_good: Option<RemotePath>,
    epoch: u64,
    request: u64,
}

impl NavigationState {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            path: RemotePath::root(),
            phase: Phase::Idle,
            selected: None,
            preview: None,
            last_good: None,
            epoch: 0,
            request: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn preview(&self) -> Option<&PreviewState> {
        self.preview.as_ref()
    }

    /// Most recent path whose listing loaded successfully.
    pub fn last_good(&self) -> Option<&RemotePath> {
        self.last_good.as_ref()
    }

    /// Whether `ticket` was issued by the latest request for the current path.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.epoch == self.epoch && ticket.connection == self.connection && ticket.path == self.path
    }

    /// Whether no other user request was made since `ticket`.
    pub fn is_latest(&self, ticket: &ResolveTicket) -> bool {
        ticket.request == self.request && ticket.connection == self.connection
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start loading `path`. Selection and preview survive only when the
    /// path is unchanged.
    pub fn start(&mut self, path: RemotePath) -> FetchTicket {
        if path != self.path {
            self.selected = None;
            self.preview = None;
            self.path = path;
        }
        self.phase = Phase::Loading;
        self.request += 1;
        self.ticket()
    }

    /// Register a deep-link lookup for `path`. Supersedes any fetch in
    /// flight; the location itself changes only once the lookup navigates.
    pub fn begin_resolve(&mut self, path: RemotePath) -> ResolveTicket {
        self.request += 1;
        self.epoch += 1;
        ResolveTicket {
            request: self.request,
            connection: self.connection.clone(),
            path,
        }
    }

    /// Revalidate the current path without entering `Loading`.
    pub fn start_refresh(&mut self) -> FetchTicket {
        self.ticket()
    }

    /// Move to another connection at its root.
    pub fn switch_connection(&mut self, connection: ConnectionId) {
        self.connection = connection;
        self.path = RemotePath::root();
        self.phase = Phase::Idle;
        self.selected = None;
        self.preview = None;
        self.last_good = None;
        self.epoch += 1;
        self.request += 1;
    }

    /// Drop pending deep-link lookups without moving. Used when the user
    /// settles on a location that needs no fetch.
    pub fn cancel_lookups(&mut self) {
        self.request += 1;
    }

    /// Show an error at `path` and supersede anything in flight.
    pub fn fail_at(&mut self, path: RemotePath, error: ExplorerError) {
        if path != self.path {
            self.selected = None;
            self.preview = None;
            self.path = path;
        }
        self.phase = Phase::Error(error);
        self.epoch += 1;
        self.request += 1;
    }

    pub(crate) fn commit(&mut self, listing: &DirectoryListing) {
        self.phase = Phase::Idle;
        self.last_good = Some(self.path.clone());
        self.reconcile(listing);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Drop selection and preview targets that left the listing.
    pub(crate) fn reconcile(&mut self, listing: &DirectoryListing) {
        if self.selected.as_deref().is_some_and(|s| !listing.contains(s)) {
            self.selected = None;
        }
        let keep_preview = self.preview.as_mut().is_none_or(|p| p.reconcile(listing));
        if !keep_preview {
            self.preview = None;
        }
    }

    fn ticket(&mut self) -> FetchTicket {
        self.epoch += 1;
        FetchTicket {
            epoch: self.epoch,
            connection: self.connection.clone(),
            path: self.path.clone(),
        }
    }

    // =========================================================================
    // Selection & Preview
    // =========================================================================

    pub fn select(&mut self, listing: &DirectoryListing, name: &str) -> bool {
        if !listing.contains(name) {
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Select the entry `step` rows away from the current selection,
    /// clamped to the listing. Returns the new index.
    pub fn select_relative(&mut self, listing: &DirectoryListing, step: isize) -> Option<usize> {
        if listing.entries.is_empty() {
            return None;
        }
        let last = listing.entries.len() - 1;
        let index = match self.selected.as_deref().and_then(|s| listing.position(s)) {
            Some(current) => current.saturating_add_signed(step).min(last),
            None if step < 0 => last,
            None => 0,
        };
        self.selected = Some(listing.entries[index].name.clone());
        Some(index)
    }

    pub fn open_preview(&mut self, listing: &DirectoryListing, name: &str) -> bool {
        match PreviewState::open(listing, name) {
            Some(preview) => {
                self.selected = Some(name.to_string());
                self.preview = Some(preview);
                true
            }
            None => false,
        }
    }

    pub fn next_preview(&mut self) -> bool {
        let moved = self.preview.as_mut().is_some_and(PreviewState::next);
        self.follow_preview();
        moved
    }

    pub fn previous_preview(&mut self) -> bool {
        let moved = self.preview.as_mut().is_some_and(PreviewState::previous);
        self.follow_preview();
        moved
    }

    /// Close the preview. Listing, path and selection are untouched.
    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    pub fn preview_request(&self) -> Option<PreviewRequest> {
        let preview = self.preview.as_ref()?;
        let gallery = preview
            .gallery()
            .iter()
            .map(|e| self.path.join(&e.name))
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some(PreviewRequest {
            connection: self.connection.clone(),
            path: gallery[preview.index()].clone(),
            gallery,
            index: preview.index(),
        })
    }

    fn follow_preview(&mut self) {
        if let Some(preview) = &self.preview {
            self.selected = Some(preview.entry().name.clone());
        }
    }
}
