//! Explorer engine.
//!
//! [`Explorer`] ties the navigation state, listing cache, live channel and
//! viewport together. Its methods are synchronous; the async drivers at the
//! bottom of this module run fetches against a [`ListingFetcher`] and only
//! borrow the engine between suspension points, so a shared
//! `Rc<RefCell<Explorer<_>>>` is never borrowed across an `.await`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cache::{CacheEntry, DirectoryCache};
use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use crate::fetcher::{ListingFetcher, RemoteClient};
use crate::keymap::{ExplorerCommand, ExplorerKeyContext};
use crate::live::{LiveChannel, LiveEvent, LiveTransport};
use crate::models::{ConnectionId, DirectoryListing, Entry};
use crate::navigation::{
    Completion, FetchTicket, NavigationState, Phase, PreviewRequest, ResolveTicket,
};
use crate::path::RemotePath;
use crate::viewport::{Viewport, VisibleRange};

/// Follow-up work a synchronous command leaves for an async driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Navigate(RemotePath),
    Refresh,
}

pub struct Explorer<T> {
    config: ExplorerConfig,
    nav: NavigationState,
    cache: DirectoryCache,
    live: LiveChannel<T>,
    viewport: Viewport,
    /// Path this explorer currently holds a live subscription for.
    subscribed: Option<(ConnectionId, RemotePath)>,
    /// Called after every observable state change.
    on_change: Option<Box<dyn Fn()>>,
}

impl<T: LiveTransport> Explorer<T> {
    pub fn new(connection: ConnectionId, transport: T, config: ExplorerConfig) -> Self {
        Self {
            nav: NavigationState::new(connection),
            cache: DirectoryCache::new(config.cache.capacity),
            live: LiveChannel::new(transport, &config.live),
            viewport: Viewport::from_config(&config.viewport),
            subscribed: None,
            on_change: None,
            config,
        }
    }

    /// Register a callback run after every observable state change, including
    /// the intermediate loading state of an async driver.
    ///
    /// The callback runs while the engine is mutably borrowed; it must not
    /// borrow the explorer itself.
    pub fn set_change_listener(&mut self, listener: impl Fn() + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    fn notify(&self) {
        if let Some(listener) = &self.on_change {
            listener();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn state(&self) -> &NavigationState {
        &self.nav
    }

    pub fn connection(&self) -> &ConnectionId {
        self.nav.connection()
    }

    pub fn path(&self) -> &RemotePath {
        self.nav.path()
    }

    pub fn phase(&self) -> &Phase {
        self.nav.phase()
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub fn live(&self) -> &LiveChannel<T> {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut LiveChannel<T> {
        &mut self.live
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Cache entry of the current path, stale or not.
    pub fn current(&self) -> Option<&CacheEntry> {
        self.cache.get(self.nav.connection(), self.nav.path())
    }

    pub fn listing(&self) -> Option<&DirectoryListing> {
        self.current().map(|c| &c.listing)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        let name = self.nav.selected()?;
        self.listing()?.get(name)
    }

    /// Rows to render and their index range.
    pub fn visible_entries(&self) -> (VisibleRange, &[Entry]) {
        let range = self.viewport.visible_range();
        match self.listing() {
            Some(listing) if range.end <= listing.entries.len() => {
                (range, &listing.entries[range.start..range.end])
            }
            _ => (VisibleRange::EMPTY, &[][..]),
        }
    }

    pub fn key_context(&self) -> ExplorerKeyContext {
        ExplorerKeyContext {
            previewing: self.nav.preview().is_some(),
            has_selection: self.nav.selected().is_some(),
            at_root: self.nav.path().is_root(),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Start navigating to `path`.
    ///
    /// The live subscription moves to `path` right away; cached data for the
    /// target, if any, is shown while the fetch runs.
    pub fn begin_navigation(&mut self, path: RemotePath) -> FetchTicket {
        let ticket = self.nav.start(path);
        log::info!("navigating to {}:{}", ticket.connection, ticket.path);

        self.subscribe_current();
        self.cache.pin(&ticket.connection, &ticket.path);
        self.cache.view(&ticket.connection, &ticket.path);
        self.cache
            .mark_refreshing(&ticket.connection, &ticket.path, true);
        self.sync_viewport();
        self.notify();
        ticket
    }

    /// Navigate to a raw, unvalidated path. Invalid input falls back to the
    /// last known good path in the error phase and nothing is fetched.
    pub fn navigate_raw(&mut self, raw: &str) -> Option<FetchTicket> {
        match RemotePath::normalize(raw) {
            Ok(path) => Some(self.begin_navigation(path)),
            Err(e) => {
                log::warn!("rejected path {:?}: {}", raw, e);
                let fallback = self
                    .nav
                    .last_good()
                    .cloned()
                    .unwrap_or_else(|| self.nav.path().clone());
                let connection = self.nav.connection().clone();
                self.nav.fail_at(fallback.clone(), ExplorerError::from(e));
                self.cache.pin(&connection, &fallback);
                self.cache.view(&connection, &fallback);
                if self.current().is_some() {
                    self.subscribe_current();
                } else {
                    self.release_subscription();
                }
                self.sync_viewport();
                self.notify();
                None
            }
        }
    }

    /// Revalidate the current path. Skipped while a navigation is loading.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        if self.nav.phase().is_loading() {
            return None;
        }
        let ticket = self.nav.start_refresh();
        log::debug!("refreshing {}:{}", ticket.connection, ticket.path);
        self.cache
            .mark_refreshing(&ticket.connection, &ticket.path, true);
        self.notify();
        Some(ticket)
    }

    /// Register a deep-link lookup for `path`. See [`open_location`].
    pub fn begin_resolve(&mut self, path: RemotePath) -> ResolveTicket {
        log::debug!("resolving {}", path);
        self.nav.begin_resolve(path)
    }

    /// Cancel pending deep-link lookups; the current location stands.
    pub fn cancel_lookups(&mut self) {
        self.nav.cancel_lookups();
    }

    /// Re-issue the request that produced the current error.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.nav.phase().error().is_none() {
            return None;
        }
        let path = self.nav.path().clone();
        Some(self.begin_navigation(path))
    }

    /// Switch to another connection. Anything in flight is discarded.
    pub fn switch_connection(&mut self, connection: ConnectionId) {
        if &connection == self.nav.connection() {
            return;
        }
        log::info!("switching to connection {}", connection);
        self.release_subscription();
        self.nav.switch_connection(connection);
        self.sync_viewport();
        self.notify();
    }

    /// Offer a fetch result. Only the request matching the current epoch and
    /// path may publish into the cache.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DirectoryListing, ExplorerError>,
    ) -> Completion {
        let completion = self.publish(ticket, result);
        if completion != Completion::Discarded {
            self.notify();
        }
        completion
    }

    fn publish(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DirectoryListing, ExplorerError>,
    ) -> Completion {
        if !self.nav.is_current(ticket) {
            log::debug!(
                "discarding superseded listing for {} (epoch {})",
                ticket.path,
                ticket.epoch
            );
            if &ticket.path != self.nav.path() {
                self.cache
                    .mark_refreshing(&ticket.connection, &ticket.path, false);
            }
            return Completion::Discarded;
        }

        match result {
            Ok(listing) => {
                self.cache.put(&ticket.connection, &ticket.path, listing);
                if let Some(entry) = self.cache.get(&ticket.connection, &ticket.path) {
                    self.nav.commit(&entry.listing);
                }
                self.subscribe_current();
                self.sync_viewport();
                Completion::Committed
            }
            Err(ExplorerError::NotFound(detail)) => {
                log::warn!("{} no longer exists: {}", ticket.path, detail);
                self.cache.remove(&ticket.connection, &ticket.path);
                match ticket.path.parent() {
                    Some(parent) => Completion::Fallback(parent),
                    None => {
                        let error = ExplorerError::NotFound(detail);
                        self.nav.set_phase(Phase::Error(error.clone()));
                        self.sync_viewport();
                        Completion::Failed(error)
                    }
                }
            }
            Err(error) => {
                log::warn!("listing {} failed: {}", ticket.path, error);
                self.cache
                    .mark_refreshing(&ticket.connection, &ticket.path, false);
                self.nav.set_phase(Phase::Error(error.clone()));
                Completion::Failed(error)
            }
        }
    }

    // =========================================================================
    // Selection & Preview
    // =========================================================================

    pub fn select(&mut self, name: &str) -> bool {
        let Some(entry) = self.cache.get(self.nav.connection(), self.nav.path()) else {
            return false;
        };
        let selected = self.nav.select(&entry.listing, name);
        if selected {
            self.sync_focus();
            self.notify();
        }
        selected
    }

    pub fn select_next(&mut self) {
        self.select_relative(1);
    }

    pub fn select_previous(&mut self) {
        self.select_relative(-1);
    }

    fn select_relative(&mut self, step: isize) {
        let Some(entry) = self.cache.get(self.nav.connection(), self.nav.path()) else {
            return;
        };
        if let Some(index) = self.nav.select_relative(&entry.listing, step) {
            self.viewport.set_focused(Some(index));
            self.viewport.scroll_to_index(index);
            self.notify();
        }
    }

    pub fn open_preview(&mut self, name: &str) -> bool {
        let Some(entry) = self.cache.get(self.nav.connection(), self.nav.path()) else {
            return false;
        };
        let opened = self.nav.open_preview(&entry.listing, name);
        if opened {
            self.sync_focus();
            self.notify();
        }
        opened
    }

    pub fn next_preview(&mut self) -> bool {
        let moved = self.nav.next_preview();
        self.sync_focus();
        if moved {
            self.notify();
        }
        moved
    }

    pub fn previous_preview(&mut self) -> bool {
        let moved = self.nav.previous_preview();
        self.sync_focus();
        if moved {
            self.notify();
        }
        moved
    }

    pub fn close_preview(&mut self) {
        if self.nav.preview().is_some() {
            self.nav.close_preview();
            self.notify();
        }
    }

    pub fn preview_request(&self) -> Option<PreviewRequest> {
        self.nav.preview_request()
    }

    /// Open the selected entry: directories navigate, files preview.
    pub fn open_selected(&mut self) -> Option<Effect> {
        let entry = self.selected_entry()?.clone();
        if entry.is_dir() {
            match self.nav.path().join(&entry.name) {
                Ok(path) => Some(Effect::Navigate(path)),
                Err(e) => {
                    log::warn!("cannot open {:?}: {}", entry.name, e);
                    None
                }
            }
        } else {
            self.open_preview(&entry.name);
            None
        }
    }

    /// Apply a keyboard command. Commands that need the network return an
    /// [`Effect`] for [`run_effect`].
    pub fn apply_command(&mut self, command: ExplorerCommand) -> Option<Effect> {
        match command {
            ExplorerCommand::GoUp => self.nav.path().parent().map(Effect::Navigate),
            ExplorerCommand::OpenSelected => self.open_selected(),
            ExplorerCommand::SelectNext => {
                self.select_next();
                None
            }
            ExplorerCommand::SelectPrevious => {
                self.select_previous();
                None
            }
            ExplorerCommand::NextPreview => {
                self.next_preview();
                None
            }
            ExplorerCommand::PreviousPreview => {
                self.previous_preview();
                None
            }
            ExplorerCommand::ClosePreview => {
                self.close_preview();
                None
            }
            ExplorerCommand::Refresh => Some(Effect::Refresh),
        }
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    pub fn set_scroll_offset(&mut self, offset: f64) {
        let before = self.viewport.visible_range();
        self.viewport.set_scroll_offset(offset);
        if self.viewport.visible_range() != before {
            self.notify();
        }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        let before = self.viewport.visible_range();
        self.viewport.set_viewport_height(height);
        if self.viewport.visible_range() != before {
            self.notify();
        }
    }

    // =========================================================================
    // Live Updates
    // =========================================================================

    /// Handle one text frame from the live transport.
    ///
    /// Returns `true` when the current listing was invalidated and should be
    /// refreshed.
    pub fn on_live_message(&mut self, generation: u64, text: &str) -> bool {
        let event = self.live.on_message(generation, text, &mut self.cache);
        match event {
            LiveEvent::Applied { connection, path } if self.is_current(&connection, &path) => {
                if let Some(entry) = self.cache.get(&connection, &path) {
                    self.nav.reconcile(&entry.listing);
                }
                self.sync_viewport();
                self.notify();
                false
            }
            LiveEvent::Invalidated { connection, path } => self.is_current(&connection, &path),
            _ => false,
        }
    }

    fn is_current(&self, connection: &ConnectionId, path: &RemotePath) -> bool {
        connection == self.nav.connection() && path == self.nav.path()
    }

    /// Move the live subscription to the current path. The new path is
    /// subscribed before the old one is released so the channel stays open.
    fn subscribe_current(&mut self) {
        let key = (self.nav.connection().clone(), self.nav.path().clone());
        if self.subscribed.as_ref() == Some(&key) {
            return;
        }
        self.live.subscribe(&key.0, &key.1);
        if let Some((connection, path)) = self.subscribed.replace(key) {
            self.live.unsubscribe(&connection, &path);
        }
    }

    fn release_subscription(&mut self) {
        if let Some((connection, path)) = self.subscribed.take() {
            self.live.unsubscribe(&connection, &path);
        }
    }

    /// Refresh row count and focus from the current listing.
    fn sync_viewport(&mut self) {
        let count = self.listing().map_or(0, |l| l.entries.len());
        self.viewport.set_count(count);
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        let index = self
            .nav
            .selected()
            .and_then(|name| self.listing()?.position(name));
        self.viewport.set_focused(index);
        if let Some(index) = index {
            self.viewport.scroll_to_index(index);
        }
    }
}

// =============================================================================
// Async Drivers
// =============================================================================

/// Shared handle the drivers operate on.
pub type SharedExplorer<T> = Rc<RefCell<Explorer<T>>>;

/// Navigate to `path`, walking up to the nearest existing ancestor when the
/// path has disappeared.
pub async fn navigate<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
    path: RemotePath,
) -> Completion
where
    C: RemoteClient,
    T: LiveTransport,
{
    let mut path = path;
    loop {
        let ticket = explorer.borrow_mut().begin_navigation(path);
        let result = fetcher.fetch(&ticket.connection, &ticket.path).await;
        let completion = explorer.borrow_mut().complete(&ticket, result);
        match completion {
            Completion::Fallback(parent) => path = parent,
            other => return other,
        }
    }
}

/// Navigate to an unvalidated path string.
pub async fn navigate_raw<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
    raw: &str,
) -> Completion
where
    C: RemoteClient,
    T: LiveTransport,
{
    match RemotePath::normalize(raw) {
        Ok(path) => navigate(explorer, fetcher, path).await,
        Err(e) => {
            explorer.borrow_mut().navigate_raw(raw);
            Completion::Failed(e.into())
        }
    }
}

/// Navigate to the parent directory. No-op at the root.
pub async fn go_up<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
) -> Option<Completion>
where
    C: RemoteClient,
    T: LiveTransport,
{
    let parent = explorer.borrow().path().parent()?;
    Some(navigate(explorer, fetcher, parent).await)
}

/// Revalidate the current directory in the background.
pub async fn refresh<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
) -> Option<Completion>
where
    C: RemoteClient,
    T: LiveTransport,
{
    let ticket = explorer.borrow_mut().begin_refresh()?;
    let result = fetcher.fetch(&ticket.connection, &ticket.path).await;
    let completion = explorer.borrow_mut().complete(&ticket, result);
    match completion {
        Completion::Fallback(parent) => Some(navigate(explorer, fetcher, parent).await),
        other => Some(other),
    }
}

/// Retry after an error.
pub async fn retry<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
) -> Option<Completion>
where
    C: RemoteClient,
    T: LiveTransport,
{
    let ticket = explorer.borrow_mut().retry()?;
    let result = fetcher.fetch(&ticket.connection, &ticket.path).await;
    let completion = explorer.borrow_mut().complete(&ticket, result);
    match completion {
        Completion::Fallback(parent) => Some(navigate(explorer, fetcher, parent).await),
        other => Some(other),
    }
}

/// Open a deep link. Directories are navigated to; files open their parent
/// and then preview the file.
///
/// The lookup is dropped if another navigation or deep link starts before
/// it returns. Background refreshes do not cancel it.
pub async fn open_location<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
    path: RemotePath,
) -> Completion
where
    C: RemoteClient,
    T: LiveTransport,
{
    let ticket = explorer.borrow_mut().begin_resolve(path);
    let info = fetcher.entry_info(&ticket.connection, &ticket.path).await;
    if !explorer.borrow().state().is_latest(&ticket) {
        log::debug!("discarding superseded lookup for {}", ticket.path);
        return Completion::Discarded;
    }
    let path = ticket.path;

    match info {
        Ok(entry) if !entry.is_dir() => {
            let Some(parent) = path.parent() else {
                return navigate(explorer, fetcher, path).await;
            };
            let completion = navigate(explorer, fetcher, parent.clone()).await;
            if completion == Completion::Committed {
                let mut explorer = explorer.borrow_mut();
                if explorer.path() == &parent && !explorer.open_preview(&entry.name) {
                    explorer.select(&entry.name);
                }
            }
            completion
        }
        // Directories, and anything the info call could not resolve, go
        // through regular navigation so errors and fallback apply.
        _ => navigate(explorer, fetcher, path).await,
    }
}

/// Run the follow-up of [`Explorer::apply_command`].
pub async fn run_effect<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
    effect: Effect,
) -> Option<Completion>
where
    C: RemoteClient,
    T: LiveTransport,
{
    match effect {
        Effect::Navigate(path) => Some(navigate(explorer, fetcher, path).await),
        Effect::Refresh => refresh(explorer, fetcher).await,
    }
}

/// Handle a live frame, refreshing the view if the current directory was
/// invalidated.
pub async fn live_message<C, T>(
    explorer: &SharedExplorer<T>,
    fetcher: &ListingFetcher<C>,
    generation: u64,
    text: &str,
) where
    C: RemoteClient,
    T: LiveTransport,
{
    let needs_refresh = explorer.borrow_mut().on_live_message(generation, text);
    if needs_refresh {
        refresh(explorer, fetcher).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::oneshot;

    use super::*;
    use crate::live::{ChannelState, ClientMessage};
    use crate::models::{EntryKind, EntryPayload, ListingPayload};

    #[derive(Default)]
    struct FakeTransport {
        sent: Vec<ClientMessage>,
    }

    impl LiveTransport for FakeTransport {
        fn open(&mut self, _generation: u64) -> Result<(), ExplorerError> {
            Ok(())
        }

        fn send(&mut self, message: &ClientMessage) -> Result<(), ExplorerError> {
            self.sent.push(message.clone());
            Ok(())
        }

        fn close(&mut self) {}
    }

    /// Remote whose listings are released by the test, one gate per path.
    /// Info lookups answer at once unless held.
    #[derive(Default)]
    struct GatedClient {
        gates: RefCell<HashMap<String, oneshot::Receiver<Result<ListingPayload, ExplorerError>>>>,
        held_info: RefCell<HashMap<String, oneshot::Receiver<()>>>,
        files: Vec<String>,
    }

    impl GatedClient {
        fn gate(&self, path: &str) -> oneshot::Sender<Result<ListingPayload, ExplorerError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(path.to_string(), rx);
            tx
        }

        fn hold_info(&self, path: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.held_info.borrow_mut().insert(path.to_string(), rx);
            tx
        }
    }

    impl RemoteClient for GatedClient {
        async fn list_directory(
            &self,
            _connection: &ConnectionId,
            path: &RemotePath,
        ) -> Result<ListingPayload, ExplorerError> {
            let gate = self.gates.borrow_mut().remove(&path.to_query());
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ExplorerError::RemoteUnavailable("dropped".into()))),
                None => Err(ExplorerError::NotFound(path.to_string())),
            }
        }

        async fn file_info(
            &self,
            _connection: &ConnectionId,
            path: &RemotePath,
        ) -> Result<EntryPayload, ExplorerError> {
            let query = path.to_query();
            let held = self.held_info.borrow_mut().remove(&query);
            if let Some(rx) = held {
                let _ = rx.await;
            }
            let kind = if self.files.contains(&query) {
                EntryKind::File
            } else {
                EntryKind::Directory
            };
            Ok(item(path.name().unwrap_or_default(), kind))
        }
    }

    fn item(name: &str, kind: EntryKind) -> EntryPayload {
        EntryPayload {
            name: name.to_string(),
            path: String::new(),
            kind,
            size: (kind == EntryKind::File).then_some(1),
            mime_type: None,
            created_at: None,
            modified_at: None,
            is_readable: true,
            is_hidden: false,
        }
    }

    fn listing(names: &[&str]) -> Result<ListingPayload, ExplorerError> {
        let items: Vec<EntryPayload> = names.iter().map(|n| item(n, EntryKind::File)).collect();
        Ok(ListingPayload {
            path: String::new(),
            total: items.len(),
            items,
        })
    }

    fn path(raw: &str) -> RemotePath {
        RemotePath::normalize(raw).unwrap()
    }

    fn explorer() -> SharedExplorer<FakeTransport> {
        Rc::new(RefCell::new(Explorer::new(
            ConnectionId::new("c1"),
            FakeTransport::default(),
            ExplorerConfig::default(),
        )))
    }

    // =========================================================================
    // Commit Ordering
    // =========================================================================

    #[tokio::test]
    async fn test_late_result_is_discarded() {
        let explorer = explorer();
        let client = GatedClient::default();
        let gate_a = client.gate("a");
        let gate_b = client.gate("b");
        let fetcher = ListingFetcher::new(client);

        let first = navigate(&explorer, &fetcher, path("/a"));
        let second = navigate(&explorer, &fetcher, path("/b"));
        let release = async {
            tokio::task::yield_now().await;
            let _ = gate_b.send(listing(&["from-b"]));
            tokio::task::yield_now().await;
            let _ = gate_a.send(listing(&["from-a"]));
        };
        let (first, second, ()) = tokio::join!(first, second, release);

        assert_eq!(first, Completion::Discarded);
        assert_eq!(second, Completion::Committed);
        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/b"));
        assert_eq!(explorer.listing().unwrap().entries[0].name, "from-b");
        assert!(explorer.cache().get(&ConnectionId::new("c1"), &path("/a")).is_none());
    }

    #[tokio::test]
    async fn test_not_found_walks_up() {
        let explorer = explorer();
        let client = GatedClient::default();
        let gate = client.gate("docs");
        let _ = gate.send(listing(&["kept.txt"]));
        let fetcher = ListingFetcher::new(client);

        // Neither /docs/old/deeper nor /docs/old has a gate, so both 404
        let completion = navigate(&explorer, &fetcher, path("/docs/old/deeper")).await;
        assert_eq!(completion, Completion::Committed);
        assert_eq!(explorer.borrow().path(), &path("/docs"));
        assert_eq!(explorer.borrow().phase(), &Phase::Idle);
    }

    #[tokio::test]
    async fn test_not_found_at_root_is_an_error() {
        let explorer = explorer();
        let fetcher = ListingFetcher::new(GatedClient::default());
        let completion = navigate(&explorer, &fetcher, path("/gone")).await;
        assert!(matches!(completion, Completion::Failed(ExplorerError::NotFound(_))));
        assert!(!explorer.borrow().phase().is_loading());
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_stale_listing() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("").send(listing(&["a"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, RemotePath::root()).await;

        let _ = fetcher
            .client()
            .gate("")
            .send(Err(ExplorerError::RemoteUnavailable("timeout".into())));
        let completion = refresh(&explorer, &fetcher).await;
        assert!(matches!(completion, Some(Completion::Failed(_))));

        let explorer = explorer.borrow();
        assert!(explorer.phase().error().is_some_and(ExplorerError::is_retryable));
        assert_eq!(explorer.listing().unwrap().total, 1);
        assert!(!explorer.current().unwrap().refreshing);
    }

    #[tokio::test]
    async fn test_invalid_raw_path_falls_back() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("docs").send(listing(&["a"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, path("/docs")).await;

        let completion = navigate_raw(&explorer, &fetcher, "/docs/../../etc").await;
        assert!(matches!(completion, Completion::Failed(ExplorerError::InvalidPath(_))));
        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/docs"));
        assert!(matches!(explorer.phase(), Phase::Error(ExplorerError::InvalidPath(_))));
        // Still subscribed to the last good path
        assert!(explorer
            .live()
            .is_subscribed(&ConnectionId::new("c1"), &path("/docs")));
    }

    // =========================================================================
    // Subscriptions & Live Updates
    // =========================================================================

    #[tokio::test]
    async fn test_subscription_follows_navigation() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("a").send(listing(&[]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, path("/a")).await;

        let conn = ConnectionId::new("c1");
        {
            let mut explorer = explorer.borrow_mut();
            let generation = explorer.live().generation();
            explorer.live_mut().on_open(generation);
            assert!(explorer.live().is_subscribed(&conn, &path("/a")));
        }

        // Leaving moves the subscription before the new fetch finishes
        let gate_b = fetcher.client().gate("b");
        let pending = navigate(&explorer, &fetcher, path("/b"));
        let check = async {
            tokio::task::yield_now().await;
            let explorer = explorer.borrow();
            assert!(!explorer.live().is_subscribed(&conn, &path("/a")));
            assert!(explorer.live().is_subscribed(&conn, &path("/b")));
            assert_eq!(explorer.live().state(), ChannelState::Connected);
            drop(explorer);
            let _ = gate_b.send(listing(&[]));
        };
        tokio::join!(pending, check);
        assert!(explorer.borrow().live().is_subscribed(&conn, &path("/b")));
        assert_eq!(explorer.borrow().live().subscription_count(), 1);
        assert_eq!(explorer.borrow().live().state(), ChannelState::Connected);
    }

    #[tokio::test]
    async fn test_invalid_path_during_fetch_restores_last_good() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("docs").send(listing(&["a"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, path("/docs")).await;

        let conn = ConnectionId::new("c1");
        let gate_x = fetcher.client().gate("x");
        let pending = navigate(&explorer, &fetcher, path("/x"));
        let check = async {
            tokio::task::yield_now().await;
            {
                let mut explorer = explorer.borrow_mut();
                assert!(explorer.live().is_subscribed(&conn, &path("/x")));
                assert!(explorer.navigate_raw("/../etc").is_none());

                assert_eq!(explorer.path(), &path("/docs"));
                assert!(explorer.live().is_subscribed(&conn, &path("/docs")));
                assert!(!explorer.live().is_subscribed(&conn, &path("/x")));
                assert!(explorer.cache().is_pinned(&conn, &path("/docs")));
                assert_eq!(explorer.viewport().count(), 1);
            }
            let _ = gate_x.send(listing(&["late"]));
        };
        let (completion, ()) = tokio::join!(pending, check);

        assert_eq!(completion, Completion::Discarded);
        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/docs"));
        assert!(matches!(explorer.phase(), Phase::Error(ExplorerError::InvalidPath(_))));
        assert!(explorer.cache().get(&conn, &path("/x")).is_none());
    }

    #[tokio::test]
    async fn test_removed_selection_is_cleared() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("").send(listing(&["a", "b", "c"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, RemotePath::root()).await;

        let mut explorer = explorer.borrow_mut();
        assert!(explorer.select("c"));
        assert_eq!(explorer.viewport().focused(), Some(2));

        let generation = explorer.live().generation();
        let text = r#"{"type":"entry_changed","connection_id":"c1","path":"",
                       "change":"removed","entry_name":"c"}"#;
        assert!(!explorer.on_live_message(generation, text));
        assert_eq!(explorer.state().selected(), None);
        assert_eq!(explorer.viewport().focused(), None);
        assert_eq!(explorer.viewport().count(), 2);
    }

    #[tokio::test]
    async fn test_directory_changed_triggers_refresh() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("").send(listing(&["a"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, RemotePath::root()).await;
        explorer.borrow_mut().select("a");

        let _ = fetcher.client().gate("").send(listing(&["a", "b"]));
        let generation = explorer.borrow().live().generation();
        let text = r#"{"type":"directory_changed","connection_id":"c1","path":""}"#;
        live_message(&explorer, &fetcher, generation, text).await;

        let explorer = explorer.borrow();
        assert_eq!(explorer.listing().unwrap().total, 2);
        assert!(!explorer.current().unwrap().stale);
        assert_eq!(explorer.state().selected(), Some("a"));
    }

    #[tokio::test]
    async fn test_change_listener_sees_loading_state() {
        let explorer = explorer();
        let client = GatedClient::default();
        let gate = client.gate("");
        let fetcher = ListingFetcher::new(client);

        let changes = Rc::new(RefCell::new(0usize));
        let counter = changes.clone();
        explorer
            .borrow_mut()
            .set_change_listener(move || *counter.borrow_mut() += 1);

        let pending = navigate(&explorer, &fetcher, RemotePath::root());
        let check = async {
            tokio::task::yield_now().await;
            assert_eq!(*changes.borrow(), 1);
            assert!(explorer.borrow().phase().is_loading());
            let _ = gate.send(listing(&["a"]));
        };
        tokio::join!(pending, check);
        assert_eq!(*changes.borrow(), 2);

        // Selecting an unknown entry is not a change
        assert!(!explorer.borrow_mut().select("missing"));
        assert_eq!(*changes.borrow(), 2);
    }

    // =========================================================================
    // Commands & Deep Links
    // =========================================================================

    #[tokio::test]
    async fn test_open_location_previews_file() {
        let explorer = explorer();
        let client = GatedClient {
            files: vec!["pics/b.png".into()],
            ..Default::default()
        };
        let _ = client.gate("pics").send(listing(&["a.png", "b.png", "c.txt"]));
        let fetcher = ListingFetcher::new(client);

        let completion = open_location(&explorer, &fetcher, path("/pics/b.png")).await;
        assert_eq!(completion, Completion::Committed);

        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/pics"));
        let request = explorer.preview_request().unwrap();
        assert_eq!(request.path, path("/pics/b.png"));
        assert_eq!(request.gallery, vec![path("/pics/a.png"), path("/pics/b.png")]);
        assert_eq!(request.index, 1);
    }

    #[tokio::test]
    async fn test_latest_deep_link_wins() {
        let explorer = explorer();
        let client = GatedClient::default();
        let hold_a = client.hold_info("a");
        let hold_b = client.hold_info("b");
        let _ = client.gate("a").send(listing(&["from-a"]));
        let _ = client.gate("b").send(listing(&["from-b"]));
        let fetcher = ListingFetcher::new(client);

        let first = open_location(&explorer, &fetcher, path("/a"));
        let second = open_location(&explorer, &fetcher, path("/b"));
        let release = async {
            tokio::task::yield_now().await;
            let _ = hold_a.send(());
            tokio::task::yield_now().await;
            let _ = hold_b.send(());
        };
        let (first, second, ()) = tokio::join!(first, second, release);

        assert_eq!(first, Completion::Discarded);
        assert_eq!(second, Completion::Committed);
        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/b"));
        assert_eq!(explorer.listing().unwrap().entries[0].name, "from-b");
    }

    #[tokio::test]
    async fn test_refresh_does_not_cancel_deep_link() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("").send(listing(&["b"]));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, RemotePath::root()).await;

        let hold_b = fetcher.client().hold_info("b");
        let _ = fetcher.client().gate("").send(listing(&["b", "c"]));
        let _ = fetcher.client().gate("b").send(listing(&["inside"]));

        let deep_link = open_location(&explorer, &fetcher, path("/b"));
        let background = async {
            tokio::task::yield_now().await;
            let refreshed = refresh(&explorer, &fetcher).await;
            let _ = hold_b.send(());
            refreshed
        };
        let (opened, refreshed) = tokio::join!(deep_link, background);

        assert_eq!(refreshed, Some(Completion::Committed));
        assert_eq!(opened, Completion::Committed);
        let explorer = explorer.borrow();
        assert_eq!(explorer.path(), &path("/b"));
        assert_eq!(explorer.listing().unwrap().entries[0].name, "inside");
    }

    #[tokio::test]
    async fn test_commands_drive_navigation() {
        let explorer = explorer();
        let client = GatedClient::default();
        let _ = client.gate("").send(Ok(ListingPayload {
            path: String::new(),
            total: 2,
            items: vec![item("docs", EntryKind::Directory), item("a.txt", EntryKind::File)],
        }));
        let fetcher = ListingFetcher::new(client);
        navigate(&explorer, &fetcher, RemotePath::root()).await;

        assert_eq!(explorer.borrow_mut().apply_command(ExplorerCommand::GoUp), None);
        explorer.borrow_mut().apply_command(ExplorerCommand::SelectNext);
        let effect = explorer
            .borrow_mut()
            .apply_command(ExplorerCommand::OpenSelected);
        assert_eq!(effect, Some(Effect::Navigate(path("/docs"))));

        explorer.borrow_mut().apply_command(ExplorerCommand::SelectNext);
        assert_eq!(
            explorer.borrow_mut().apply_command(ExplorerCommand::OpenSelected),
            None
        );
        assert!(explorer.borrow().key_context().previewing);

        let _ = fetcher.client().gate("docs").send(listing(&[]));
        let completion = run_effect(&explorer, &fetcher, Effect::Navigate(path("/docs"))).await;
        assert_eq!(completion, Some(Completion::Committed));
        assert!(!explorer.borrow().key_context().previewing);
    }
}
