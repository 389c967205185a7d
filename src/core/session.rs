//! Browser session around the explorer engine.
//!
//! A [`Session`] owns the shared engine, the HTTP listing fetcher and the
//! live socket, and drives the async parts (fetches, heartbeat, reconnect
//! timers) on the browser event loop. The URL hash is the source of truth
//! for location: user navigation writes the hash, and the router feeds every
//! hash change back through [`Session::open_route`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo_timers::future::sleep;
use leptos::prelude::*;
use leptos::task::spawn_local;
use sharenav_core::explorer::{self as engine, SharedExplorer};
use sharenav_core::{
    Completion, ConnectionId, Dispatch, Effect, Explorer, ExplorerCommand, ExplorerKeyContext,
    KeyInput, Keymap, ListingFetcher, LiveTransport, RemotePath,
};

use crate::config::{LIVE_PATH, explorer_config};
use crate::core::error::SocketError;
use crate::models::Route;
use crate::utils::dom;
use crate::utils::{HttpRemoteClient, SocketEvent, SocketHandler, WebSocketTransport};

// =============================================================================
// Location Resolution
// =============================================================================

/// How a requested location relates to what the engine already holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The current directory; only an open preview needs closing.
    Current,
    /// A previewable file of the current listing.
    PreviewInCurrent(String),
    /// A directory the engine has seen; navigate without probing.
    Directory,
    /// Unknown kind; resolve it with an info request first.
    Unknown,
}

/// Classify `path` against the explorer's current listing and cache.
pub fn resolve_target<T: LiveTransport>(explorer: &Explorer<T>, path: &RemotePath) -> Target {
    if path == explorer.path() && explorer.listing().is_some() && explorer.phase().error().is_none()
    {
        return Target::Current;
    }
    if path.is_root() || explorer.cache().get(explorer.connection(), path).is_some() {
        return Target::Directory;
    }
    let Some(parent) = path.parent() else {
        return Target::Unknown;
    };
    let Some(entry) = path.name().and_then(|name| {
        explorer
            .cache()
            .get(explorer.connection(), &parent)?
            .listing
            .get(name)
    }) else {
        return Target::Unknown;
    };

    if entry.is_dir() {
        Target::Directory
    } else if &parent == explorer.path() {
        Target::PreviewInCurrent(entry.name.clone())
    } else {
        Target::Unknown
    }
}

/// Location the URL hash should show: the previewed file, else the directory.
pub fn location<T: LiveTransport>(explorer: &Explorer<T>) -> Route {
    match explorer.preview_request() {
        Some(request) => Route::browse(&request.connection, &request.path),
        None => Route::browse(explorer.connection(), explorer.path()),
    }
}

// =============================================================================
// Session
// =============================================================================

pub type ExplorerKeymap = Keymap<ExplorerCommand, ExplorerKeyContext>;

pub struct Session {
    explorer: SharedExplorer<WebSocketTransport>,
    fetcher: ListingFetcher<HttpRemoteClient>,
    keymap: ExplorerKeymap,
    /// Bumped on every engine change; views track it to re-render.
    revision: RwSignal<u64>,
    /// Reconnect timer currently sleeping.
    reconnect_pending: Cell<bool>,
}

impl Session {
    /// Create the engine for `connection` and start the heartbeat loop.
    pub fn start(connection: ConnectionId, revision: RwSignal<u64>) -> Result<Rc<Self>, SocketError> {
        let url = dom::websocket_url(LIVE_PATH).ok_or(SocketError::InvalidLocation)?;

        let session = Rc::new_cyclic(|weak: &Weak<Session>| {
            let weak = weak.clone();
            let handler: SocketHandler = Rc::new(move |event| {
                if let Some(session) = weak.upgrade() {
                    session.on_socket_event(event);
                }
            });

            let transport = WebSocketTransport::new(url, handler);
            let mut explorer = Explorer::new(connection, transport, explorer_config());
            explorer.set_change_listener(move || {
                let _ = revision.try_update(|r| *r = r.wrapping_add(1));
            });

            Self {
                explorer: Rc::new(RefCell::new(explorer)),
                fetcher: ListingFetcher::new(HttpRemoteClient),
                keymap: ExplorerKeymap::explorer_default(),
                revision,
                reconnect_pending: Cell::new(false),
            }
        });

        session.spawn_heartbeat();
        Ok(session)
    }

    /// Read the engine and subscribe the calling view to changes.
    pub fn with<R>(&self, f: impl FnOnce(&Explorer<WebSocketTransport>) -> R) -> R {
        self.revision.track();
        f(&self.explorer.borrow())
    }

    fn touch(&self) {
        let _ = self.revision.try_update(|r| *r = r.wrapping_add(1));
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Bring the engine to the location named by a hash route.
    pub fn open_route(self: &Rc<Self>, connection: ConnectionId, raw_path: String) {
        {
            let mut explorer = self.explorer.borrow_mut();
            if explorer.connection() != &connection {
                explorer.switch_connection(connection);
            }
        }

        let path = match RemotePath::normalize(&raw_path) {
            Ok(path) => path,
            Err(_) => {
                self.explorer.borrow_mut().navigate_raw(&raw_path);
                self.sync_hash();
                return;
            }
        };

        let target = resolve_target(&self.explorer.borrow(), &path);
        log::debug!("route {} resolved as {:?}", path, target);
        match target {
            Target::Current => {
                let mut explorer = self.explorer.borrow_mut();
                explorer.cancel_lookups();
                explorer.close_preview();
            }
            Target::PreviewInCurrent(name) => {
                let mut explorer = self.explorer.borrow_mut();
                explorer.cancel_lookups();
                if !explorer.open_preview(&name) {
                    explorer.select(&name);
                }
            }
            Target::Directory => {
                let session = self.clone();
                spawn_local(async move {
                    let completion =
                        engine::navigate(&session.explorer, &session.fetcher, path).await;
                    session.settle(Some(&completion));
                });
            }
            Target::Unknown => {
                let session = self.clone();
                spawn_local(async move {
                    let completion =
                        engine::open_location(&session.explorer, &session.fetcher, path).await;
                    session.settle(Some(&completion));
                });
            }
        }
    }

    /// Push a new location onto the browser history.
    pub fn navigate_to(&self, path: &RemotePath) {
        let connection = self.explorer.borrow().connection().clone();
        dom::set_hash(&Route::browse(&connection, path).to_hash());
    }

    /// Replace the URL hash with the engine's location after fallbacks,
    /// preview stepping and similar changes the user did not type.
    fn sync_hash(&self) {
        let route = location(&self.explorer.borrow());
        if Route::current() != route {
            dom::replace_hash(&route.to_hash());
        }
    }

    /// Common tail of every async driver. A discarded result leaves the
    /// hash to the request that superseded it.
    fn settle(self: &Rc<Self>, completion: Option<&Completion>) {
        if completion != Some(&Completion::Discarded) {
            self.sync_hash();
        }
        self.schedule_reconnect();
    }

    // =========================================================================
    // User Actions
    // =========================================================================

    pub fn refresh(self: &Rc<Self>) {
        let session = self.clone();
        spawn_local(async move {
            let completion = engine::refresh(&session.explorer, &session.fetcher).await;
            session.settle(completion.as_ref());
        });
    }

    pub fn retry(self: &Rc<Self>) {
        let session = self.clone();
        spawn_local(async move {
            let completion = engine::retry(&session.explorer, &session.fetcher).await;
            session.settle(completion.as_ref());
        });
    }

    pub fn go_up(&self) {
        let parent = self.explorer.borrow().path().parent();
        if let Some(parent) = parent {
            self.navigate_to(&parent);
        }
    }

    /// Activate an entry of the current listing (click or double-click).
    pub fn open_entry(&self, name: &str) {
        let target = {
            let explorer = self.explorer.borrow();
            explorer.path().join(name).ok()
        };
        match target {
            Some(path) => self.navigate_to(&path),
            None => log::warn!("cannot open {:?}", name),
        }
    }

    pub fn select(&self, name: &str) {
        self.explorer.borrow_mut().select(name);
    }

    pub fn next_preview(&self) {
        if self.explorer.borrow_mut().next_preview() {
            self.sync_hash();
        }
    }

    pub fn previous_preview(&self) {
        if self.explorer.borrow_mut().previous_preview() {
            self.sync_hash();
        }
    }

    pub fn close_preview(&self) {
        let path = self.explorer.borrow().path().clone();
        self.navigate_to(&path);
    }

    pub fn set_scroll_offset(&self, offset: f64) {
        self.explorer.borrow_mut().set_scroll_offset(offset);
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.explorer.borrow_mut().set_viewport_height(height);
    }

    /// Route a key press through the keymap.
    pub fn dispatch_key(self: &Rc<Self>, input: &KeyInput) -> Dispatch {
        let context = self.explorer.borrow().key_context();
        let mut effect = None;
        let outcome = self.keymap.dispatch(input, &context, |command| {
            effect = self.explorer.borrow_mut().apply_command(*command);
        });

        if outcome == Dispatch::Handled {
            match effect {
                Some(Effect::Navigate(path)) => self.navigate_to(&path),
                Some(Effect::Refresh) => self.refresh(),
                None => self.sync_hash(),
            }
        }
        outcome
    }

    // =========================================================================
    // Live Channel
    // =========================================================================

    fn on_socket_event(self: &Rc<Self>, event: SocketEvent) {
        match event {
            SocketEvent::Open(generation) => {
                self.explorer.borrow_mut().live_mut().on_open(generation);
                self.touch();
            }
            SocketEvent::Close(generation) => {
                // The delay is collected through schedule_reconnect
                let _ = self.explorer.borrow_mut().live_mut().on_close(generation);
                self.touch();
                self.schedule_reconnect();
            }
            SocketEvent::Message(generation, text) => {
                let stale = self.explorer.borrow_mut().on_live_message(generation, &text);
                if stale {
                    self.refresh();
                } else {
                    // A delta may have closed the preview
                    self.sync_hash();
                }
            }
        }
    }

    /// Start a reconnect timer if the channel asked for one.
    fn schedule_reconnect(self: &Rc<Self>) {
        if self.reconnect_pending.get() {
            return;
        }
        let Some(delay) = self.explorer.borrow_mut().live_mut().take_reconnect_delay() else {
            return;
        };

        self.reconnect_pending.set(true);
        let weak = Rc::downgrade(self);
        spawn_local(async move {
            sleep(delay).await;
            let Some(session) = weak.upgrade() else {
                return;
            };
            session.reconnect_pending.set(false);
            session.explorer.borrow_mut().live_mut().reconnect();
            session.touch();
            // A synchronous open failure asks for the next attempt right away
            session.schedule_reconnect();
        });
    }

    fn spawn_heartbeat(self: &Rc<Self>) {
        let interval = self.explorer.borrow().config().live.heartbeat();
        let weak = Rc::downgrade(self);
        spawn_local(async move {
            loop {
                sleep(interval).await;
                let Some(session) = weak.upgrade() else {
                    break;
                };
                session.explorer.borrow_mut().live_mut().heartbeat();
                session.touch();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharenav_core::{ClientMessage, DirectoryListing, Entry, ExplorerConfig, ExplorerError};

    struct NullTransport;

    impl LiveTransport for NullTransport {
        fn open(&mut self, _generation: u64) -> Result<(), ExplorerError> {
            Ok(())
        }

        fn send(&mut self, _message: &ClientMessage) -> Result<(), ExplorerError> {
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn path(raw: &str) -> RemotePath {
        RemotePath::normalize(raw).unwrap()
    }

    /// Explorer sitting in `/docs` with a small listing.
    fn explorer_in_docs() -> Explorer<NullTransport> {
        let mut explorer = Explorer::new(
            ConnectionId::new("c1"),
            NullTransport,
            ExplorerConfig::default(),
        );
        let mut image = Entry::file("a.png", 10);
        image.mime_type = Some("image/png".into());
        let ticket = explorer.begin_navigation(path("/docs"));
        let listing = DirectoryListing::new(
            path("/docs"),
            vec![Entry::directory("sub"), image, Entry::file("b.bin", 3)],
        );
        explorer.complete(&ticket, Ok(listing));
        explorer
    }

    #[test]
    fn test_resolve_target() {
        let explorer = explorer_in_docs();
        assert_eq!(resolve_target(&explorer, &path("/docs")), Target::Current);
        assert_eq!(resolve_target(&explorer, &path("/docs/sub")), Target::Directory);
        assert_eq!(resolve_target(&explorer, &RemotePath::root()), Target::Directory);
        assert_eq!(
            resolve_target(&explorer, &path("/docs/a.png")),
            Target::PreviewInCurrent("a.png".into())
        );
        assert_eq!(resolve_target(&explorer, &path("/docs/new")), Target::Unknown);
        assert_eq!(resolve_target(&explorer, &path("/elsewhere/x")), Target::Unknown);
    }

    #[test]
    fn test_location_follows_preview() {
        let mut explorer = explorer_in_docs();
        let conn = ConnectionId::new("c1");
        assert_eq!(location(&explorer), Route::browse(&conn, &path("/docs")));

        assert!(explorer.open_preview("a.png"));
        assert_eq!(location(&explorer), Route::browse(&conn, &path("/docs/a.png")));

        explorer.close_preview();
        assert_eq!(location(&explorer), Route::browse(&conn, &path("/docs")));
    }
}
