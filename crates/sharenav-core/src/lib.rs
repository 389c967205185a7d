//! Directory navigation and live-update engine for sharenav.
//!
//! The engine is DOM-free and single-threaded. The web application supplies
//! a [`RemoteClient`] for the browse API and a [`LiveTransport`] for change
//! notifications; everything else lives here:
//!
//! - [`path`] - canonical remote paths
//! - [`cache`] - per-directory listing cache with stale-while-revalidate
//! - [`fetcher`] - listing retrieval and normalization
//! - [`live`] - ref-counted subscriptions over one reconnecting channel
//! - [`navigation`] / [`explorer`] - navigation state machine and drivers
//! - [`viewport`] - visible row window for large listings
//! - [`keymap`] - keyboard command dispatch

pub mod cache;
pub mod config;
pub mod error;
pub mod explorer;
pub mod fetcher;
pub mod keymap;
pub mod live;
pub mod models;
pub mod navigation;
pub mod path;
pub mod viewport;

pub use cache::{CacheEntry, CacheKey, DirectoryCache};
pub use config::ExplorerConfig;
pub use error::{ExplorerError, PathError};
pub use explorer::{Effect, Explorer, SharedExplorer};
pub use fetcher::{ListingFetcher, RemoteClient};
pub use keymap::{Dispatch, ExplorerCommand, ExplorerKeyContext, KeyCommand, KeyInput, Keymap, Modifiers};
pub use live::{ChannelState, ClientMessage, LiveChannel, LiveEvent, LiveTransport, ServerMessage};
pub use models::{ChangeKind, ConnectionId, Delta, DirectoryListing, Entry, EntryKind, FileCategory};
pub use navigation::{
    Completion, FetchTicket, NavigationState, Phase, PreviewRequest, PreviewState, ResolveTicket,
};
pub use path::RemotePath;
pub use viewport::{Viewport, VisibleRange};
