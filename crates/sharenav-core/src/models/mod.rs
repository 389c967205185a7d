//! Data models shared by the cache, fetcher and live channel.
//!
//! - [`ConnectionId`] - which remote share a path belongs to
//! - [`Entry`], [`EntryKind`], [`FileCategory`] - one item of a listing
//! - [`DirectoryListing`] - a materialized directory
//! - [`EntryPayload`], [`ListingPayload`] - wire shapes from the browse API
//! - [`Delta`], [`ChangeKind`] - incremental change notifications

mod connection;
mod delta;
mod entry;
mod listing;

pub use connection::ConnectionId;
pub use delta::{ChangeKind, Delta};
pub use entry::{Entry, EntryKind, FileCategory};
pub use listing::{DirectoryListing, EntryPayload, ListingPayload};
