//! Data models for the application shell.
//!
//! Engine types live in `sharenav_core`; this module only holds
//! [`Route`], the hash-based location.

mod route;

pub use route::Route;
