//! Browser-side glue around the explorer engine.
//!
//! - [`Session`] - engine, fetcher and live socket driven on the event loop
//! - [`error`] - browser API error types

pub mod error;
mod session;

pub use session::Session;
