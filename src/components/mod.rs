//! UI components built with Leptos.
//!
//! - [`router`] - Application routing (main entry point)
//! - [`explorer`] - File browser UI
//! - [`icons`] - Centralized icon definitions (change theme here)
//! - [`status`] - Status bar showing connection, location and live state

pub mod explorer;
pub mod icons;
pub mod router;
pub mod status;

pub use router::AppRouter;
