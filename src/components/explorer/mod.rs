//! File explorer UI components.
//!
//! Components:
//! - [`Explorer`] - Main explorer view
//! - [`FileList`] - Virtualized list of the current directory
//! - [`PathBar`] - Clickable breadcrumb of the current path
//! - [`PreviewPane`] - Viewer frame with gallery stepping
//!
//! [`install_keyboard`] binds the explorer keymap to the window.

#[allow(clippy::module_inception)]
mod explorer;
mod file_list;
mod keyboard;
mod pathbar;
mod preview_pane;

pub use explorer::Explorer;
pub use file_list::FileList;
pub use keyboard::install_keyboard;
pub use pathbar::PathBar;
pub use preview_pane::PreviewPane;
