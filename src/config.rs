//! Application configuration.
//!
//! Centralizes the constants used by the web layer. Engine tuning is loaded
//! at compile time from `assets/explorer.toml` using `include_str!`.

use sharenav_core::ExplorerConfig;

// =============================================================================
// Assets (loaded at compile time)
// =============================================================================

/// Engine tuning overrides.
const EXPLORER_TOML: &str = include_str!("../assets/explorer.toml");

/// Parse the embedded engine configuration, falling back to defaults.
pub fn explorer_config() -> ExplorerConfig {
    parse_explorer_config(EXPLORER_TOML)
}

fn parse_explorer_config(raw: &str) -> ExplorerConfig {
    toml::from_str(raw).unwrap_or_else(|e| {
        log::warn!("invalid explorer.toml, using defaults: {}", e);
        ExplorerConfig::default()
    })
}

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name displayed in the status bar.
pub const APP_NAME: &str = "sharenav";

/// Minimum log level forwarded to the browser console.
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

// =============================================================================
// Network Configuration
// =============================================================================

/// Base path of the REST API (same origin).
pub const API_BASE: &str = "/api";

/// Path of the live-update WebSocket endpoint.
pub const LIVE_PATH: &str = "/api/ws";

/// Fetch request timeout in milliseconds.
pub const FETCH_TIMEOUT_MS: i32 = 15000;

// =============================================================================
// Storage Keys
// =============================================================================

/// localStorage key holding the bearer token issued at login.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

// =============================================================================
// UI Configuration
// =============================================================================

/// Icon theme selection.
///
/// Available themes:
/// - `Bootstrap` - Familiar, slightly bolder (default)
/// - `Lucide` - Minimal, thin strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(dead_code)]
pub enum IconTheme {
    #[default]
    Bootstrap,
    Lucide,
}

/// Current icon theme used throughout the application.
pub const ICON_THEME: IconTheme = IconTheme::Bootstrap;
