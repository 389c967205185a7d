//! DOM and Web API utility functions.
//!
//! Provides safe, consistent access to browser APIs with proper error handling.

use wasm_bindgen::JsCast;
use web_sys::{Storage, Window};

use crate::config::AUTH_TOKEN_KEY;

/// Get the browser window object.
#[inline]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Get localStorage.
#[inline]
pub fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

/// Bearer token stored by the login page, if any.
pub fn auth_token() -> Option<String> {
    local_storage()?
        .get_item(AUTH_TOKEN_KEY)
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
}

/// Whether keyboard focus is inside an editable field.
pub fn is_text_input_focused() -> bool {
    let Some(active) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
    else {
        return false;
    };
    active.is_instance_of::<web_sys::HtmlInputElement>()
        || active.is_instance_of::<web_sys::HtmlTextAreaElement>()
        || active
            .dyn_ref::<web_sys::HtmlElement>()
            .is_some_and(|el| el.is_content_editable())
}

/// Origin-relative `ws://` or `wss://` URL for `path`.
pub fn websocket_url(path: &str) -> Option<String> {
    let location = window()?.location();
    let scheme = match location.protocol().ok()?.as_str() {
        "https:" => "wss",
        _ => "ws",
    };
    let host = location.host().ok()?;
    Some(format!("{}://{}{}", scheme, host, path))
}

// =============================================================================
// Browser Navigation
// =============================================================================

/// Get the current URL hash (without the '#' prefix).
pub fn get_hash() -> String {
    window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
        .trim_start_matches('#')
        .to_string()
}

/// Set the URL hash (adds to browser history).
///
/// The hash should include the '#' prefix.
pub fn set_hash(hash: &str) {
    if let Some(window) = window() {
        let _ = window.location().set_hash(hash);
    }
}

/// Replace the URL hash without adding to browser history.
///
/// The hash should include the '#' prefix.
/// Useful for redirects that shouldn't appear in back button history.
pub fn replace_hash(hash: &str) {
    if let Some(window) = window()
        && let Ok(history) = window.history()
    {
        let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(hash));
    }
}
