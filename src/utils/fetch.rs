//! Network fetching utilities with timeout support.
//!
//! Provides [`HttpRemoteClient`], the browse-API implementation of the
//! engine's [`RemoteClient`], on top of a timeout-raced Fetch API call.
//! File content for viewers goes through the same authenticated request and
//! is handed out as an object URL.

use js_sys::{Array, Promise};
use serde::de::DeserializeOwned;
use sharenav_core::models::{EntryPayload, ListingPayload};
use sharenav_core::{ConnectionId, ExplorerError, RemoteClient, RemotePath};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, Headers, Request, RequestInit, RequestMode, Response, Url};

use crate::config::{API_BASE, FETCH_TIMEOUT_MS};
use crate::core::error::FetchError;
use crate::utils::dom;

// =============================================================================
// Promise Racing Utilities
// =============================================================================

/// Result of a promise race with timeout.
#[derive(Debug)]
pub enum RaceResult {
    /// The promise completed before timeout.
    Completed(JsValue),
    /// Timeout occurred before promise completed.
    TimedOut,
    /// Promise rejected with an error.
    Error(String),
}

/// Race a promise against a timeout using `Promise.race`.
///
/// # Returns
/// * `RaceResult::Completed` if promise resolves before timeout
/// * `RaceResult::TimedOut` if timeout occurs first
/// * `RaceResult::Error` if promise rejects
pub async fn race_with_timeout(promise: Promise, timeout_ms: i32) -> RaceResult {
    let Some(window) = dom::window() else {
        return RaceResult::Error("Window not available".to_string());
    };

    // Create timeout promise that resolves to undefined
    let timeout_promise = Promise::new(&mut |resolve, _| {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout_ms);
    });

    let race_array = Array::new();
    race_array.push(&promise);
    race_array.push(&timeout_promise);
    let race_promise = Promise::race(&race_array);

    match JsFuture::from(race_promise).await {
        Ok(result) => {
            if result.is_undefined() {
                RaceResult::TimedOut
            } else {
                RaceResult::Completed(result)
            }
        }
        Err(e) => RaceResult::Error(e.as_string().unwrap_or_else(|| "Unknown error".to_string())),
    }
}

// =============================================================================
// URLs
// =============================================================================

/// `{API_BASE}/browse/{connection}/{action}?path=...`
pub fn browse_url(connection: &ConnectionId, action: &str, path: &RemotePath) -> String {
    format!(
        "{}/browse/{}/{}?path={}",
        API_BASE,
        urlencoding::encode(connection.as_str()),
        action,
        urlencoding::encode(&path.to_query())
    )
}

/// Content URL handed to viewers.
pub fn preview_url(connection: &ConnectionId, path: &RemotePath) -> String {
    format!(
        "{}/preview/{}/file?path={}",
        API_BASE,
        urlencoding::encode(connection.as_str()),
        urlencoding::encode(&path.to_query())
    )
}

// =============================================================================
// Fetch Functions
// =============================================================================

/// Fetch and parse JSON from a URL.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let text = fetch_url(url).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::JsonParseError(e.to_string()))
}

/// Fetch text from a URL.
async fn fetch_url(url: &str) -> Result<String, FetchError> {
    let resp = send_request(url).await?;
    read_text(&resp).await
}

/// Fetch a file and expose it as a `blob:` URL for the browser to open.
///
/// Release the URL with [`revoke_object_url`] once it is no longer shown.
pub async fn fetch_object_url(url: &str) -> Result<String, FetchError> {
    let resp = send_request(url).await?;
    let blob = JsFuture::from(resp.blob().map_err(|_| FetchError::ResponseReadFailed)?)
        .await
        .map_err(|_| FetchError::ResponseReadFailed)?;
    let blob: Blob = blob.dyn_into().map_err(|_| FetchError::InvalidContent)?;
    Url::create_object_url_with_blob(&blob).map_err(|_| FetchError::InvalidContent)
}

pub fn revoke_object_url(url: &str) {
    let _ = Url::revoke_object_url(url);
}

/// `Authorization` header value for a stored token.
fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Issue an authenticated GET using the Fetch API with timeout.
///
/// Attaches the stored bearer token. If the request takes longer than
/// `FETCH_TIMEOUT_MS`, returns `FetchError::Timeout`. Non-2xx responses
/// become `FetchError::HttpError` with the server's detail text.
async fn send_request(url: &str) -> Result<Response, FetchError> {
    let window = dom::window().ok_or(FetchError::NoWindow)?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::SameOrigin);

    if let Some(token) = dom::auth_token() {
        let headers = Headers::new().map_err(|_| FetchError::RequestCreationFailed)?;
        headers
            .set("Authorization", &bearer(&token))
            .map_err(|_| FetchError::RequestCreationFailed)?;
        opts.set_headers(&headers);
    }

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|_| FetchError::RequestCreationFailed)?;

    let fetch_promise = window.fetch_with_request(&request);

    match race_with_timeout(fetch_promise, FETCH_TIMEOUT_MS).await {
        RaceResult::TimedOut => Err(FetchError::Timeout),
        RaceResult::Error(msg) => Err(FetchError::NetworkError(msg)),
        RaceResult::Completed(result) => {
            let resp: Response = result.dyn_into().map_err(|_| FetchError::InvalidContent)?;
            if !resp.ok() {
                let text = read_text(&resp).await.unwrap_or_default();
                return Err(FetchError::HttpError(resp.status(), error_detail(&text)));
            }
            Ok(resp)
        }
    }
}

async fn read_text(resp: &Response) -> Result<String, FetchError> {
    let text = JsFuture::from(resp.text().map_err(|_| FetchError::ResponseReadFailed)?)
        .await
        .map_err(|_| FetchError::ResponseReadFailed)?;
    text.as_string().ok_or(FetchError::InvalidContent)
}

/// Pull the `detail` field out of an API error body, if there is one.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail")?.as_str().map(str::to_string))
        .unwrap_or_default()
}

// =============================================================================
// Remote Client
// =============================================================================

/// Browse API client used by the explorer engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpRemoteClient;

impl RemoteClient for HttpRemoteClient {
    async fn list_directory(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<ListingPayload, ExplorerError> {
        let url = browse_url(connection, "list", path);
        Ok(fetch_json(&url).await?)
    }

    async fn file_info(
        &self,
        connection: &ConnectionId,
        path: &RemotePath,
    ) -> Result<EntryPayload, ExplorerError> {
        let url = browse_url(connection, "info", path);
        Ok(fetch_json(&url).await?)
    }
}
