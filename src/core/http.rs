// ─── HTTP ───
// Shared reqwest client and status handling for every remote call.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Response};

use crate::core::error::{LauncherError, LauncherResult};

/// Sent with every request; the API keys launch tracking on it.
pub const APP_USER_AGENT: &str = "SolarTweaks";

/// Bodies are hashed exactly as served, so no transfer encoding is negotiated.
pub fn build_http_client() -> LauncherResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(headers)
        .build()?)
}

/// Maps a non-2xx response to [`LauncherError::DownloadFailed`].
pub fn ensure_success(response: Response, url: &str) -> LauncherResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}
