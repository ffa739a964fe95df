//! Leaderboard API client
//!
//! Submissions go to the `/leaderboard` endpoint from a detached future whose
//! outcome is only logged. A copy of every entry is kept in localStorage so
//! the board still shows something when the API is down.

use crate::storage::WebStorage;
use lab_core::{
    LeaderboardBackend, LeaderboardEntry, LeaderboardError, LeaderboardResult, StoreLeaderboard,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Request, RequestInit, Response};

/// Default API base, relative to the page
pub const DEFAULT_API_BASE: &str = "/api";

/// Remote leaderboard with a local mirror
#[derive(Debug, Clone)]
pub struct RemoteLeaderboard {
    base_url: String,
    local: StoreLeaderboard<WebStorage>,
}

impl RemoteLeaderboard {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            local: StoreLeaderboard::new(WebStorage::local()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/leaderboard", self.base_url)
    }

    fn request(&self, method: &str, body: Option<&str>) -> LeaderboardResult<Request> {
        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            init.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(&self.endpoint(), &init).map_err(js_error)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
        Ok(request)
    }

    /// Start a request and return without waiting for it
    fn send_detached(&self, method: &'static str, body: Option<&str>) -> LeaderboardResult<()> {
        let request = self.request(method, body)?;
        spawn_local(async move {
            match send(request).await {
                Ok(resp) => log::info!("[LEADERBOARD] {} ok status:{}", method, resp.status()),
                Err(e) => log::error!("[LEADERBOARD] {} failed err:{}", method, e),
            }
        });
        Ok(())
    }

    /// Server list, fastest first
    pub async fn fetch_list(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let resp = send(self.request("GET", None)?).await?;
        let json = JsFuture::from(resp.json().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        let mut entries: Vec<LeaderboardEntry> = serde_wasm_bindgen::from_value(json)
            .map_err(|e| LeaderboardError::InvalidEntry(e.to_string()))?;
        entries.sort_by_key(|e| e.seconds);
        Ok(entries)
    }

    /// Server list, or the local mirror when the server can't be reached
    pub async fn refresh(&self) -> Vec<LeaderboardEntry> {
        match self.fetch_list().await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("[LEADERBOARD] list failed, using local copy err:{}", e);
                self.local.list().unwrap_or_default()
            }
        }
    }

    /// Clear the server board and wait for its answer. The local mirror is
    /// only wiped once the server has accepted.
    pub async fn clear_remote(&self) -> LeaderboardResult<()> {
        let resp = send(self.request("DELETE", None)?).await?;
        log::info!("[LEADERBOARD] DELETE ok status:{}", resp.status());
        self.local.clear()
    }
}

/// Run `request`; any non-2xx answer is an error
async fn send(request: Request) -> LeaderboardResult<Response> {
    let window = web_sys::window().ok_or_else(|| LeaderboardError::Network("No window".into()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let resp: Response = value.dyn_into().map_err(js_error)?;
    if !resp.ok() {
        return Err(LeaderboardError::Server(resp.status()));
    }
    Ok(resp)
}

impl LeaderboardBackend for RemoteLeaderboard {
    /// Local mirror; use [`RemoteLeaderboard::refresh`] for the server list
    fn list(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        self.local.list()
    }

    fn submit(&self, entry: LeaderboardEntry) -> LeaderboardResult<()> {
        let body = serde_json::to_string(&entry)
            .map_err(|e| LeaderboardError::InvalidEntry(e.to_string()))?;
        let sent = self.send_detached("POST", Some(&body));
        self.local.submit(entry)?;
        sent
    }

    /// Wipes the mirror now and sends the DELETE in the background.
    /// [`RemoteLeaderboard::clear_remote`] waits for the server instead.
    fn clear(&self) -> LeaderboardResult<()> {
        self.local.clear()?;
        self.send_detached("DELETE", None)
    }

    fn backend_name(&self) -> &'static str {
        "Remote"
    }
}

fn js_error(value: JsValue) -> LeaderboardError {
    let message = value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value));
    LeaderboardError::Network(message)
}
