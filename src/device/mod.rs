//! Blocking HTTP client for the device-resident web server.
//!
//! Endpoint wrappers live next to the models they return: `config`,
//! `network`, `firmware`, `aat` and `mavlink` each add methods to
//! [`DeviceClient`].

pub mod aat;
pub mod config;
pub mod firmware;
pub mod mavlink;
pub mod network;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "backpack-ui";

/// Form body as sent by the device forms.
pub type FormFields = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    base: Url,
}

impl std::fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceClient")
            .field("base", &self.base.as_str())
            .finish()
    }
}

impl DeviceClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base).with_context(|| format!("invalid device url '{base}'"))?;
        if base.cannot_be_a_base() {
            bail!("device url '{base}' cannot be used as a base");
        }
        // Endpoints resolve below the base path, so it must name a directory.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Address of `path` relative to the base, keeping any path prefix of
    /// the device url.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("cannot build url for '{path}'"))
    }

    /// WebSocket address of `path`, `ws://` or `wss://` depending on the base.
    pub fn ws_endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| anyhow!("cannot use {scheme} for {url}"))?;
        Ok(url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.get(self.endpoint(path)?))
    }

    pub(crate) fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.post(self.endpoint(path)?))
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = send(self.get(path)?, path)?;
        let body = resp.text()?;
        serde_json::from_str(&body).with_context(|| format!("malformed response from {path}"))
    }

    /// POST `fields` urlencoded (or an empty body) and return the response
    /// text.
    pub(crate) fn post_form(&self, path: &str, fields: &[(&'static str, String)]) -> Result<String> {
        let mut req = self.post(path)?;
        if !fields.is_empty() {
            req = req.form(fields);
        }
        let resp = send(req, path)?;
        Ok(resp.text()?)
    }
}

/// Send `req` and require a `200 OK`.
pub(crate) fn send(req: RequestBuilder, what: &str) -> Result<Response> {
    tracing::debug!(endpoint = what, "device request");
    let resp = req
        .send()
        .with_context(|| format!("request to {what} failed"))?;
    ensure_ok(resp, what)
}

pub(crate) fn ensure_ok(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status != StatusCode::OK {
        bail!("{what} returned {status}");
    }
    Ok(resp)
}
