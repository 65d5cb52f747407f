use super::{DeviceClient, FormFields};
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

/// Home network management requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeAction {
    SetHome { network: String, password: String },
    Connect,
    AccessPoint,
    Forget,
}

impl HomeAction {
    pub fn path(&self) -> &'static str {
        match self {
            Self::SetHome { .. } => "/sethome",
            Self::Connect => "/connect",
            Self::AccessPoint => "/access",
            Self::Forget => "/forget",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SetHome { .. } => "Set Home Network",
            Self::Connect => "Connect to Home Network",
            Self::AccessPoint => "Access Point",
            Self::Forget => "Forget Home Network",
        }
    }

    /// Shown instead of the server text when the request fails.
    pub fn failure(&self) -> &'static str {
        match self {
            Self::SetHome { .. } => "An error occurred setting the home network",
            Self::Connect => "An error occurred connecting to the Home network",
            Self::AccessPoint => "An error occurred starting the Access Point",
            Self::Forget => "An error occurred forgetting the home network",
        }
    }

    pub fn form(&self) -> FormFields {
        match self {
            Self::SetHome { network, password } => vec![
                ("network", network.clone()),
                ("password", password.clone()),
            ],
            _ => Vec::new(),
        }
    }
}

impl DeviceClient {
    pub fn home_action(&self, action: &HomeAction) -> Result<String> {
        tracing::info!(path = action.path(), "home network action");
        self.post_form(action.path(), &action.form())
    }

    /// SSIDs seen by the device's last scan, without duplicates or blanks.
    /// A scan still in progress answers `204` and yields an empty list.
    pub fn scan_networks(&self) -> Result<Vec<String>> {
        let url = self.endpoint("/networks.json")?;
        let resp = self
            .http()
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .context("request to /networks.json failed")?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let resp = super::ensure_ok(resp, "/networks.json")?;
        let body = resp.text()?;
        let found: Vec<String> =
            serde_json::from_str(&body).context("malformed response from /networks.json")?;
        let mut networks: Vec<String> = Vec::with_capacity(found.len());
        for ssid in found {
            if !ssid.is_empty() && !networks.contains(&ssid) {
                networks.push(ssid);
            }
        }
        tracing::debug!(count = networks.len(), "network scan");
        Ok(networks)
    }
}
