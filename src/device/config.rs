use super::aat::{AatConfig, VbatConfig};
use super::DeviceClient;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiMode {
    #[serde(rename = "STA")]
    Station,
    #[default]
    #[serde(rename = "AP")]
    AccessPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub mode: WifiMode,
    /// Home network the device is (or would be) connected to.
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    /// Present only on antenna tracker builds.
    #[serde(default)]
    pub aat: Option<AatConfig>,
    #[serde(default)]
    pub vbat: Option<VbatConfig>,
}

/// Body of `GET /config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config: DeviceConfig,
    /// `"yes"` when a TX module can be flashed through the backpack.
    #[serde(default)]
    pub stm32: Option<String>,
    /// Set when the running firmware flavor does not match the device; the
    /// text explains the mismatch and a forced update has to be confirmed.
    #[serde(default)]
    pub mismatch: Option<String>,
}

/// Body of `GET /target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub target: String,
    #[serde(default)]
    pub version: String,
}

/// Which parts of the UI a loaded config enables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigView {
    pub mode: WifiMode,
    pub station_panel: bool,
    pub ap_panel: bool,
    pub rtc_tab: bool,
    /// Network the device is connected to in station mode.
    pub station_ssid: Option<String>,
    /// Remembered home network shown in access point mode.
    pub home_network: Option<String>,
    pub connect_button: bool,
    pub tx_tab: bool,
    pub aat_tab: bool,
    pub product_name: Option<String>,
}

impl ConfigView {
    pub fn from_response(resp: &ConfigResponse) -> Self {
        let config = &resp.config;
        let ssid = config.ssid.clone().filter(|s| !s.is_empty());
        let mut view = Self {
            mode: config.mode,
            tx_tab: matches!(resp.stm32.as_deref(), Some(s) if !s.is_empty() && s != "no"),
            aat_tab: config.aat.is_some(),
            product_name: config.product_name.clone().filter(|s| !s.is_empty()),
            ..Default::default()
        };
        match config.mode {
            WifiMode::Station => {
                view.station_panel = true;
                view.rtc_tab = true;
                view.station_ssid = ssid;
            }
            WifiMode::AccessPoint => {
                view.ap_panel = true;
                view.connect_button = ssid.is_some();
                view.home_network = ssid;
            }
        }
        view
    }
}

impl DeviceClient {
    pub fn fetch_config(&self) -> Result<ConfigResponse> {
        let config: ConfigResponse = self.get_json("/config")?;
        tracing::info!(mode = ?config.config.mode, "loaded device config");
        Ok(config)
    }

    pub fn fetch_target(&self) -> Result<TargetInfo> {
        self.get_json("/target")
    }
}
