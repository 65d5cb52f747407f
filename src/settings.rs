use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the default device address.
pub const DEVICE_URL_ENV: &str = "BACKPACK_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the device web server.
    #[serde(default = "default_device_url")]
    pub device_url: String,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write logs to this file instead of stdout.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Timeout in seconds for ordinary requests. Uploads and streams are not
    /// bound by it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Interval between MAVLink statistics polls.
    #[serde(default = "default_mavlink_poll")]
    pub mavlink_poll_ms: u64,
    /// Maximum number of lines kept in the device log view.
    #[serde(default = "default_log_line_limit")]
    pub log_line_limit: usize,
    /// Delay before the first network scan after the config loaded.
    #[serde(default = "default_scan_delay")]
    pub scan_delay_ms: u64,
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
}

fn default_device_url() -> String {
    std::env::var(DEVICE_URL_ENV).unwrap_or_else(|_| "http://10.0.0.1".into())
}

fn default_request_timeout() -> u64 {
    10
}

fn default_mavlink_poll() -> u64 {
    1000
}

fn default_log_line_limit() -> usize {
    1000
}

fn default_scan_delay() -> u64 {
    2000
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_url: default_device_url(),
            debug_logging: false,
            log_file: None,
            request_timeout_secs: default_request_timeout(),
            mavlink_poll_ms: default_mavlink_poll(),
            log_line_limit: default_log_line_limit(),
            scan_delay_ms: default_scan_delay(),
            enable_toasts: true,
            toast_duration: default_toast_duration(),
        }
    }
}

/// `settings.json` inside the platform config directory, falling back to the
/// working directory.
pub fn default_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|d| d.join("backpack_ui"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("settings.json")
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn mavlink_poll_interval(&self) -> Duration {
        Duration::from_millis(self.mavlink_poll_ms.max(100))
    }

    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }
}
