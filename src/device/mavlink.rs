use super::{DeviceClient, FormFields};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

pub const DEFAULT_LISTEN_PORT: u16 = 14555;
pub const DEFAULT_SEND_PORT: u16 = 14550;
pub const MAVLINK_TITLE: &str = "MAVLink Settings";
pub const MAVLINK_FAILURE: &str = "An error occurred resetting the MAVLink settings";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MavlinkCounters {
    /// Packets from the aircraft.
    pub packets_downlink: u32,
    /// Packets to the aircraft.
    pub packets_uplink: u32,
    pub drops_downlink: u32,
    pub overflows_downlink: u32,
}

impl MavlinkCounters {
    /// Share of downlink packets that were dropped, in percent.
    pub fn downlink_loss(&self) -> f32 {
        let seen = self.packets_downlink as f32 + self.drops_downlink as f32;
        if seen == 0.0 {
            return 0.0;
        }
        self.drops_downlink as f32 / seen * 100.0
    }
}

/// Body of `GET /mavlink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavlinkStatus {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_send_port")]
    pub send_port: u16,
    /// Address of the ground station the device is talking to, once seen.
    #[serde(default)]
    pub gcs_ip: Option<String>,
    #[serde(default)]
    pub counters: MavlinkCounters,
}

fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

fn default_send_port() -> u16 {
    DEFAULT_SEND_PORT
}

impl Default for MavlinkStatus {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            send_port: DEFAULT_SEND_PORT,
            gcs_ip: None,
            counters: MavlinkCounters::default(),
        }
    }
}

impl MavlinkStatus {
    pub fn uses_default_ports(&self) -> bool {
        self.listen_port == DEFAULT_LISTEN_PORT && self.send_port == DEFAULT_SEND_PORT
    }
}

pub fn reset_form() -> FormFields {
    vec![
        ("listen_port", DEFAULT_LISTEN_PORT.to_string()),
        ("send_port", DEFAULT_SEND_PORT.to_string()),
    ]
}

impl DeviceClient {
    pub fn fetch_mavlink(&self) -> Result<MavlinkStatus> {
        self.get_json("/mavlink")
    }

    /// Restore the default listen/send ports.
    pub fn reset_mavlink(&self) -> Result<String> {
        tracing::info!("resetting mavlink ports");
        self.post_form("/setmavlink", &reset_form())
    }
}

/// Polls `/mavlink` on a worker thread until stopped or dropped.
pub struct MavlinkPoller {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MavlinkPoller {
    pub fn spawn(
        client: DeviceClient,
        interval: Duration,
        mut on_status: impl FnMut(Result<MavlinkStatus>) + Send + 'static,
    ) -> Self {
        let (stop_tx, stop_rx) = channel::<()>();
        let handle = std::thread::spawn(move || loop {
            on_status(client.fetch_mavlink());
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        });
        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Wake the worker and let it exit. A request already in flight still
    /// completes, so one more status may arrive.
    pub fn stop(&mut self) {
        self.stop.take();
        self.handle.take();
    }

    /// Like [`MavlinkPoller::stop`] but waits for the worker to exit.
    pub fn join(mut self) {
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for MavlinkPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
