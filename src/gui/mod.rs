mod aat_panel;
mod alert_window;
mod firmware_panel;
mod log_panel;
mod mavlink_panel;
mod network_panel;
mod orientation_panel;

pub use aat_panel::{AatAction, AatPanel};
pub use alert_window::{AlertWindow, DialogLane};
pub use firmware_panel::{FirmwarePanel, UploadRequest};
pub use log_panel::{LogAction, LogPanel};
pub use mavlink_panel::MavlinkPanel;
pub use network_panel::NetworkPanel;
pub use orientation_panel::{OrientationPanel, ViewerAction};

use crate::alert::{DialogHost, DialogKind};
use crate::device::aat::{AAT_FAILURE, AAT_TITLE};
use crate::device::config::{ConfigResponse, ConfigView, TargetInfo};
use crate::device::firmware::{FlashProgress, UploadResponse, UploadStatus};
use crate::device::mavlink::{MavlinkPoller, MavlinkStatus, MAVLINK_FAILURE, MAVLINK_TITLE};
use crate::device::network::HomeAction;
use crate::device::DeviceClient;
use crate::flows;
use crate::log_stream::LogStream;
use crate::orientation::{ViewerEvent, ViewerHandle};
use crate::settings::Settings;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

const FLOW_POLL: Duration = Duration::from_millis(100);

/// Results posted back to the UI thread by worker threads.
pub enum AppEvent {
    Config(anyhow::Result<ConfigResponse>),
    Target(anyhow::Result<TargetInfo>),
    Networks(anyhow::Result<Vec<String>>),
    Mavlink(anyhow::Result<MavlinkStatus>),
    LogLine(String),
    Viewer(ViewerEvent),
    UploadProgress(u8),
    Flashing(FlashProgress),
    /// Upload and flash are over; the result dialog follows.
    UploadSettled,
    UploadDone,
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Network,
    Firmware,
    Aat,
    Mavlink,
    Logs,
    Orientation,
}

impl Tab {
    fn label(self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Firmware => "Update",
            Self::Aat => "AAT",
            Self::Mavlink => "MAVLink",
            Self::Logs => "Logs",
            Self::Orientation => "Orientation",
        }
    }
}

pub struct BackpackApp {
    settings: Settings,
    client: DeviceClient,
    lane: DialogLane,
    flows: Vec<LocalBoxFuture<'static, ()>>,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    toasts: Toasts,
    tab: Tab,
    config: Option<ConfigView>,
    target: Option<TargetInfo>,
    scan_at: Option<Instant>,
    network: NetworkPanel,
    firmware: FirmwarePanel,
    aat: AatPanel,
    mavlink: MavlinkPanel,
    poller: Option<MavlinkPoller>,
    logs: LogPanel,
    log_stream: Option<LogStream>,
    orientation: OrientationPanel,
    viewer: Option<ViewerHandle>,
}

fn push_toast(toasts: &mut Toasts, toast: Toast) {
    tracing::debug!(text = toast.text.text(), "toast");
    toasts.add(toast);
}

impl BackpackApp {
    pub fn new(ctx: &egui::Context, settings: Settings, client: DeviceClient) -> Self {
        let (tx, rx) = channel();
        let logs = LogPanel::new(settings.log_line_limit);
        let mut app = Self {
            settings,
            client,
            lane: DialogLane::default(),
            flows: Vec::new(),
            tx,
            rx,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            tab: Tab::Network,
            config: None,
            target: None,
            scan_at: None,
            network: NetworkPanel::default(),
            firmware: FirmwarePanel::default(),
            aat: AatPanel::default(),
            mavlink: MavlinkPanel::default(),
            poller: None,
            logs,
            log_stream: None,
            orientation: OrientationPanel::default(),
            viewer: None,
        };
        app.request(ctx, AppEvent::Config, |c| c.fetch_config());
        app.request(ctx, AppEvent::Target, |c| c.fetch_target());
        app
    }

    /// Run `call` on a worker thread and post its result wrapped by `wrap`.
    fn request<T, F>(&self, ctx: &egui::Context, wrap: fn(anyhow::Result<T>) -> AppEvent, call: F)
    where
        T: Send + 'static,
        F: FnOnce(&DeviceClient) -> anyhow::Result<T> + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(wrap(call(&client)));
            ctx.request_repaint();
        });
    }

    fn spawn_flow(&mut self, flow: impl Future<Output = ()> + 'static) {
        self.flows.push(flow.boxed_local());
    }

    fn poll_flows(&mut self) {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        self.flows
            .retain_mut(|flow| flow.as_mut().poll(&mut cx).is_pending());
    }

    fn toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        if !self.settings.enable_toasts {
            return;
        }
        let text: String = text.into();
        push_toast(
            &mut self.toasts,
            Toast {
                text: text.into(),
                kind,
                options: ToastOptions::default()
                    .duration_in_seconds(self.settings.toast_duration as f64),
            },
        );
    }

    fn force_update(
        client: DeviceClient,
    ) -> impl FnOnce(crate::device::firmware::ForceAction) -> LocalBoxFuture<'static, anyhow::Result<UploadResponse>> {
        move |action| flows::blocking(move || client.force_update(action)).boxed_local()
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: AppEvent) {
        match event {
            AppEvent::Config(Ok(resp)) => {
                let view = ConfigView::from_response(&resp);
                self.aat
                    .load(resp.config.aat.as_ref(), resp.config.vbat.as_ref());
                self.config = Some(view);
                if let Some(message) = resp.mismatch {
                    let lane = self.lane.clone();
                    let force = Self::force_update(self.client.clone());
                    self.spawn_flow(async move {
                        flows::confirm_config_mismatch(&lane, &message, force).await;
                    });
                }
                self.scan_at = Some(Instant::now() + self.settings.scan_delay());
            }
            AppEvent::Config(Err(err)) => {
                tracing::error!(error = %err, "failed to load device config");
                self.toast(ToastKind::Error, format!("Failed to load config: {err}"));
            }
            AppEvent::Target(Ok(target)) => self.target = Some(target),
            AppEvent::Target(Err(err)) => tracing::warn!(error = %err, "failed to read target"),
            AppEvent::Networks(result) => {
                let networks = result.unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "network scan failed");
                    Vec::new()
                });
                tracing::debug!(count = networks.len(), "network scan finished");
                self.network.set_networks(networks);
            }
            AppEvent::Mavlink(status) => self.mavlink.update(status),
            AppEvent::LogLine(line) => self.logs.view.push(line),
            AppEvent::Viewer(event) => self.viewer_event(event),
            AppEvent::UploadProgress(pct) => self.firmware.upload_progress(pct),
            AppEvent::Flashing(progress) => self.firmware.flashing(progress),
            AppEvent::UploadSettled => self.firmware.settled(),
            AppEvent::UploadDone => self.firmware.finished(),
            AppEvent::Notice(text) => self.toast(ToastKind::Error, text),
        }
        ctx.request_repaint();
    }

    fn viewer_event(&mut self, event: ViewerEvent) {
        let panel = &mut self.orientation;
        match event {
            ViewerEvent::Connected => {
                panel.connecting = false;
                panel.connected = true;
                panel.last_error = None;
            }
            ViewerEvent::State(state) => panel.state = state,
            ViewerEvent::Dialog(request) => {
                let lane = self.lane.clone();
                self.spawn_flow(async move {
                    lane.show(request).await;
                });
            }
            ViewerEvent::Closed(reason) => {
                panel.connecting = false;
                panel.connected = false;
                panel.last_error = Some(reason);
                self.viewer = None;
            }
        }
    }

    fn home_action(&mut self, action: HomeAction) {
        let client = self.client.clone();
        let lane = self.lane.clone();
        self.spawn_flow(async move {
            let (title, failure) = (action.title(), action.failure());
            let result = flows::blocking(move || client.home_action(&action)).await;
            flows::report_action(&lane, title, failure, result).await;
        });
    }

    fn upload(&mut self, ctx: &egui::Context, request: UploadRequest) {
        let client = self.client.clone();
        let lane = self.lane.clone();
        let tx = self.tx.clone();
        let progress_tx = self.tx.clone();
        let repaint = ctx.clone();
        let force = Self::force_update(client.clone());
        let UploadRequest { target, path } = request;
        self.spawn_flow(async move {
            let result = flows::blocking(move || {
                client.upload_firmware(target, &path, move |pct| {
                    let _ = progress_tx.send(AppEvent::UploadProgress(pct));
                    repaint.request_repaint();
                })
            })
            .await;
            if !matches!(&result, Ok(UploadResponse { status: UploadStatus::Ok, .. })) {
                let _ = tx.send(AppEvent::UploadSettled);
            }
            let flash_tx = tx.clone();
            let flashing = async move {
                let progress = FlashProgress::start(target);
                let _ = flash_tx.send(AppEvent::Flashing(progress));
                future::poll_fn(|_| {
                    if progress.is_done() {
                        Poll::Ready(())
                    } else {
                        Poll::Pending
                    }
                })
                .await;
                let _ = flash_tx.send(AppEvent::UploadSettled);
            };
            flows::finish_upload(&lane, result, flashing, force).await;
            let _ = tx.send(AppEvent::UploadDone);
        });
    }

    fn aat_action(&mut self, action: AatAction) {
        let client = self.client.clone();
        match action {
            AatAction::Save { aat, vbat } => {
                let lane = self.lane.clone();
                self.spawn_flow(async move {
                    let result = flows::blocking(move || client.update_aat(&aat, &vbat, true)).await;
                    flows::report_action(&lane, AAT_TITLE, AAT_FAILURE, result).await;
                });
            }
            AatAction::Live(target) => {
                let tx = self.tx.clone();
                std::thread::spawn(move || {
                    if let Err(err) = client.set_live_target(&target) {
                        tracing::warn!(error = %err, "live target update failed");
                        let _ = tx.send(AppEvent::Notice(format!("Target update failed: {err}")));
                    }
                });
            }
        }
    }

    fn reset_mavlink(&mut self) {
        let client = self.client.clone();
        let lane = self.lane.clone();
        self.spawn_flow(async move {
            let result = flows::blocking(move || client.reset_mavlink()).await;
            flows::report_with(&lane, DialogKind::Success, MAVLINK_TITLE, MAVLINK_FAILURE, result)
                .await;
        });
    }

    fn log_action(&mut self, ctx: &egui::Context, action: LogAction) {
        match action {
            LogAction::Start => {
                let tx = self.tx.clone();
                let ctx = ctx.clone();
                match LogStream::spawn(&self.client, move |line| {
                    let _ = tx.send(AppEvent::LogLine(line));
                    ctx.request_repaint();
                }) {
                    Ok(stream) => {
                        self.log_stream = Some(stream);
                        self.logs.streaming = true;
                    }
                    Err(err) => self.toast(ToastKind::Error, format!("Cannot open log: {err}")),
                }
            }
            LogAction::Stop => {
                if let Some(mut stream) = self.log_stream.take() {
                    stream.stop();
                }
                self.logs.streaming = false;
            }
        }
    }

    fn viewer_action(&mut self, ctx: &egui::Context, action: ViewerAction) {
        match action {
            ViewerAction::Connect => match self.client.ws_endpoint("/ws") {
                Ok(url) => {
                    let tx = self.tx.clone();
                    let ctx = ctx.clone();
                    self.viewer = Some(ViewerHandle::spawn(url, move |event| {
                        let _ = tx.send(AppEvent::Viewer(event));
                        ctx.request_repaint();
                    }));
                    self.orientation.connecting = true;
                }
                Err(err) => self.orientation.last_error = Some(err.to_string()),
            },
            ViewerAction::Disconnect => {
                if let Some(mut viewer) = self.viewer.take() {
                    viewer.stop();
                }
                self.orientation.connected = false;
                self.orientation.connecting = false;
            }
            ViewerAction::Command(command) => {
                let sent = self.viewer.as_ref().map_or(false, |v| v.send(command));
                if !sent {
                    self.toast(ToastKind::Warning, "Orientation viewer is not connected");
                }
            }
        }
    }

    /// Keep the MAVLink poller running only while its tab is visible.
    fn sync_poller(&mut self, ctx: &egui::Context) {
        match (self.tab == Tab::Mavlink, self.poller.is_some()) {
            (true, false) => {
                let tx = self.tx.clone();
                let ctx = ctx.clone();
                self.poller = Some(MavlinkPoller::spawn(
                    self.client.clone(),
                    self.settings.mavlink_poll_interval(),
                    move |status| {
                        let _ = tx.send(AppEvent::Mavlink(status));
                        ctx.request_repaint();
                    },
                ));
            }
            (false, true) => {
                if let Some(mut poller) = self.poller.take() {
                    poller.stop();
                }
            }
            _ => {}
        }
    }

    fn tabs(&self) -> Vec<Tab> {
        let mut tabs = vec![Tab::Network, Tab::Firmware];
        if self.config.as_ref().map_or(false, |c| c.aat_tab) {
            tabs.push(Tab::Aat);
        }
        tabs.extend([Tab::Mavlink, Tab::Logs, Tab::Orientation]);
        tabs
    }
}

impl eframe::App for BackpackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        use egui::*;

        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(ctx, event);
        }
        if self.scan_at.map_or(false, |at| Instant::now() >= at) {
            self.scan_at = None;
            self.network.scanning = true;
            self.request(ctx, AppEvent::Networks, |c| c.scan_networks());
        }
        self.poll_flows();
        self.sync_poller(ctx);

        TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let name = self
                    .config
                    .as_ref()
                    .and_then(|c| c.product_name.clone())
                    .unwrap_or_else(|| "Backpack".into());
                ui.heading(name);
                if let Some(target) = &self.target {
                    ui.label(format!("{} {}", target.target, target.version));
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.weak(self.client.base().as_str());
                });
            });
            ui.horizontal(|ui| {
                for tab in self.tabs() {
                    ui.selectable_value(&mut self.tab, tab, tab.label());
                }
            });
        });

        CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Network => {
                if let Some(action) = self.network.ui(ui, self.config.as_ref()) {
                    self.home_action(action);
                }
            }
            Tab::Firmware => {
                let tx_tab = self.config.as_ref().map_or(false, |c| c.tx_tab);
                if let Some(request) = self.firmware.ui(ui, tx_tab) {
                    self.upload(ctx, request);
                }
            }
            Tab::Aat => {
                if let Some(action) = self.aat.ui(ui) {
                    self.aat_action(action);
                }
            }
            Tab::Mavlink => {
                if self.mavlink.ui(ui) {
                    self.reset_mavlink();
                }
            }
            Tab::Logs => {
                if let Some(action) = self.logs.ui(ui) {
                    self.log_action(ctx, action);
                }
            }
            Tab::Orientation => {
                if let Some(action) = self.orientation.ui(ui) {
                    self.viewer_action(ctx, action);
                }
            }
        });

        if self.lane.ui(ctx).is_some() {
            self.poll_flows();
        }
        if self.settings.enable_toasts {
            self.toasts.show(ctx);
        }
        if !self.flows.is_empty() || self.lane.is_open() {
            ctx.request_repaint_after(FLOW_POLL);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(mut stream) = self.log_stream.take() {
            stream.stop();
        }
        if let Some(mut viewer) = self.viewer.take() {
            viewer.stop();
        }
    }
}
