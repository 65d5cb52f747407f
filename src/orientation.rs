//! Board orientation viewer over the device WebSocket (`/ws`).
//!
//! The session owns everything the viewer knows: the socket and the latest
//! orientation and Euler snapshot received.

use crate::alert::DialogRequest;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

const READ_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub heading: f64,
    #[serde(rename = "hasIMU", default, skip_serializing_if = "Option::is_none")]
    pub has_imu: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One JSON frame from the device. Any combination of fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViewerMessage {
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub heading: Option<Euler>,
    #[serde(default)]
    pub done: Option<serde_json::Value>,
}

impl ViewerMessage {
    /// `done` counts when truthy, matching how the device sets it.
    pub fn calibration_done(&self) -> bool {
        match &self.done {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// Latest viewer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrientationState {
    pub orientation: Option<Orientation>,
    pub euler: Option<Euler>,
    pub has_imu: bool,
    pub messages: u64,
}

impl OrientationState {
    /// Fold `msg` into the state. Returns the dialog to show when the
    /// message reports a finished calibration.
    pub fn apply(&mut self, msg: ViewerMessage) -> Option<DialogRequest> {
        self.messages += 1;
        if let Some(orientation) = msg.orientation {
            if let Some(has_imu) = orientation.has_imu {
                self.has_imu = has_imu;
            }
            self.orientation = Some(orientation);
        }
        if let Some(euler) = msg.heading {
            self.euler = Some(euler);
        }
        msg.calibration_done()
            .then(|| DialogRequest::info("Calibration", "Calibration complete"))
    }

    pub fn apply_text(&mut self, text: &str) -> Result<Option<DialogRequest>> {
        let msg: ViewerMessage =
            serde_json::from_str(text).context("malformed orientation message")?;
        Ok(self.apply(msg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrientationCommand {
    SetCenter,
    Calibrate,
    ResetOrientation,
    Save,
    /// Manually set the board orientation.
    SetOrientation(Euler),
}

impl fmt::Display for OrientationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetCenter => f.write_str("sc"),
            Self::Calibrate => f.write_str("ci"),
            Self::ResetOrientation => f.write_str("ro"),
            Self::Save => f.write_str("sv"),
            Self::SetOrientation(e) => write!(f, "o:{}:{}:{}", e.x, e.y, e.z),
        }
    }
}

pub struct OrientationSession {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    state: OrientationState,
}

impl OrientationSession {
    pub fn connect(url: &Url) -> Result<Self> {
        let (socket, _) =
            tungstenite::connect(url.as_str()).with_context(|| format!("cannot open {url}"))?;
        tracing::info!(%url, "orientation viewer connected");
        Ok(Self {
            socket,
            state: OrientationState::default(),
        })
    }

    pub fn state(&self) -> &OrientationState {
        &self.state
    }

    /// Bound how long [`OrientationSession::poll`] blocks waiting for data.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let MaybeTlsStream::Plain(stream) = self.socket.get_mut() {
            stream.set_read_timeout(timeout)?;
        }
        Ok(())
    }

    pub fn send(&mut self, command: OrientationCommand) -> Result<()> {
        tracing::debug!(%command, "orientation command");
        self.socket
            .send(Message::Text(command.to_string()))
            .context("cannot send orientation command")
    }

    /// Read and apply the next text frame. `Ok(None)` covers frames that
    /// carry no dialog; a closed socket is an error.
    pub fn poll(&mut self) -> Result<Option<DialogRequest>> {
        match self.socket.read() {
            Ok(Message::Text(text)) => self.state.apply_text(&text),
            Ok(Message::Close(_)) => bail!("orientation socket closed"),
            Ok(_) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn close(mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

/// Viewer output delivered to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Connected,
    State(OrientationState),
    Dialog(DialogRequest),
    Closed(String),
}

/// Session running on a worker thread, fed commands through a channel.
pub struct ViewerHandle {
    commands: Sender<OrientationCommand>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ViewerHandle {
    pub fn spawn(url: Url, mut on_event: impl FnMut(ViewerEvent) + Send + 'static) -> Self {
        let (tx, rx) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = std::thread::spawn(move || {
            let reason = match run_viewer(&url, &rx, &flag, &mut on_event) {
                Ok(()) => "viewer stopped".to_string(),
                Err(err) => {
                    tracing::warn!(error = %err, "orientation viewer ended");
                    err.to_string()
                }
            };
            on_event(ViewerEvent::Closed(reason));
        });
        Self {
            commands: tx,
            stop,
            handle: Some(handle),
        }
    }

    /// Queue a command. Returns `false` once the worker has exited.
    pub fn send(&self, command: OrientationCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Ask the worker to close the socket. Does not wait for it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.take();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_viewer(
    url: &Url,
    commands: &Receiver<OrientationCommand>,
    stop: &AtomicBool,
    on_event: &mut impl FnMut(ViewerEvent),
) -> Result<()> {
    let mut session = OrientationSession::connect(url)?;
    session.set_read_timeout(Some(READ_POLL))?;
    on_event(ViewerEvent::Connected);
    while !stop.load(Ordering::Relaxed) {
        loop {
            match commands.try_recv() {
                Ok(command) => session.send(command)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    session.close();
                    return Ok(());
                }
            }
        }
        match session.poll() {
            Ok(dialog) => {
                on_event(ViewerEvent::State(session.state().clone()));
                if let Some(dialog) = dialog {
                    on_event(ViewerEvent::Dialog(dialog));
                }
            }
            Err(err) if is_timeout(&err) => {}
            Err(err) => return Err(err),
        }
    }
    session.close();
    Ok(())
}

fn is_timeout(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<tungstenite::Error>(),
        Some(tungstenite::Error::Io(e))
            if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
    )
}
