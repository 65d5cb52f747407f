//! Device log over server-sent events (`/logging`).

use crate::device::DeviceClient;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `message` unless the server named the event.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Line oriented event-stream parser.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line without its terminator. Returns an event when the line
    /// completes one.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.filter(|e| !e.is_empty()).unwrap_or_else(|| "message".into()),
            data,
            id: self.last_id.clone(),
        })
    }
}

/// Read events from `reader` until it ends or `stop` is set, passing the
/// data of every unnamed event to `on_line`.
pub fn read_events<R: BufRead>(
    reader: R,
    stop: &AtomicBool,
    mut on_line: impl FnMut(String),
) -> Result<()> {
    let mut parser = SseParser::new();
    for line in reader.lines() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let line = line.context("log stream read failed")?;
        if let Some(event) = parser.feed_line(&line) {
            if event.event == "message" {
                on_line(event.data);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub received: DateTime<Local>,
    pub text: String,
}

/// Bounded buffer of received log lines, oldest dropped first.
#[derive(Debug, Clone)]
pub struct LogView {
    lines: VecDeque<LogLine>,
    limit: usize,
}

impl LogView {
    pub fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.lines.push_back(LogLine {
            received: Local::now(),
            text: text.into(),
        });
        while self.lines.len() > self.limit {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Log text as displayed: one line per event, newline terminated.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

/// Background reader of the device log stream.
pub struct LogStream {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogStream {
    pub fn spawn(device: &DeviceClient, on_line: impl FnMut(String) + Send + 'static) -> Result<Self> {
        let url = device.endpoint("/logging")?;
        // The stream stays open indefinitely, so no request timeout here.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = std::thread::spawn(move || {
            tracing::info!(%url, "opening log stream");
            let result = client
                .get(url)
                .header(ACCEPT, "text/event-stream")
                .send()
                .context("cannot open log stream")
                .and_then(|resp| {
                    let resp = crate::device::ensure_ok(resp, "/logging")?;
                    read_events(std::io::BufReader::new(resp), &flag, on_line)
                });
            match result {
                Ok(()) => tracing::info!("log stream closed"),
                Err(err) => tracing::warn!(error = %err, "log stream ended"),
            }
        });
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Ask the reader to stop. It exits after the next received line.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.take();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
