//! Firmware upload to the backpack (or the TX module behind it).

use super::DeviceClient;
use crate::alert::{DialogOutcome, DialogRequest};
use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

pub const UPDATE_SUCCEEDED: &str = "Update Succeeded";
pub const UPDATE_FAILED: &str = "Update Failed";
pub const TARGETS_MISMATCH: &str = "Targets Mismatch";
pub const FORCE_UPDATE: &str = "Force Update";
pub const FORCE_UPDATE_FAILED: &str = "An error occurred trying to force the update";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// The device only reports the outcome once flashing started, so a fixed
/// progress animation covers the flash itself.
pub const FLASH_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UploadTarget {
    #[default]
    Backpack,
    /// TX module flashed through the backpack.
    Transmitter,
}

impl UploadTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backpack => "bp",
            Self::Transmitter => "tx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Backpack => "Backpack",
            Self::Transmitter => "TX module",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Ok,
    Mismatch,
    Error,
}

/// JSON answer of `/update` and `/forceupdate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub status: UploadStatus,
    #[serde(default)]
    pub msg: String,
}

impl UploadResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).context("malformed upload response")
    }

    /// Dialog reporting this response after an upload.
    pub fn dialog(&self) -> DialogRequest {
        match self.status {
            UploadStatus::Ok => DialogRequest::success(UPDATE_SUCCEEDED, self.msg.clone()),
            UploadStatus::Mismatch => DialogRequest::question(TARGETS_MISMATCH, self.msg.clone())
                .with_confirm_label("Flash anyway")
                .with_cancel_label("Cancel"),
            UploadStatus::Error => DialogRequest::error(UPDATE_FAILED, self.msg.clone()),
        }
    }
}

/// Answer to a mismatch question, posted to `/forceupdate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceAction {
    Confirm,
    Cancel,
}

impl ForceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }
}

impl From<DialogOutcome> for ForceAction {
    fn from(outcome: DialogOutcome) -> Self {
        if outcome.is_confirmed() {
            Self::Confirm
        } else {
            Self::Cancel
        }
    }
}

/// Rounded upload percentage. An unknown total counts as no progress.
pub fn upload_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (loaded as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

pub fn uploaded_status(percent: u8) -> String {
    format!("{percent}% uploaded... please wait")
}

pub fn flashed_status(percent: u8) -> String {
    format!("{percent}% flashed... please wait")
}

/// Simulated flash progress, one percent per [`FLASH_STEP`].
#[derive(Debug, Clone, Copy)]
pub struct FlashProgress {
    pub target: UploadTarget,
    started: Instant,
}

impl FlashProgress {
    pub fn start(target: UploadTarget) -> Self {
        Self {
            target,
            started: Instant::now(),
        }
    }

    pub fn duration() -> Duration {
        FLASH_STEP * 100
    }

    pub fn percent_after(elapsed: Duration) -> u8 {
        let steps = elapsed.as_millis() / FLASH_STEP.as_millis();
        steps.min(100) as u8
    }

    pub fn percent(&self) -> u8 {
        Self::percent_after(self.started.elapsed())
    }

    pub fn is_done(&self) -> bool {
        self.percent() >= 100
    }
}

/// Reader reporting upload progress as the body is streamed out.
struct ProgressReader<R> {
    inner: R,
    loaded: u64,
    total: u64,
    last: Option<u8>,
    on_progress: Box<dyn FnMut(u8) + Send>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.loaded += n as u64;
        let pct = upload_percent(self.loaded, self.total);
        if self.last != Some(pct) {
            self.last = Some(pct);
            (self.on_progress)(pct);
        }
        Ok(n)
    }
}

impl DeviceClient {
    /// Upload the image at `path`. `on_progress` receives the rounded
    /// percentage whenever it changes.
    pub fn upload_firmware(
        &self,
        target: UploadTarget,
        path: &Path,
        on_progress: impl FnMut(u8) + Send + 'static,
    ) -> Result<UploadResponse> {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let total = file.metadata()?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "firmware.bin".into());
        tracing::info!(image = target.as_str(), file = %file_name, bytes = total, "uploading firmware");

        let reader = ProgressReader {
            inner: file,
            loaded: 0,
            total,
            last: None,
            on_progress: Box::new(on_progress),
        };
        let part = Part::reader_with_length(reader, total).file_name(file_name);
        let form = Form::new().text("type", target.as_str()).part("upload", part);

        let resp = self
            .post("/update")?
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .context("firmware upload failed")?;
        let status = resp.status();
        let body = resp.text()?;
        match UploadResponse::parse(&body) {
            Ok(parsed) => {
                tracing::info!(status = ?parsed.status, "firmware upload finished");
                Ok(parsed)
            }
            Err(_) if !status.is_success() => bail!("{status}: {body}"),
            Err(err) => Err(err),
        }
    }

    pub fn force_update(&self, action: ForceAction) -> Result<UploadResponse> {
        tracing::info!(action = action.as_str(), "force update");
        let form = Form::new().text("action", action.as_str());
        let resp = super::send(self.post("/forceupdate")?.multipart(form), "/forceupdate")?;
        UploadResponse::parse(&resp.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_handles_empty_total() {
        assert_eq!(upload_percent(0, 0), 0);
        assert_eq!(upload_percent(1, 3), 33);
        assert_eq!(upload_percent(2, 3), 67);
        assert_eq!(upload_percent(3, 3), 100);
    }

    #[test]
    fn flash_progress_is_one_percent_per_step() {
        assert_eq!(FlashProgress::percent_after(Duration::ZERO), 0);
        assert_eq!(FlashProgress::percent_after(Duration::from_millis(250)), 2);
        assert_eq!(FlashProgress::percent_after(FlashProgress::duration()), 100);
        assert_eq!(FlashProgress::percent_after(Duration::from_secs(60)), 100);
    }
}
