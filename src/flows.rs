//! Request chains that end in a dialog.
//!
//! Device calls are blocking; [`blocking`] moves them to a worker thread so
//! a flow can await them and then await the user's answer on the same
//! [`DialogHost`].

use crate::alert::{DialogHost, DialogKind, DialogOutcome, DialogRequest};
use crate::device::firmware::{
    ForceAction, UploadResponse, UploadStatus, FORCE_UPDATE, FORCE_UPDATE_FAILED, UPDATE_FAILED,
};
use anyhow::{anyhow, Result};
use futures::channel::oneshot;
use std::future::Future;

/// Run `f` on a new thread and resolve with its result.
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    match rx.await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("background request did not complete")),
    }
}

/// Report a form submission: the server text in an info dialog, or the
/// static `failure` text in an error dialog.
pub async fn report_action<H: DialogHost + ?Sized>(
    host: &H,
    title: &str,
    failure: &str,
    result: Result<String>,
) -> DialogOutcome {
    report_with(host, DialogKind::Info, title, failure, result).await
}

/// Like [`report_action`] with a chosen kind for the success dialog.
pub async fn report_with<H: DialogHost + ?Sized>(
    host: &H,
    kind: DialogKind,
    title: &str,
    failure: &str,
    result: Result<String>,
) -> DialogOutcome {
    let request = match result {
        Ok(text) => DialogRequest::new(kind, title, text),
        Err(err) => {
            tracing::warn!(title, error = %err, "device request failed");
            DialogRequest::error(title, failure)
        }
    };
    host.show(request).await
}

/// Report the result of a firmware upload.
///
/// A successful upload awaits `flashing` before the success dialog. A target
/// mismatch asks the user, then posts the answer through `force` and reports
/// that result as well. Returns the outcome of the first dialog.
pub async fn finish_upload<H, W, F, Fut>(
    host: &H,
    result: Result<UploadResponse>,
    flashing: W,
    force: F,
) -> DialogOutcome
where
    H: DialogHost + ?Sized,
    W: Future<Output = ()>,
    F: FnOnce(ForceAction) -> Fut,
    Fut: Future<Output = Result<UploadResponse>>,
{
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "firmware upload failed");
            return host
                .show(DialogRequest::error(UPDATE_FAILED, err.to_string()))
                .await;
        }
    };
    match response.status {
        UploadStatus::Ok => {
            flashing.await;
            host.show(response.dialog()).await
        }
        UploadStatus::Error => host.show(response.dialog()).await,
        UploadStatus::Mismatch => {
            let answer = host.show(response.dialog()).await;
            force_update(host, answer, force).await;
            answer
        }
    }
}

/// Ask whether to force an update after the config loader reported a
/// firmware flavor mismatch.
pub async fn confirm_config_mismatch<H, F, Fut>(host: &H, message: &str, force: F) -> DialogOutcome
where
    H: DialogHost + ?Sized,
    F: FnOnce(ForceAction) -> Fut,
    Fut: Future<Output = Result<UploadResponse>>,
{
    let request = DialogRequest::question("Firmware Mismatch", message)
        .with_confirm_label("Force update")
        .with_cancel_label("Cancel");
    let answer = host.show(request).await;
    force_update(host, answer, force).await;
    answer
}

/// Post the answer to a mismatch question and report the device's reply.
/// A dismissal is posted too so the device can abort the pending update.
async fn force_update<H, F, Fut>(host: &H, answer: DialogOutcome, force: F) -> DialogOutcome
where
    H: DialogHost + ?Sized,
    F: FnOnce(ForceAction) -> Fut,
    Fut: Future<Output = Result<UploadResponse>>,
{
    let request = match force(ForceAction::from(answer)).await {
        Ok(reply) => DialogRequest::info(FORCE_UPDATE, reply.msg),
        Err(err) => {
            tracing::warn!(error = %err, "force update failed");
            DialogRequest::error(FORCE_UPDATE, FORCE_UPDATE_FAILED)
        }
    };
    host.show(request).await
}
