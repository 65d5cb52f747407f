use anyhow::anyhow;
use backpack_ui::alert::{DialogKind, DialogOutcome, DomHost, WRAPPER_CLASS};
use backpack_ui::device::firmware::{ForceAction, UploadResponse, UploadStatus};
use backpack_ui::flows;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn poll<T>(flow: &mut LocalBoxFuture<'_, T>) -> Option<T> {
    flow.now_or_never()
}

/// Title, message and header kind of the open dialog.
fn open_dialog(host: &DomHost) -> Option<(String, String, String)> {
    let doc = host.document().borrow();
    let wrapper = doc.query_class(WRAPPER_CLASS)?;
    let text = |class: &str| {
        doc.query_class_within(wrapper, class)
            .and_then(|n| doc.element(n))
            .and_then(|e| e.content())
            .unwrap_or_default()
            .to_string()
    };
    let header = doc.query_class_within(wrapper, "alert-header")?;
    let kind = doc
        .element(header)?
        .classes()
        .find(|c| c.ends_with("-bg"))?
        .trim_end_matches("-bg")
        .to_string();
    Some((text("alert-title"), text("alert-message"), kind))
}

fn click(host: &DomHost, class: &str) {
    let node = host
        .document()
        .borrow()
        .query_class(class)
        .unwrap_or_else(|| panic!("no .{class}"));
    host.document().borrow_mut().click(node);
}

fn response(status: UploadStatus, msg: &str) -> UploadResponse {
    UploadResponse {
        status,
        msg: msg.into(),
    }
}

#[test]
fn report_action_shows_server_text() {
    let host = DomHost::detached();
    let mut flow = flows::report_action(
        &host,
        "Set Home Network",
        "An error occurred setting the home network",
        Ok("Home network saved".into()),
    )
    .boxed_local();
    assert!(poll(&mut flow).is_none());
    assert_eq!(
        open_dialog(&host),
        Some(("Set Home Network".into(), "Home network saved".into(), "info".into()))
    );
    click(&host, "alert-button");
    assert_eq!(poll(&mut flow), Some(DialogOutcome::Dismissed));
    assert!(open_dialog(&host).is_none());
}

#[test]
fn report_action_uses_static_failure_text() {
    let host = DomHost::detached();
    let mut flow = flows::report_action(
        &host,
        "Forget Home Network",
        "An error occurred forgetting the home network",
        Err(anyhow!("/forget returned 500")),
    )
    .boxed_local();
    assert!(poll(&mut flow).is_none());
    let (title, message, kind) = open_dialog(&host).unwrap();
    assert_eq!(title, "Forget Home Network");
    assert_eq!(message, "An error occurred forgetting the home network");
    assert_eq!(kind, "error");
}

#[test]
fn report_with_picks_success_kind() {
    let host = DomHost::detached();
    let mut flow = flows::report_with(
        &host,
        DialogKind::Success,
        "MAVLink Settings",
        "failed",
        Ok("Reset".into()),
    )
    .boxed_local();
    assert!(poll(&mut flow).is_none());
    assert_eq!(open_dialog(&host).unwrap().2, "success");
}

#[test]
fn successful_upload_waits_for_flash() {
    let host = DomHost::detached();
    let flashed = Rc::new(Cell::new(false));
    let gate = flashed.clone();
    let flashing = future::poll_fn(move |_| {
        if gate.get() {
            std::task::Poll::Ready(())
        } else {
            std::task::Poll::Pending
        }
    });
    let mut flow = flows::finish_upload(
        &host,
        Ok(response(UploadStatus::Ok, "Update complete.")),
        flashing,
        |_| future::ready(Err(anyhow!("force update not expected"))),
    )
    .boxed_local();

    assert!(poll(&mut flow).is_none());
    assert!(open_dialog(&host).is_none());
    flashed.set(true);
    assert!(poll(&mut flow).is_none());
    let (title, message, kind) = open_dialog(&host).unwrap();
    assert_eq!(title, "Update Succeeded");
    assert_eq!(message, "Update complete.");
    assert_eq!(kind, "success");
    click(&host, "alert-button");
    assert_eq!(poll(&mut flow), Some(DialogOutcome::Dismissed));
}

#[test]
fn device_error_skips_flash() {
    let host = DomHost::detached();
    let mut flow = flows::finish_upload(
        &host,
        Ok(response(UploadStatus::Error, "Not enough space")),
        future::pending::<()>(),
        |_| future::ready(Err(anyhow!("force update not expected"))),
    )
    .boxed_local();
    assert!(poll(&mut flow).is_none());
    assert_eq!(
        open_dialog(&host),
        Some(("Update Failed".into(), "Not enough space".into(), "error".into()))
    );
}

#[test]
fn transport_error_reports_error_text() {
    let host = DomHost::detached();
    let mut flow = flows::finish_upload(
        &host,
        Err(anyhow!("connection reset")),
        future::pending::<()>(),
        |_| future::ready(Err(anyhow!("force update not expected"))),
    )
    .boxed_local();
    assert!(poll(&mut flow).is_none());
    let (title, message, _) = open_dialog(&host).unwrap();
    assert_eq!(title, "Update Failed");
    assert!(message.contains("connection reset"));
}

#[test]
fn mismatch_confirm_forces_update() {
    let host = DomHost::detached();
    let sent = Rc::new(RefCell::new(Vec::new()));
    let record = sent.clone();
    let mut flow = flows::finish_upload(
        &host,
        Ok(response(UploadStatus::Mismatch, "Current target: X")),
        future::pending::<()>(),
        move |action| {
            record.borrow_mut().push(action);
            future::ready(Ok(response(UploadStatus::Ok, "Forcing update")))
        },
    )
    .boxed_local();

    assert!(poll(&mut flow).is_none());
    assert_eq!(open_dialog(&host).unwrap().0, "Targets Mismatch");
    let confirm = host.document().borrow().query_class("confirm-button").unwrap();
    assert!(host.document().borrow().to_html(confirm).contains("Flash anyway"));
    click(&host, "confirm-button");

    assert!(poll(&mut flow).is_none());
    assert_eq!(*sent.borrow(), vec![ForceAction::Confirm]);
    assert_eq!(
        open_dialog(&host),
        Some(("Force Update".into(), "Forcing update".into(), "info".into()))
    );
    click(&host, "alert-button");
    assert_eq!(poll(&mut flow), Some(DialogOutcome::Confirmed));
}

#[test]
fn mismatch_cancel_still_notifies_device() {
    let host = DomHost::detached();
    let sent = Rc::new(RefCell::new(Vec::new()));
    let record = sent.clone();
    let mut flow = flows::finish_upload(
        &host,
        Ok(response(UploadStatus::Mismatch, "Current target: X")),
        future::pending::<()>(),
        move |action| {
            record.borrow_mut().push(action);
            future::ready(Err(anyhow!("/forceupdate returned 500")))
        },
    )
    .boxed_local();

    assert!(poll(&mut flow).is_none());
    click(&host, "cancel-button");
    assert!(poll(&mut flow).is_none());
    assert_eq!(*sent.borrow(), vec![ForceAction::Cancel]);
    assert_eq!(
        open_dialog(&host),
        Some((
            "Force Update".into(),
            "An error occurred trying to force the update".into(),
            "error".into()
        ))
    );
    click(&host, "alert-close");
    assert_eq!(poll(&mut flow), Some(DialogOutcome::Dismissed));
}

#[test]
fn config_mismatch_asks_before_forcing() {
    let host = DomHost::detached();
    let sent = Rc::new(RefCell::new(Vec::new()));
    let record = sent.clone();
    let mut flow = flows::confirm_config_mismatch(&host, "Wrong firmware flavor", move |action| {
        record.borrow_mut().push(action);
        future::ready(Ok(response(UploadStatus::Ok, "Rebooting")))
    })
    .boxed_local();

    assert!(poll(&mut flow).is_none());
    let (title, message, kind) = open_dialog(&host).unwrap();
    assert_eq!(title, "Firmware Mismatch");
    assert_eq!(message, "Wrong firmware flavor");
    assert_eq!(kind, "question");
    assert!(sent.borrow().is_empty());
    click(&host, "confirm-button");
    assert!(poll(&mut flow).is_none());
    assert_eq!(*sent.borrow(), vec![ForceAction::Confirm]);
    click(&host, "alert-button");
    assert_eq!(poll(&mut flow), Some(DialogOutcome::Confirmed));
}

#[test]
fn blocking_runs_on_worker() {
    let caller = std::thread::current().id();
    let worker = futures::executor::block_on(flows::blocking(|| Ok(std::thread::current().id())))
        .unwrap();
    assert_ne!(caller, worker);

    let err = futures::executor::block_on(flows::blocking(|| -> anyhow::Result<()> {
        Err(anyhow!("device unreachable"))
    }))
    .unwrap_err();
    assert_eq!(err.to_string(), "device unreachable");
}
