use backpack_ui::alert::{DialogHost, DialogOutcome, DialogRequest, Dismissal};
use backpack_ui::gui::{AlertWindow, DialogLane};
use eframe::egui;

#[test]
fn dialogs_wait_their_turn() {
    let mut window = AlertWindow::default();
    let first = window.open(DialogRequest::question("first", "m"));
    let second = window.open(DialogRequest::info("second", "m"));
    assert_eq!(window.current().map(|r| r.title.as_str()), Some("first"));
    assert_eq!(window.waiting(), 1);

    assert_eq!(window.dismiss(Dismissal::Confirm), Some(DialogOutcome::Confirmed));
    assert_eq!(first.outcome(), Some(DialogOutcome::Confirmed));
    assert!(!second.is_resolved());
    assert_eq!(window.current().map(|r| r.title.as_str()), Some("second"));

    assert_eq!(window.dismiss(Dismissal::Backdrop), Some(DialogOutcome::Dismissed));
    assert_eq!(second.outcome(), Some(DialogOutcome::Dismissed));
    assert!(!window.is_open());
    assert_eq!(window.dismiss(Dismissal::Button), None);
}

#[test]
fn lane_hosts_dialogs() {
    let lane = DialogLane::default();
    let pending = lane.show(DialogRequest::error("Update Failed", "bad image"));
    assert!(lane.is_open());
    assert_eq!(
        lane.window().current().map(|r| r.message.clone()),
        Some("bad image".to_string())
    );
    assert_eq!(lane.dismiss(Dismissal::CloseGlyph), Some(DialogOutcome::Dismissed));
    assert_eq!(pending.outcome(), Some(DialogOutcome::Dismissed));
    assert!(!lane.is_open());
}

#[test]
fn drawing_without_input_keeps_dialog_open() {
    let lane = DialogLane::default();
    let pending = lane.show(DialogRequest::question("Targets Mismatch", "<b>x</b>"));
    let ctx = egui::Context::default();
    for _ in 0..2 {
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            assert_eq!(lane.ui(ctx), None);
        });
    }
    assert!(lane.is_open());
    assert!(!pending.is_resolved());
}
