use crate::alert::{AlertDialog, DialogHost, DialogKind, DialogOutcome, DialogRequest, Dismissal, PendingDialog};
use eframe::egui;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

const FRAME_SIZE: egui::Vec2 = egui::vec2(360.0, 220.0);

fn header_color(kind: DialogKind) -> egui::Color32 {
    match kind {
        DialogKind::Info => egui::Color32::from_rgb(0x21, 0x96, 0xf3),
        DialogKind::Success => egui::Color32::from_rgb(0x4c, 0xaf, 0x50),
        DialogKind::Error => egui::Color32::from_rgb(0xf4, 0x43, 0x36),
        DialogKind::Question => egui::Color32::from_rgb(0xff, 0x98, 0x00),
    }
}

/// Draws alert dialogs on top of the app, one at a time.
///
/// Dialogs opened while another is visible wait in order and are shown once
/// the current one resolves.
#[derive(Default)]
pub struct AlertWindow {
    current: Option<AlertDialog>,
    waiting: VecDeque<AlertDialog>,
}

impl AlertWindow {
    pub fn open(&mut self, request: DialogRequest) -> PendingDialog {
        let (dialog, pending) = AlertDialog::new(request);
        if self.current.is_none() {
            self.current = Some(dialog);
        } else {
            tracing::debug!(queued = self.waiting.len() + 1, "alert dialog queued");
            self.waiting.push_back(dialog);
        }
        pending
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&DialogRequest> {
        self.current.as_ref().map(|d| d.request())
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    /// Close the visible dialog and bring up the next waiting one.
    pub fn dismiss(&mut self, how: Dismissal) -> Option<DialogOutcome> {
        let outcome = self.current.take()?.dismiss(how);
        self.current = self.waiting.pop_front();
        outcome
    }

    pub fn ui(&mut self, ctx: &egui::Context) -> Option<DialogOutcome> {
        let request = self.current.as_ref()?.request().clone();
        let screen = ctx.screen_rect();
        let frame_rect = egui::Rect::from_center_size(screen.center(), FRAME_SIZE);
        let mut action = None;

        egui::Area::new(egui::Id::new("alert_backdrop"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let backdrop = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(160));
                ui.allocate_ui_at_rect(frame_rect, |ui| {
                    egui::Frame::window(ui.style()).show(ui, |ui| {
                        ui.set_width(FRAME_SIZE.x - 16.0);
                        action = dialog_contents(ui, &request);
                    });
                });
                let outside = backdrop
                    .interact_pointer_pos()
                    .map_or(false, |pos| !frame_rect.contains(pos));
                if action.is_none() && backdrop.clicked() && outside {
                    action = Some(Dismissal::Backdrop);
                }
            });

        action.and_then(|how| self.dismiss(how))
    }
}

fn dialog_contents(ui: &mut egui::Ui, request: &DialogRequest) -> Option<Dismissal> {
    let mut action = None;
    egui::Frame::none()
        .fill(header_color(request.kind))
        .inner_margin(egui::Margin::same(6.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::WHITE, request.kind.as_str().to_uppercase());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let glyph = match request.close_style {
                        crate::alert::CloseStyle::Default => "X",
                        crate::alert::CloseStyle::Circle => "(X)",
                    };
                    if ui.small_button(glyph).clicked() {
                        action = Some(Dismissal::CloseGlyph);
                    }
                });
            });
        });
    ui.add_space(6.0);
    ui.vertical_centered(|ui| {
        ui.heading(&request.title);
        ui.label(request.plain_message());
        ui.add_space(8.0);
        if request.kind.is_question() {
            ui.horizontal(|ui| {
                if ui.button(&request.confirm_label).clicked() {
                    action = Some(Dismissal::Confirm);
                }
                if ui.button(&request.cancel_label).clicked() {
                    action = Some(Dismissal::Cancel);
                }
            });
        } else if ui.button(&request.button_label).clicked() {
            action = Some(Dismissal::Button);
        }
    });
    action
}

/// [`DialogHost`] backed by the app's [`AlertWindow`].
#[derive(Clone, Default)]
pub struct DialogLane(Rc<RefCell<AlertWindow>>);

impl DialogLane {
    pub fn ui(&self, ctx: &egui::Context) -> Option<DialogOutcome> {
        self.0.borrow_mut().ui(ctx)
    }

    pub fn is_open(&self) -> bool {
        self.0.borrow().is_open()
    }

    pub fn window(&self) -> std::cell::Ref<'_, AlertWindow> {
        self.0.borrow()
    }

    pub fn dismiss(&self, how: Dismissal) -> Option<DialogOutcome> {
        self.0.borrow_mut().dismiss(how)
    }
}

impl DialogHost for DialogLane {
    fn show(&self, request: DialogRequest) -> PendingDialog {
        self.0.borrow_mut().open(request)
    }
}
