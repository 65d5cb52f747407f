use crate::log_stream::LogView;
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Start,
    Stop,
}

pub struct LogPanel {
    pub view: LogView,
    pub streaming: bool,
    timestamps: bool,
}

impl LogPanel {
    pub fn new(limit: usize) -> Self {
        Self {
            view: LogView::new(limit),
            streaming: false,
            timestamps: true,
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<LogAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            if self.streaming {
                if ui.button("Stop").clicked() {
                    action = Some(LogAction::Stop);
                }
            } else if ui.button("Start").clicked() {
                action = Some(LogAction::Start);
            }
            if ui.button("Clear").clicked() {
                self.view.clear();
            }
            if ui.button("Copy").clicked() {
                ui.output_mut(|o| o.copied_text = self.view.text());
            }
            ui.checkbox(&mut self.timestamps, "Timestamps");
            ui.label(format!("{} lines", self.view.len()));
        });
        ui.separator();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in self.view.lines() {
                    if self.timestamps {
                        ui.monospace(format!(
                            "{} {}",
                            line.received.format("%H:%M:%S%.3f"),
                            line.text
                        ));
                    } else {
                        ui.monospace(&line.text);
                    }
                }
            });
        action
    }
}
