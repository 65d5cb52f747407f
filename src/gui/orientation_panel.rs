use crate::orientation::{Euler, OrientationCommand, OrientationState};
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    Connect,
    Disconnect,
    Command(OrientationCommand),
}

#[derive(Default)]
pub struct OrientationPanel {
    pub state: OrientationState,
    pub connected: bool,
    pub connecting: bool,
    pub last_error: Option<String>,
    manual: Euler,
}

impl OrientationPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<ViewerAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            if self.connected || self.connecting {
                if ui.button("Disconnect").clicked() {
                    action = Some(ViewerAction::Disconnect);
                }
            } else if ui.button("Connect").clicked() {
                action = Some(ViewerAction::Connect);
            }
            if self.connecting {
                ui.spinner();
            }
        });
        if let Some(err) = &self.last_error {
            ui.colored_label(egui::Color32::RED, err);
        }
        if !self.connected {
            return action;
        }

        egui::Grid::new("orientation_grid").num_columns(2).show(ui, |ui| {
            if let Some(o) = self.state.orientation {
                ui.label("Pitch / roll / heading");
                ui.monospace(format!("{:7.2} {:7.2} {:7.2}", o.pitch, o.roll, o.heading));
                ui.end_row();
            }
            if let Some(e) = self.state.euler {
                ui.label("Euler x / y / z");
                ui.monospace(format!("{:7.2} {:7.2} {:7.2}", e.x, e.y, e.z));
                ui.end_row();
            }
            ui.label("IMU");
            ui.label(if self.state.has_imu { "present" } else { "not detected" });
            ui.end_row();
        });

        ui.separator();
        let commands = [
            ("Set center", OrientationCommand::SetCenter),
            ("Calibrate IMU", OrientationCommand::Calibrate),
            ("Reset", OrientationCommand::ResetOrientation),
            ("Save", OrientationCommand::Save),
        ];
        ui.horizontal(|ui| {
            for (label, command) in commands {
                if ui.button(label).clicked() {
                    action = Some(ViewerAction::Command(command));
                }
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::DragValue::new(&mut self.manual.x).prefix("x "));
            ui.add(egui::DragValue::new(&mut self.manual.y).prefix("y "));
            ui.add(egui::DragValue::new(&mut self.manual.z).prefix("z "));
            if ui.button("Set orientation").clicked() {
                action = Some(ViewerAction::Command(OrientationCommand::SetOrientation(self.manual)));
            }
        });
        action
    }
}
