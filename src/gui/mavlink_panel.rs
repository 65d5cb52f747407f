use crate::device::mavlink::MavlinkStatus;
use chrono::{DateTime, Local};
use eframe::egui;

#[derive(Default)]
pub struct MavlinkPanel {
    status: Option<MavlinkStatus>,
    updated: Option<DateTime<Local>>,
    error: Option<String>,
}

impl MavlinkPanel {
    pub fn update(&mut self, status: anyhow::Result<MavlinkStatus>) {
        match status {
            Ok(status) => {
                self.status = Some(status);
                self.updated = Some(Local::now());
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    /// Returns `true` when the reset button was pressed.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> bool {
        let Some(status) = &self.status else {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for MAVLink status...");
            });
            if let Some(err) = &self.error {
                ui.colored_label(egui::Color32::RED, err);
            }
            return false;
        };
        egui::Grid::new("mavlink_grid").num_columns(2).striped(true).show(ui, |ui| {
            ui.label("Listen port");
            ui.label(status.listen_port.to_string());
            ui.end_row();
            ui.label("Send port");
            ui.label(status.send_port.to_string());
            ui.end_row();
            ui.label("GCS IP");
            ui.label(status.gcs_ip.as_deref().unwrap_or("-"));
            ui.end_row();
            let c = &status.counters;
            ui.label("Packets down / up");
            ui.label(format!("{} / {}", c.packets_downlink, c.packets_uplink));
            ui.end_row();
            ui.label("Drops / overflows");
            ui.label(format!("{} / {}", c.drops_downlink, c.overflows_downlink));
            ui.end_row();
            ui.label("Downlink loss");
            ui.label(format!("{:.1}%", c.downlink_loss()));
            ui.end_row();
        });
        if let Some(updated) = self.updated {
            ui.weak(format!("Updated {}", updated.format("%H:%M:%S")));
        }
        if let Some(err) = &self.error {
            ui.colored_label(egui::Color32::RED, err);
        }
        ui.add_enabled(!status.uses_default_ports(), egui::Button::new("Reset to defaults"))
            .clicked()
    }
}
