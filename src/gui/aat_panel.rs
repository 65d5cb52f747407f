use crate::device::aat::{AatConfig, AzimuthCenter, LiveTarget, VbatConfig};
use eframe::egui;

pub enum AatAction {
    Save { aat: AatConfig, vbat: VbatConfig },
    Live(LiveTarget),
}

#[derive(Default)]
pub struct AatPanel {
    aat: AatConfig,
    vbat: VbatConfig,
    live: LiveTarget,
    live_enabled: bool,
}

impl AatPanel {
    pub fn load(&mut self, aat: Option<&AatConfig>, vbat: Option<&VbatConfig>) {
        self.aat = aat.cloned().unwrap_or_default();
        self.vbat = vbat.cloned().unwrap_or_default();
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<AatAction> {
        let mut action = None;
        let aat = &mut self.aat;
        egui::Grid::new("aat_grid").num_columns(2).show(ui, |ui| {
            ui.label("Min satellites");
            ui.label(aat.satmin.to_string());
            ui.end_row();
            ui.label("Servo smoothing");
            ui.add(egui::Slider::new(&mut aat.servosmoo, 0..=9));
            ui.end_row();
            ui.label("Servo mode");
            ui.add(egui::DragValue::new(&mut aat.servomode).clamp_range(0..=3));
            ui.end_row();
            ui.label("Azimuth center");
            let mut center = aat.azimuth_center();
            egui::ComboBox::from_id_source("azim_center")
                .selected_text(center.label())
                .show_ui(ui, |ui| {
                    for c in AzimuthCenter::ALL {
                        ui.selectable_value(&mut center, c, c.label());
                    }
                });
            aat.azim_center = center.index() as u8;
            ui.end_row();
            ui.label("Azimuth range (us)");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut aat.azim_min).clamp_range(500..=2500));
                ui.add(egui::DragValue::new(&mut aat.azim_max).clamp_range(500..=2500));
            });
            ui.end_row();
            ui.label("Elevation range (us)");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut aat.elev_min).clamp_range(500..=2500));
                ui.add(egui::DragValue::new(&mut aat.elev_max).clamp_range(500..=2500));
            });
            ui.end_row();
            ui.label("VBat offset / scale");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut self.vbat.offset));
                ui.add(egui::DragValue::new(&mut self.vbat.scale));
            });
            ui.end_row();
            if let Some(v) = self.vbat.vbat {
                ui.label("Battery");
                ui.label(format!("{v:.2} V"));
                ui.end_row();
            }
        });
        if ui.button("Save").clicked() {
            action = Some(AatAction::Save {
                aat: self.aat.clone(),
                vbat: self.vbat.clone(),
            });
        }

        ui.separator();
        ui.checkbox(&mut self.live_enabled, "Manual target");
        ui.add_enabled_ui(self.live_enabled, |ui| {
            let labels = self.aat.azimuth_center().bearing_labels();
            ui.horizontal(|ui| {
                for c in labels {
                    ui.monospace(c.to_string());
                    ui.add_space(40.0);
                }
            });
            let bear = ui.add(egui::Slider::new(&mut self.live.bear, -180..=180).text("Bearing"));
            let elev = ui.add(egui::Slider::new(&mut self.live.elev, 0..=90).text("Elevation"));
            if bear.changed() || elev.changed() {
                action = Some(AatAction::Live(self.live));
            }
        });
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_satellites_is_display_only() {
        let mut panel = AatPanel::default();
        let aat = AatConfig {
            satmin: 7,
            ..AatConfig::default()
        };
        panel.load(Some(&aat), None);
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                assert!(panel.ui(ui).is_none());
            });
        });
        assert_eq!(panel.aat.satmin, 7);
    }
}
