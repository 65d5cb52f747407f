use crate::autocomplete::{Autocomplete, NavKey};
use crate::device::config::{ConfigView, WifiMode};
use crate::device::network::HomeAction;
use eframe::egui;

/// Home network form with SSID suggestions from the last scan.
#[derive(Default)]
pub struct NetworkPanel {
    network: String,
    password: String,
    suggestions: Autocomplete,
    pub scanning: bool,
}

impl NetworkPanel {
    pub fn set_networks(&mut self, networks: Vec<String>) {
        self.suggestions.set_candidates(networks);
        self.scanning = false;
    }

    pub fn networks(&self) -> &[String] {
        self.suggestions.candidates()
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, view: Option<&ConfigView>) -> Option<HomeAction> {
        let mut action = None;
        if let Some(view) = view {
            match view.mode {
                WifiMode::Station => {
                    ui.label(format!(
                        "Connected to home network: {}",
                        view.station_ssid.as_deref().unwrap_or("")
                    ));
                }
                WifiMode::AccessPoint => match &view.home_network {
                    Some(ssid) => {
                        ui.label(format!("Access Point mode, home network: {ssid}"));
                    }
                    None => {
                        ui.label("Access Point mode, no home network set");
                    }
                },
            }
            ui.separator();
        }

        egui::Grid::new("home_network_grid").num_columns(2).show(ui, |ui| {
            ui.label("Network");
            ui.vertical(|ui| self.network_field(ui));
            ui.end_row();
            ui.label("Password");
            ui.add(egui::TextEdit::singleline(&mut self.password).password(true));
            ui.end_row();
        });
        if self.scanning {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Scanning for networks...");
            });
        }

        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                action = Some(HomeAction::SetHome {
                    network: self.network.clone(),
                    password: self.password.clone(),
                });
            }
            if let Some(view) = view {
                if view.mode == WifiMode::AccessPoint && view.connect_button {
                    if ui.button("Connect").clicked() {
                        action = Some(HomeAction::Connect);
                    }
                }
                if view.mode == WifiMode::Station && ui.button("Access Point").clicked() {
                    action = Some(HomeAction::AccessPoint);
                }
            }
            if ui.button("Forget").clicked() {
                action = Some(HomeAction::Forget);
            }
        });
        action
    }

    fn network_field(&mut self, ui: &mut egui::Ui) {
        let response = ui.text_edit_singleline(&mut self.network);
        if response.changed() || response.gained_focus() {
            self.suggestions.update(&self.network);
        }
        if response.has_focus() {
            let (down, up) = ui.input(|i| {
                (
                    i.key_pressed(egui::Key::ArrowDown),
                    i.key_pressed(egui::Key::ArrowUp),
                )
            });
            if down {
                self.suggestions.key(NavKey::Down);
            }
            if up {
                self.suggestions.key(NavKey::Up);
            }
        }
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            if let Some(value) = self.suggestions.key(NavKey::Enter) {
                self.network = value;
            }
        }
        if !self.suggestions.is_open() {
            return;
        }

        let mut picked = None;
        let list = egui::Frame::popup(ui.style()).show(ui, |ui| {
            for suggestion in self.suggestions.suggestions() {
                let mut text = egui::text::LayoutJob::default();
                let color = ui.visuals().text_color();
                text.append(
                    suggestion.matched,
                    0.0,
                    egui::TextFormat {
                        color: ui.visuals().strong_text_color(),
                        ..Default::default()
                    },
                );
                text.append(
                    suggestion.rest,
                    0.0,
                    egui::TextFormat {
                        color,
                        ..Default::default()
                    },
                );
                if ui.selectable_label(suggestion.active, text).clicked() {
                    picked = Some(suggestion.index);
                }
            }
        });
        if let Some(pos) = picked {
            if let Some(value) = self.suggestions.select(pos) {
                self.network = value;
            }
        } else if response.clicked_elsewhere()
            && !ui
                .input(|i| i.pointer.interact_pos())
                .map_or(false, |pos| list.response.rect.contains(pos))
        {
            self.suggestions.close();
        }
    }
}
