use crate::device::firmware::{flashed_status, uploaded_status, FlashProgress, UploadTarget};
use eframe::egui;
use rfd::FileDialog;
use std::path::PathBuf;

pub struct UploadRequest {
    pub target: UploadTarget,
    pub path: PathBuf,
}

#[derive(Default)]
pub struct FirmwarePanel {
    target: UploadTarget,
    path: String,
    uploaded: Option<u8>,
    flashing: Option<FlashProgress>,
    pub busy: bool,
}

impl FirmwarePanel {
    pub fn upload_progress(&mut self, percent: u8) {
        self.uploaded = Some(percent);
    }

    pub fn flashing(&mut self, progress: FlashProgress) {
        self.flashing = Some(progress);
    }

    /// Drop the progress display. The form stays locked until
    /// [`FirmwarePanel::finished`].
    pub fn settled(&mut self) {
        self.uploaded = None;
        self.flashing = None;
    }

    pub fn finished(&mut self) {
        self.busy = false;
        self.settled();
    }

    pub fn status(&self) -> Option<String> {
        match (self.flashing, self.uploaded) {
            (Some(flash), _) => Some(flashed_status(flash.percent())),
            (None, Some(pct)) => Some(uploaded_status(pct)),
            _ => None,
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, tx_available: bool) -> Option<UploadRequest> {
        if !tx_available {
            self.target = UploadTarget::Backpack;
        }
        let mut request = None;
        ui.add_enabled_ui(!self.busy, |ui| {
            ui.horizontal(|ui| {
                ui.radio_value(&mut self.target, UploadTarget::Backpack, UploadTarget::Backpack.label());
                if tx_available {
                    ui.radio_value(
                        &mut self.target,
                        UploadTarget::Transmitter,
                        UploadTarget::Transmitter.label(),
                    );
                }
            });
            ui.horizontal(|ui| {
                ui.label("Firmware file");
                ui.text_edit_singleline(&mut self.path);
                if ui.button("Browse").clicked() {
                    if let Some(file) = FileDialog::new().add_filter("firmware", &["bin", "gz"]).pick_file() {
                        self.path = file.display().to_string();
                    }
                }
            });
            let ready = !self.path.trim().is_empty();
            if ui.add_enabled(ready, egui::Button::new("Update")).clicked() {
                self.busy = true;
                self.uploaded = Some(0);
                request = Some(UploadRequest {
                    target: self.target,
                    path: PathBuf::from(self.path.trim()),
                });
            }
        });
        if let Some(status) = self.status() {
            let fraction = match self.flashing {
                Some(flash) => flash.percent(),
                None => self.uploaded.unwrap_or(0),
            } as f32
                / 100.0;
            ui.add(egui::ProgressBar::new(fraction).text(status));
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_clears_progress_but_stays_busy() {
        let mut panel = FirmwarePanel {
            busy: true,
            ..FirmwarePanel::default()
        };
        panel.upload_progress(100);
        panel.flashing(FlashProgress::start(UploadTarget::Backpack));
        assert!(panel.status().is_some());

        panel.settled();
        assert_eq!(panel.status(), None);
        assert!(panel.busy);

        panel.finished();
        assert!(!panel.busy);
    }
}
