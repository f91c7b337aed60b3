/// Bottom status bar: item counts and outstanding enumeration work.
use crate::state::AppState;
use egui::Ui;

/// Draw the status bar at the bottom of the window.
pub fn status_bar(ui: &mut Ui, state: &AppState) {
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_warning = egui::Color32::from_rgb(0xfa, 0xb3, 0x87);

    ui.horizontal(|ui| {
        if let Some(error) = &state.open_error {
            ui.label(
                egui::RichText::new(format!("⚠ {error}"))
                    .size(12.0)
                    .color(color_warning),
            );
            return;
        }

        if state.is_busy() {
            ui.spinner();
        }
        ui.label(
            egui::RichText::new(state.summary())
                .size(12.0)
                .color(color_normal),
        );

        if let Some(message) = &state.export_message {
            ui.separator();
            ui.label(egui::RichText::new(message).size(12.0).color(color_weak));
        }
    });
}
