use egui::Ui;

use crate::i18n::t;
use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &AppState) {
    let controller = &state.controller;

    ui.horizontal(|ui| {
        match controller.model() {
            Some(model) => {
                ui.weak(model.name());
                ui.separator();
                ui.weak(format!(
                    "{}: {} ({} {})",
                    t("status.parts"),
                    model.part_count(),
                    model.visible_parts().len(),
                    t("status.visible"),
                ));
            }
            None => {
                ui.weak(t("status.no_model"));
            }
        }

        if controller.history_len() > 0 {
            ui.separator();
            ui.weak(format!("{}: {}", t("status.deleted"), controller.history_len()));
        }

        if let Some(name) = controller
            .selected()
            .and_then(|p| controller.model()?.part_name(p))
        {
            ui.separator();
            ui.label(format!("{}: {name}", t("status.selected")));
        }

        if controller.is_loading() {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(255, 200, 100), t("panel.loading"));
        }

        // Right-aligned last status message
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak(controller.status());
        });
    });
}
