//! Controls panel: model picker, STL export, view options and selection

use egui::Ui;

use crate::i18n::t;
use crate::input::InputEvent;
use crate::state::AppState;

/// Ask for a destination and write exported STL bytes there
pub fn save_stl_dialog(state: &mut AppState, bytes: &[u8]) {
    if let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.export_stl_title"))
        .add_filter("STL", &["stl"])
        .set_file_name(&state.settings.export.file_name)
        .save_file()
    {
        // Failures are reported through the controller status
        let _ = state.controller.save_stl(&path, bytes);
    }
}

/// Draw the panel. Model and export requests are returned as input
/// events for the controller to dispatch.
pub fn show(ui: &mut Ui, state: &mut AppState) -> Option<InputEvent> {
    ui.heading(t("panel.title"));
    ui.separator();

    let mut event = show_model_section(ui, state);
    ui.add_space(6.0);
    event = show_export_section(ui, state).or(event);
    ui.add_space(6.0);
    show_view_section(ui, state);
    ui.add_space(6.0);
    show_selection_section(ui, state);
    event
}

fn show_model_section(ui: &mut Ui, state: &AppState) -> Option<InputEvent> {
    let mut event = None;
    egui::CollapsingHeader::new(t("panel.load_gltf"))
        .default_open(true)
        .show(ui, |ui| {
            let controller = &state.controller;
            let current = controller
                .pending_label()
                .or_else(|| controller.model().map(|m| m.name()))
                .unwrap_or("-")
                .to_string();
            let labels: Vec<String> = controller.catalog().labels().map(str::to_string).collect();

            let mut chosen = None;
            ui.horizontal(|ui| {
                ui.label(t("panel.model"));
                egui::ComboBox::from_id_salt("model_preset")
                    .selected_text(&current)
                    .show_ui(ui, |ui| {
                        for label in &labels {
                            if ui.selectable_label(*label == current, label).clicked() {
                                chosen = Some(label.clone());
                            }
                        }
                    });
            });

            event = chosen
                .filter(|l| *l != current)
                .map(|label| InputEvent::ModelSelected { label });

            if state.controller.is_loading() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak(t("panel.loading"));
                });
            }
        });
    event
}

fn show_export_section(ui: &mut Ui, state: &AppState) -> Option<InputEvent> {
    egui::CollapsingHeader::new(t("panel.export"))
        .default_open(true)
        .show(ui, |ui| {
            let enabled = state.controller.model().is_some();
            ui.add_enabled(enabled, egui::Button::new(t("panel.stl")))
                .clicked()
                .then_some(InputEvent::ExportRequested)
        })
        .body_returned
        .flatten()
}

fn show_view_section(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(t("panel.view"))
        .default_open(false)
        .show(ui, |ui| {
            let viewport = &mut state.settings.viewport;
            ui.horizontal(|ui| {
                ui.color_edit_button_srgb(&mut viewport.outline_color);
                ui.label(t("panel.outline_color"));
            });
            ui.horizontal(|ui| {
                ui.add(
                    egui::DragValue::new(&mut viewport.outline_width)
                        .speed(0.0005)
                        .range(0.0..=0.05),
                );
                ui.label(t("panel.outline_width"));
            });
            ui.horizontal(|ui| {
                ui.color_edit_button_srgb(&mut viewport.background_color);
                ui.label(t("panel.bg_color"));
            });
            ui.checkbox(&mut state.settings.camera.enable_pan, t("panel.enable_pan"));
        });
}

fn show_selection_section(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(t("panel.selection"))
        .default_open(true)
        .show(ui, |ui| {
            let controller = &state.controller;
            let selected = controller
                .selected()
                .and_then(|p| controller.model()?.part_name(p))
                .map(str::to_string);

            match &selected {
                Some(name) => {
                    ui.strong(name);
                }
                None => {
                    ui.weak(t("panel.nothing_selected"));
                }
            }

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(selected.is_some(), egui::Button::new(t("panel.delete")))
                    .clicked()
                {
                    state.controller.delete_selected();
                }
                if ui
                    .add_enabled(state.controller.can_undo(), egui::Button::new(t("panel.undo")))
                    .clicked()
                {
                    state.controller.undo_delete();
                }
            });
        });
}
