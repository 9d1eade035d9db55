//! Application menu bar

use eframe::egui;

use crate::i18n::{lang, set_lang, t, Lang};
use crate::input::InputEvent;
use crate::state::AppState;
use crate::viewport::ViewportPanel;

/// Show the file menu. Export is returned as an event for the controller.
pub fn file_menu(ui: &mut egui::Ui, state: &AppState) -> Option<InputEvent> {
    let mut event = None;
    ui.menu_button(t("menu.file"), |ui| {
        if ui
            .add_enabled(
                state.controller.model().is_some(),
                egui::Button::new(t("menu.export_stl")),
            )
            .clicked()
        {
            ui.close_menu();
            event = Some(InputEvent::ExportRequested);
        }
        ui.separator();
        if ui.button(t("menu.quit")).clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
    event
}

/// Show the edit menu
pub fn edit_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.edit"), |ui| {
        if ui
            .add_enabled(state.controller.can_undo(), egui::Button::new(t("menu.undo")))
            .clicked()
        {
            state.controller.undo_delete();
            ui.close_menu();
        }
        let has_selection = state.controller.selected().is_some();
        if ui
            .add_enabled(has_selection, egui::Button::new(t("menu.delete")))
            .clicked()
        {
            state.controller.delete_selected();
            ui.close_menu();
        }
        ui.separator();
        if ui
            .add_enabled(has_selection, egui::Button::new(t("menu.deselect")))
            .clicked()
        {
            let selected = state.controller.selected();
            state.controller.deselect(selected);
            ui.close_menu();
        }
    });
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState, viewport: &mut ViewportPanel) {
    ui.menu_button(t("menu.view"), |ui| {
        ui.checkbox(&mut state.panels.controls, t("menu.controls"));
        ui.checkbox(&mut state.settings.grid.visible, t("menu.show_grid"));
        ui.separator();
        if ui.button(t("menu.reset_camera")).clicked() {
            viewport.reset_camera(state);
            ui.close_menu();
        }
        ui.separator();
        ui.menu_button(t("menu.language"), |ui| {
            for (l, name) in [(Lang::Ru, "Русский"), (Lang::En, "English")] {
                if ui.selectable_label(lang() == l, name).clicked() {
                    set_lang(l);
                    state.settings.ui.language = l.code().to_string();
                    ui.close_menu();
                }
            }
        });
    });
}
