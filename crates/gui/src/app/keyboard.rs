//! Keyboard shortcut handling

use eframe::egui;

use crate::input::{InputEvent, Key};
use crate::state::AppState;
use crate::viewport::ViewportPanel;

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState, viewport: &ViewportPanel) {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    let events: Vec<InputEvent> = ctx.input(|i| {
        let mut events = Vec::new();
        if i.key_pressed(egui::Key::Delete) {
            events.push(InputEvent::KeyDown {
                key: Key::Delete,
                command: i.modifiers.command,
            });
        }
        // Ctrl+Z: undo delete
        if i.key_pressed(egui::Key::Z) {
            events.push(InputEvent::KeyDown {
                key: Key::Z,
                command: i.modifiers.command,
            });
        }
        events
    });

    let picker = viewport.picker();
    for event in &events {
        state.controller.handle_event(event, &picker);
    }

    // Escape: deselect
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        let selected = state.controller.selected();
        state.controller.deselect(selected);
    }
}
