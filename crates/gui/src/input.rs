//! Platform-agnostic input events.
//!
//! The GUI translates egui input into [`InputEvent`] values, which map to
//! the [`ViewerCommand`]s the controller executes. Tests feed events
//! directly without a rendering surface.

use glam::Vec2;

use crate::command::ViewerCommand;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Z,
    Other,
}

/// One user input event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary click at normalized device coordinates
    Click { ndc: Vec2 },
    /// Key press with the command (Ctrl/Cmd) modifier state
    KeyDown { key: Key, command: bool },
    /// Model dropdown changed to this label
    ModelSelected { label: String },
    /// Export button pressed
    ExportRequested,
}

impl InputEvent {
    /// Command triggered by this event, if any
    pub fn command(&self) -> Option<ViewerCommand> {
        match self {
            InputEvent::Click { ndc } => Some(ViewerCommand::Click { x: ndc.x, y: ndc.y }),
            InputEvent::KeyDown { key: Key::Delete, .. } => Some(ViewerCommand::DeleteSelected),
            InputEvent::KeyDown { key: Key::Z, command: true } => Some(ViewerCommand::UndoDelete),
            InputEvent::KeyDown { .. } => None,
            InputEvent::ModelSelected { label } => Some(ViewerCommand::LoadModel {
                label: label.clone(),
            }),
            InputEvent::ExportRequested => Some(ViewerCommand::ExportStl),
        }
    }
}

/// Convert a pixel position inside a viewport to normalized device
/// coordinates: x in [-1, 1] left to right, y in [-1, 1] bottom to top.
pub fn ndc_from_pixels(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new((x / width) * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners_and_center() {
        assert_eq!(ndc_from_pixels(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(ndc_from_pixels(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
        assert_eq!(ndc_from_pixels(400.0, 300.0, 800.0, 600.0), Vec2::ZERO);
    }

    #[test]
    fn test_ndc_degenerate_viewport() {
        assert_eq!(ndc_from_pixels(10.0, 10.0, 0.0, 600.0), Vec2::ZERO);
    }

    #[test]
    fn test_delete_key_maps_to_delete() {
        let e = InputEvent::KeyDown { key: Key::Delete, command: false };
        assert_eq!(e.command(), Some(ViewerCommand::DeleteSelected));
    }

    #[test]
    fn test_ctrl_z_maps_to_undo_plain_z_ignored() {
        let undo = InputEvent::KeyDown { key: Key::Z, command: true };
        assert_eq!(undo.command(), Some(ViewerCommand::UndoDelete));
        let plain = InputEvent::KeyDown { key: Key::Z, command: false };
        assert_eq!(plain.command(), None);
        let other = InputEvent::KeyDown { key: Key::Other, command: true };
        assert_eq!(other.command(), None);
    }

    #[test]
    fn test_gui_events_map_to_commands() {
        let load = InputEvent::ModelSelected { label: "Skeleton Bowman 2".to_string() };
        assert_eq!(
            load.command(),
            Some(ViewerCommand::LoadModel { label: "Skeleton Bowman 2".to_string() })
        );
        assert_eq!(InputEvent::ExportRequested.command(), Some(ViewerCommand::ExportStl));
        let click = InputEvent::Click { ndc: Vec2::new(0.5, -0.5) };
        assert_eq!(click.command(), Some(ViewerCommand::Click { x: 0.5, y: -0.5 }));
    }
}
