// Library crate: exposes testable modules for integration tests and scripted sessions.
// GUI-specific modules (app, ui, GL rendering) remain in the binary crate.

pub mod command;
pub mod controller;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod harness;
pub mod i18n;
pub mod input;
pub mod loader;
pub mod state;
pub mod validation;

/// Viewport math shared with the binary: meshes, camera, picking.
/// GL rendering stays in the binary crate.
pub mod viewport {
    pub mod camera;
    pub mod lighting;
    pub mod mesh;
    pub mod picking;
}
