//! Headless test harness for driving the viewer without a window.
//!
//! Bundles a [`ViewerController`] with the default orbit camera, so clicks
//! go through the same ray picking as the GUI.

use std::time::Duration;

use glam::Vec2;
use shared::{ModelCatalog, PartId};

use crate::command::ViewerCommand;
use crate::controller::{CommandEffect, ViewerController};
use crate::error::ExportError;
use crate::fixtures::{self, TempAssets};
use crate::state::settings::{AppSettings, CameraSettings};
use crate::validation::MeshValidator;
use crate::viewport::camera::OrbitCamera;
use crate::viewport::picking::{Aabb, CameraPicker};

/// How long blocking loads wait before giving up
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless test harness: controller, camera and an optional asset directory
pub struct TestHarness {
    pub controller: ViewerController,
    pub camera: OrbitCamera,
    /// Viewport width / height
    pub aspect: f32,
    assets: Option<TempAssets>,
}

impl TestHarness {
    /// Create a harness with no model loaded.
    pub fn new() -> Self {
        Self {
            controller: ViewerController::new(ModelCatalog::default(), Default::default()),
            camera: OrbitCamera::from_settings(&CameraSettings::default()),
            aspect: 1.5,
            assets: None,
        }
    }

    /// Harness using the catalog, asset source and camera from `settings`.
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            controller: ViewerController::from_settings(settings),
            camera: OrbitCamera::from_settings(&settings.camera),
            aspect: 1.5,
            assets: None,
        }
    }

    /// Harness showing the fixture skeleton.
    pub fn with_fixture() -> Self {
        let mut h = Self::new();
        h.controller.install_model(fixtures::skeleton_model());
        h
    }

    /// Harness whose asset root is a temporary directory holding every
    /// default catalog entry. No model is loaded yet.
    pub fn with_assets() -> Self {
        let mut h = Self::new();
        let assets = TempAssets::with_default_catalog();
        h.controller.set_source(assets.source());
        h.assets = Some(assets);
        h
    }

    /// The temporary asset directory, if any
    pub fn assets(&self) -> Option<&TempAssets> {
        self.assets.as_ref()
    }

    // ── Input ─────────────────────────────────────────────────

    /// Click at normalized device coordinates
    pub fn click(&mut self, ndc: Vec2) -> Option<PartId> {
        let picker = CameraPicker {
            camera: &self.camera,
            aspect: self.aspect,
        };
        self.controller.handle_click(ndc, &picker)
    }

    /// Screen position of the center of a visible part
    pub fn ndc_of(&self, name: &str) -> Option<Vec2> {
        let model = self.controller.model()?;
        let part = model.find_part(name)?;
        let (_, mesh) = model
            .visible_meshes()
            .into_iter()
            .find(|(id, _)| *id == part)?;
        self.camera.project(Aabb::from_mesh(&mesh).center(), self.aspect)
    }

    /// Click the center of the named part on screen. Fails when the part
    /// is not visible or another part is in front of it.
    pub fn click_part(&mut self, name: &str) -> Result<(), String> {
        let ndc = self
            .ndc_of(name)
            .ok_or_else(|| format!("No visible part named '{name}'"))?;
        let hit = self.click(ndc);
        let hit_name = hit.and_then(|p| self.part_name(p));
        match hit_name {
            Some(n) if n == name => Ok(()),
            Some(n) => Err(format!("Click on '{name}' hit '{n}'")),
            None => Err(format!("Click on '{name}' hit nothing")),
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        self.controller.delete_selected()
    }

    pub fn undo_delete(&mut self) -> bool {
        self.controller.undo_delete()
    }

    /// Run a command through the controller with the harness camera
    pub fn apply(&mut self, command: &ViewerCommand) -> CommandEffect {
        match command {
            ViewerCommand::ClickPart { name } => match self.click_part(name) {
                Ok(()) => CommandEffect::Applied,
                Err(e) => CommandEffect::Rejected(e),
            },
            other => {
                let picker = CameraPicker {
                    camera: &self.camera,
                    aspect: self.aspect,
                };
                self.controller.apply(other, &picker)
            }
        }
    }

    // ── Loading ───────────────────────────────────────────────

    /// Wait for the pending load and apply it.
    pub fn finish_load(&mut self) -> Result<(), String> {
        if self.controller.wait_for_load(LOAD_TIMEOUT) {
            Ok(())
        } else {
            Err(self.controller.status().to_string())
        }
    }

    /// Load a catalog model and wait for it.
    pub fn load_model_blocking(&mut self, label: &str) -> Result<(), String> {
        self.controller
            .load_model(label)
            .map_err(|e| e.to_string())?;
        self.finish_load()
    }

    pub fn export(&self) -> Result<Vec<u8>, ExportError> {
        self.controller.export_stl()
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn model_name(&self) -> Option<String> {
        self.controller.model().map(|m| m.name().to_string())
    }

    pub fn part_name(&self, part: PartId) -> Option<String> {
        self.controller
            .model()
            .and_then(|m| m.part_name(part))
            .map(str::to_string)
    }

    pub fn selected_name(&self) -> Option<String> {
        self.controller.selected().and_then(|p| self.part_name(p))
    }

    pub fn part(&self, name: &str) -> Option<PartId> {
        self.controller.model()?.find_part(name)
    }

    /// All parts, attached or not
    pub fn part_count(&self) -> usize {
        self.controller.model().map_or(0, |m| m.part_count())
    }

    pub fn visible_part_count(&self) -> usize {
        self.controller
            .model()
            .map_or(0, |m| m.visible_parts().len())
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.controller
            .model()
            .and_then(|m| m.find_part(name).map(|p| m.is_visible(p)))
            .unwrap_or(false)
    }

    pub fn position_of(&self, name: &str) -> Option<[f32; 3]> {
        let model = self.controller.model()?;
        model.position(model.find_part(name)?)
    }

    /// Validation errors of every visible mesh
    pub fn validate_visible(&self) -> Vec<String> {
        self.controller
            .model()
            .map(|m| {
                m.visible_meshes()
                    .iter()
                    .flat_map(|(_, mesh)| MeshValidator::new(mesh).validate_all())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Summary of the model, selection and history as JSON
    pub fn inspect(&self) -> serde_json::Value {
        let Some(model) = self.controller.model() else {
            return serde_json::json!({ "model": null, "parts": [] });
        };
        let parts: Vec<serde_json::Value> = (0..model.part_count())
            .filter_map(|id| model.part(id).map(|p| (id, p)))
            .map(|(id, p)| {
                serde_json::json!({
                    "id": id,
                    "name": p.name,
                    "parent": p.parent,
                    "visible": model.is_visible(id),
                    "position": p.transform.translation,
                })
            })
            .collect();

        serde_json::json!({
            "model": model.name(),
            "selected": self.selected_name(),
            "outlined": self.controller.outline().parts(),
            "history_len": self.controller.history_len(),
            "parts": parts,
        })
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_harness_empty() {
        let h = TestHarness::new();
        assert_eq!(h.part_count(), 0);
        assert!(h.model_name().is_none());
        assert!(h.selected_name().is_none());
    }

    #[test]
    fn test_every_fixture_part_clickable() {
        for name in [
            "Hips", "Spine", "Head", "LeftArm", "Bow", "RightArm", "LeftLeg", "RightLeg",
        ] {
            let mut h = TestHarness::with_fixture();
            h.click_part(name).unwrap();
            assert_eq!(h.selected_name().as_deref(), Some(name));
        }
    }

    #[test]
    fn test_click_empty_space_misses() {
        let mut h = TestHarness::with_fixture();
        assert_eq!(h.click(Vec2::new(0.95, 0.95)), None);
    }

    #[test]
    fn test_click_part_of_deleted_subtree_fails() {
        let mut h = TestHarness::with_fixture();
        h.click_part("LeftArm").unwrap();
        h.delete_selected();
        assert!(h.click_part("Bow").is_err());
        assert!(!h.is_visible("Bow"));
    }

    #[test]
    fn test_inspect_lists_parts() {
        let mut h = TestHarness::with_fixture();
        h.click_part("Head").unwrap();
        let info = h.inspect();
        assert_eq!(info["selected"], "Head");
        assert_eq!(info["parts"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_validate_visible() {
        let h = TestHarness::with_fixture();
        assert!(h.validate_visible().is_empty());
    }

    #[test]
    fn test_load_model_blocking() {
        let mut h = TestHarness::with_assets();
        h.load_model_blocking("Skeleton Bowman 2").unwrap();
        assert_eq!(h.model_name().as_deref(), Some("Skeleton Bowman 2"));
        assert_eq!(h.part_count(), 8);
    }
}
