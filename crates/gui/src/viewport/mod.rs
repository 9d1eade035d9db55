//! 3D viewport panel with OpenGL rendering

mod gl_renderer;
pub use skelview_gui_lib::viewport::{camera, lighting, mesh, picking};

use std::sync::{Arc, Mutex};

use egui::Ui;
use shared::{ModelId, PartId};

use crate::i18n::t;
use crate::input::{ndc_from_pixels, InputEvent};
use crate::state::AppState;
use camera::OrbitCamera;
use gl_renderer::GlRenderer;
use mesh::MeshData;
use picking::CameraPicker;

type PartMeshes = Arc<Vec<(PartId, MeshData)>>;

/// 3D viewport panel with OpenGL rendering
pub struct ViewportPanel {
    camera: OrbitCamera,
    gl_renderer: Option<Arc<Mutex<GlRenderer>>>,
    /// Width / height of the last drawn frame
    aspect: f32,
    /// Visible meshes of the current model, keyed by model id and version
    meshes: Option<((ModelId, u64), PartMeshes)>,
}

impl ViewportPanel {
    pub fn new(state: &AppState) -> Self {
        Self {
            camera: OrbitCamera::from_settings(&state.settings.camera),
            gl_renderer: None,
            aspect: 1.5,
            meshes: None,
        }
    }

    /// Initialize GL renderer (must be called with a GL context)
    pub fn init_gl(&mut self, gl: &glow::Context) {
        match GlRenderer::new(gl) {
            Ok(renderer) => self.gl_renderer = Some(Arc::new(Mutex::new(renderer))),
            Err(e) => tracing::error!("Failed to initialize GL renderer: {e}"),
        }
    }

    pub fn reset_camera(&mut self, state: &AppState) {
        self.camera = OrbitCamera::from_settings(&state.settings.camera);
    }

    /// Apply camera settings that can change at runtime
    pub fn set_pan_enabled(&mut self, enabled: bool) {
        self.camera.enable_pan = enabled;
    }

    /// Ray picker for the current camera and viewport shape
    pub fn picker(&self) -> CameraPicker<'_> {
        CameraPicker {
            camera: &self.camera,
            aspect: self.aspect,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        if rect.height() > 0.0 {
            self.aspect = rect.width() / rect.height();
        }

        // ── Camera controls ─────────────────────────────
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta();
            self.camera.rotate(-delta.x * 0.5, delta.y * 0.5);
        }

        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            self.camera.pan(delta.x, delta.y);
        }

        // ── Scroll zoom ─────────────────────────────
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.1 {
                self.camera.zoom(scroll * 0.002);
            }
        }

        // ── Part selection via click ──────────────────────────
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                let ndc = ndc_from_pixels(local.x, local.y, rect.width(), rect.height());
                let picker = self.picker();
                state
                    .controller
                    .handle_event(&InputEvent::Click { ndc }, &picker);
            }
        }

        if !ui.is_rect_visible(rect) {
            return;
        }

        self.render_gl(ui, rect, state);
        self.draw_overlays(ui, rect, state);
    }

    /// Visible meshes of the current model, rebuilt when it changes
    fn current_meshes(&mut self, state: &AppState) -> Option<((ModelId, u64), PartMeshes)> {
        let model = state.controller.model()?;
        let key = (model.id().clone(), model.version());

        match &self.meshes {
            Some((cached, meshes)) if *cached == key => Some((key, meshes.clone())),
            _ => {
                let meshes = Arc::new(model.visible_meshes());
                self.meshes = Some((key.clone(), meshes.clone()));
                Some((key, meshes))
            }
        }
    }

    fn render_gl(&mut self, ui: &mut Ui, rect: egui::Rect, state: &AppState) {
        let Some(gl_renderer) = self.gl_renderer.clone() else {
            return;
        };

        let (key, meshes) = match self.current_meshes(state) {
            Some((key, meshes)) => (Some(key), meshes),
            None => (None, Arc::new(Vec::new())),
        };

        let camera = self.camera.clone();
        let grid_settings = state.settings.grid.clone();
        let viewport_settings = state.settings.viewport.clone();
        let outlined = state.controller.outline().parts().to_vec();

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(eframe::egui_glow::CallbackFn::new(move |info, painter| {
                let gl = painter.gl();

                let clip = info.clip_rect_in_pixels();
                let viewport = [
                    clip.left_px as f32,
                    clip.from_bottom_px as f32,
                    clip.width_px as f32,
                    clip.height_px as f32,
                ];

                if let Ok(mut r) = gl_renderer.lock() {
                    r.update_grid(gl, &grid_settings);
                    r.sync_model(gl, key.clone(), &meshes);

                    let render_params = gl_renderer::RenderParams {
                        viewport,
                        grid_visible: grid_settings.visible,
                        bg_color: viewport_settings.background_color,
                        outlined: outlined.clone(),
                        outline_color: viewport_settings.outline_color,
                        outline_width: viewport_settings.outline_width,
                    };
                    r.paint(gl, &camera, &render_params);
                }
            })),
        };

        ui.painter().add(callback);
    }

    fn draw_overlays(&self, ui: &mut Ui, rect: egui::Rect, state: &AppState) {
        let painter = ui.painter_at(rect);

        if self.gl_renderer.is_none() {
            painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "OpenGL unavailable",
                egui::FontId::proportional(14.0),
                egui::Color32::from_rgb(200, 80, 80),
            );
        }

        if let Some(label) = state.controller.pending_label() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                format!("{} {label}", t("panel.loading")),
                egui::FontId::proportional(16.0),
                egui::Color32::from_rgb(200, 200, 210),
            );
        }

        painter.text(
            egui::pos2(rect.center().x, rect.bottom() - 20.0),
            egui::Align2::CENTER_BOTTOM,
            t("status.help"),
            egui::FontId::proportional(11.0),
            egui::Color32::from_rgb(100, 100, 110),
        );
    }
}
