//! Main application module

mod keyboard;
mod menus;
mod styles;

use eframe::egui;

use crate::controller::CommandEffect;
use crate::i18n::{set_lang, Lang};
use crate::input::InputEvent;
use crate::state::{AppSettings, AppState, StartupOverrides};
use crate::ui::{settings_panel, status_bar};
use crate::viewport::ViewportPanel;

/// Main application
pub struct ViewerApp {
    state: AppState,
    viewport: ViewportPanel,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
}

impl ViewerApp {
    /// `overrides` apply to this session only; `settings` is what gets saved.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        overrides: StartupOverrides,
    ) -> Self {
        set_lang(Lang::from_code(&settings.ui.language));

        let mut state = AppState::with_overrides(settings, &overrides);

        // Apply initial styles with font size from settings
        styles::configure_styles(&cc.egui_ctx, state.settings.ui.font_size);

        let mut viewport = ViewportPanel::new(&state);

        // Initialize GL renderer if glow context is available
        if let Some(gl) = cc.gl.as_ref() {
            viewport.init_gl(gl);
        }

        if let Some(label) = state.startup_label(&overrides) {
            if let Err(e) = state.controller.load_model(&label) {
                tracing::error!("Failed to load startup model '{label}': {e}");
            }
        }

        let last_font_size = state.settings.ui.font_size;

        Self {
            state,
            viewport,
            last_font_size,
        }
    }

    /// Run panel and menu events through the controller
    fn dispatch(&mut self, events: &[InputEvent]) {
        let picker = self.viewport.picker();
        for event in events {
            if let Some(CommandEffect::Exported(bytes)) =
                self.state.controller.handle_event(event, &picker)
            {
                settings_panel::save_stl_dialog(&mut self.state, &bytes);
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply font size if changed
        if self.state.settings.ui.font_size != self.last_font_size {
            styles::apply_font_size(ctx, self.state.settings.ui.font_size);
            self.last_font_size = self.state.settings.ui.font_size;
        }

        self.state.controller.poll_load();
        if self.state.controller.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        keyboard::handle_keyboard(ctx, &mut self.state, &self.viewport);

        let mut events: Vec<InputEvent> = Vec::new();

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                events.extend(menus::file_menu(ui, &self.state));
                menus::edit_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state, &mut self.viewport);
            });
        });

        // ── Status bar ───────────────────────────────────────
        if self.state.panels.status_bar {
            egui::TopBottomPanel::bottom("status_bar")
                .exact_height(22.0)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style())
                        .inner_margin(egui::Margin::symmetric(8, 2)),
                )
                .show(ctx, |ui| {
                    status_bar::show(ui, &self.state);
                });
        }

        // ── Right panel: Controls ────────────────────────────
        if self.state.panels.controls {
            egui::SidePanel::right("controls")
                .default_width(240.0)
                .width_range(180.0..=400.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        events.extend(settings_panel::show(ui, &mut self.state));
                    });
                });
        }

        self.dispatch(&events);

        self.viewport.set_pan_enabled(self.state.settings.camera.enable_pan);

        // ── Central panel: 3D viewport ───────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });
    }

    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.state.settings.save();
    }
}
