pub mod history;
pub mod model;
pub mod outline;
pub mod selection;
pub mod settings;

pub use settings::{AppSettings, StartupOverrides};

use crate::controller::ViewerController;

/// Panel visibility flags
pub struct PanelVisibility {
    pub controls: bool,
    pub status_bar: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            controls: true,
            status_bar: true,
        }
    }
}

/// Combined application state
pub struct AppState {
    pub controller: ViewerController,
    pub panels: PanelVisibility,
    pub settings: AppSettings,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        Self::with_overrides(settings, &StartupOverrides::default())
    }

    /// The controller sees the overrides; `settings` keeps the persisted values.
    pub fn with_overrides(settings: AppSettings, overrides: &StartupOverrides) -> Self {
        Self {
            controller: ViewerController::from_settings(&overrides.apply(&settings)),
            panels: PanelVisibility::default(),
            settings,
        }
    }

    /// Label to load at startup, including the command line override
    pub fn startup_label(&self, overrides: &StartupOverrides) -> Option<String> {
        overrides
            .initial_model
            .clone()
            .or_else(|| self.settings.assets.startup_label())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppSettings::load())
    }
}
