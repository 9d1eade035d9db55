//! Application settings

use serde::{Deserialize, Serialize};
use shared::{AssetSource, ModelCatalog};

/// Grid display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSettings {
    /// Show grid
    pub visible: bool,
    /// Grid cell size in model units
    pub size: f32,
    /// Number of grid lines in each direction from origin
    pub range: i32,
    /// Grid line opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            size: 0.01,
            range: 10,
            opacity: 0.6,
        }
    }
}

/// Viewport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Background color RGB
    pub background_color: [u8; 3],
    /// Outline color RGB for the selected part
    pub outline_color: [u8; 3],
    /// Outline thickness in normalized screen units
    pub outline_width: f32,
    /// Base color for meshes without a material
    pub mesh_color: [f32; 3],
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            background_color: [0, 0, 0],
            outline_color: [255, 255, 255],
            outline_width: 0.004,
            mesh_color: [0.8, 0.8, 0.78],
        }
    }
}

/// Orbit camera settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial eye position
    pub position: [f32; 3],
    /// Orbit target
    pub target: [f32; 3],
    /// Maximum zoom-out distance from the target
    pub max_distance: f32,
    /// Minimum zoom-in distance from the target
    pub min_distance: f32,
    /// Allow right-drag panning
    pub enable_pan: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.01,
            far: 100.0,
            position: [-0.03, 0.02, 0.06],
            target: [0.0, 0.02, 0.0],
            max_distance: 0.1,
            min_distance: 0.005,
            enable_pan: true,
        }
    }
}

/// Where models come from and which one is shown first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetSettings {
    pub source: AssetSource,
    pub catalog: ModelCatalog,
    /// Label loaded at startup (first catalog entry if missing)
    pub initial_model: Option<String>,
}

impl AssetSettings {
    /// Label to load at startup
    pub fn startup_label(&self) -> Option<String> {
        self.initial_model
            .clone()
            .or_else(|| self.catalog.first().map(|p| p.label.clone()))
    }
}

/// Command line overrides for one session; never written back to disk
#[derive(Debug, Clone, Default)]
pub struct StartupOverrides {
    pub source: Option<AssetSource>,
    pub initial_model: Option<String>,
}

impl StartupOverrides {
    /// Copy of `settings` with the overrides applied
    pub fn apply(&self, settings: &AppSettings) -> AppSettings {
        let mut effective = settings.clone();
        if let Some(source) = &self.source {
            effective.assets.source = source.clone();
        }
        if let Some(label) = &self.initial_model {
            effective.assets.initial_model = Some(label.clone());
        }
        effective
    }
}

/// STL export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Fixed file name offered for the download
    pub file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "SkeletonBowman.stl".to_string(),
        }
    }
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Font size in points
    pub font_size: f32,
    /// Interface language code ("en" or "ru")
    pub language: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            language: "en".to_string(),
        }
    }
}

/// All application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

impl AppSettings {
    fn config_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("com", "skelview", "skelview")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings JSON; missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("Failed to create config dir {}: {e}", dir.display());
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Failed to save settings: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_viewer_setup() {
        let s = AppSettings::default();
        assert_eq!(s.export.file_name, "SkeletonBowman.stl");
        assert_eq!(s.camera.max_distance, 0.1);
        assert!(s.camera.enable_pan);
        assert_eq!(s.assets.catalog.presets.len(), 5);
        assert_eq!(s.assets.startup_label().as_deref(), Some("Skeleton Bowman 1"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = AppSettings::from_json(r#"{"export": {"file_name": "out.stl"}}"#).unwrap();
        assert_eq!(s.export.file_name, "out.stl");
        assert_eq!(s.ui.font_size, 14.0);
        assert_eq!(s.camera.fov_degrees, 50.0);
    }

    #[test]
    fn test_initial_model_override() {
        let mut s = AppSettings::default();
        s.assets.initial_model = Some("Skeleton Bowman 4".to_string());
        assert_eq!(s.assets.startup_label().as_deref(), Some("Skeleton Bowman 4"));
    }

    #[test]
    fn test_startup_overrides_leave_settings_untouched() {
        let s = AppSettings::default();
        let overrides = StartupOverrides {
            source: Some(AssetSource::parse("http://cdn.example/models")),
            initial_model: Some("Skeleton Bowman 3".to_string()),
        };
        let effective = overrides.apply(&s);
        assert_eq!(effective.assets.source, AssetSource::parse("http://cdn.example/models"));
        assert_eq!(effective.assets.startup_label().as_deref(), Some("Skeleton Bowman 3"));
        assert_eq!(s.assets.source, AssetSource::default());
        assert!(s.assets.initial_model.is_none());
    }

    #[test]
    fn test_settings_json_roundtrip() {
        let s = AppSettings::default();
        let json = serde_json::to_string(&s).unwrap();
        let back = AppSettings::from_json(&json).unwrap();
        assert_eq!(back.assets.catalog, s.assets.catalog);
        assert_eq!(back.viewport.outline_color, s.viewport.outline_color);
    }
}
