use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Уникальный идентификатор загруженной модели (uuid v4)
pub type ModelId = String;

/// Идентификатор части модели (индекс узла в арене модели)
pub type PartId = usize;

/// Локальная трансформация части (TRS, как в glTF)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartTransform {
    pub translation: [f32; 3],
    /// Кватернион [x, y, z, w]
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl PartTransform {
    pub fn new() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    /// Трансформация только со смещением
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::new()
        }
    }
}

impl Default for PartTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Пресет модели: подпись в выпадающем списке и путь к ассету
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPreset {
    pub label: String,
    pub path: String,
}

impl ModelPreset {
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Фиксированный набор моделей, доступных для загрузки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub presets: Vec<ModelPreset>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            presets: (1..=5)
                .map(|i| {
                    ModelPreset::new(
                        format!("Skeleton Bowman {i}"),
                        format!("/SkeletonBowman{i}.glb"),
                    )
                })
                .collect(),
        }
    }
}

impl ModelCatalog {
    /// Найти пресет по подписи
    pub fn resolve(&self, label: &str) -> Option<&ModelPreset> {
        self.presets.iter().find(|p| p.label == label)
    }

    /// Подписи в порядке отображения
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.label.as_str())
    }

    /// Первый пресет (загружается при старте)
    pub fn first(&self) -> Option<&ModelPreset> {
        self.presets.first()
    }
}

/// Откуда берутся файлы моделей
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "root", rename_all = "snake_case")]
pub enum AssetSource {
    /// Локальный каталог
    Directory(PathBuf),
    /// Базовый URL статического сервера
    Http(String),
}

impl Default for AssetSource {
    fn default() -> Self {
        AssetSource::Directory(PathBuf::from("assets"))
    }
}

/// Полное расположение конкретного ассета
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    File(PathBuf),
    Url(String),
}

impl std::fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetLocation::File(path) => write!(f, "{}", path.display()),
            AssetLocation::Url(url) => write!(f, "{url}"),
        }
    }
}

impl AssetSource {
    /// Разобрать аргумент командной строки: URL или путь к каталогу
    pub fn parse(root: &str) -> Self {
        if root.starts_with("http://") || root.starts_with("https://") {
            AssetSource::Http(root.trim_end_matches('/').to_string())
        } else {
            AssetSource::Directory(PathBuf::from(root))
        }
    }

    /// Путь ассета из каталога ("/SkeletonBowman1.glb") относительно корня
    pub fn locate(&self, asset_path: &str) -> AssetLocation {
        let relative = asset_path.trim_start_matches('/');
        match self {
            AssetSource::Directory(dir) => AssetLocation::File(join_relative(dir, relative)),
            AssetSource::Http(base) => {
                AssetLocation::Url(format!("{}/{}", base.trim_end_matches('/'), relative))
            }
        }
    }
}

fn join_relative(dir: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(dir.to_path_buf(), |acc, segment| acc.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(val: &T) {
        let json = serde_json::to_string(val).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(*val, back);
    }

    // --- PartTransform ---

    #[test]
    fn test_transform_identity() {
        let t = PartTransform::new();
        assert_eq!(t.translation, [0.0, 0.0, 0.0]);
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.scale, [1.0, 1.0, 1.0]);
        roundtrip(&t);
    }

    #[test]
    fn test_transform_from_translation() {
        let t = PartTransform::from_translation([1.0, 2.0, 3.0]);
        assert_eq!(t.translation, [1.0, 2.0, 3.0]);
        assert_eq!(t.scale, [1.0, 1.0, 1.0]);
    }

    // --- ModelCatalog ---

    #[test]
    fn test_default_catalog_has_five_bowmen() {
        let c = ModelCatalog::default();
        assert_eq!(c.presets.len(), 5);
        assert_eq!(c.first().unwrap().label, "Skeleton Bowman 1");
        assert_eq!(
            c.resolve("Skeleton Bowman 3").unwrap().path,
            "/SkeletonBowman3.glb"
        );
    }

    #[test]
    fn test_catalog_unknown_label() {
        let c = ModelCatalog::default();
        assert!(c.resolve("Skeleton Bowman 9").is_none());
        assert!(c.resolve("").is_none());
    }

    #[test]
    fn test_catalog_labels_preserve_order() {
        let c = ModelCatalog {
            presets: vec![ModelPreset::new("b", "/b.glb"), ModelPreset::new("a", "/a.glb")],
        };
        let labels: Vec<&str> = c.labels().collect();
        assert_eq!(labels, vec!["b", "a"]);
        roundtrip(&c);
    }

    // --- AssetSource ---

    #[test]
    fn test_asset_source_parse_http() {
        let s = AssetSource::parse("https://example.com/models/");
        assert_eq!(s, AssetSource::Http("https://example.com/models".to_string()));
        assert_eq!(
            s.locate("/SkeletonBowman1.glb"),
            AssetLocation::Url("https://example.com/models/SkeletonBowman1.glb".to_string())
        );
    }

    #[test]
    fn test_asset_source_parse_directory() {
        let s = AssetSource::parse("assets");
        assert_eq!(
            s.locate("/SkeletonBowman2.glb"),
            AssetLocation::File(PathBuf::from("assets").join("SkeletonBowman2.glb"))
        );
    }

    #[test]
    fn test_asset_source_nested_path() {
        let s = AssetSource::Directory(PathBuf::from("root"));
        assert_eq!(
            s.locate("/models/a.glb"),
            AssetLocation::File(PathBuf::from("root").join("models").join("a.glb"))
        );
    }

    #[test]
    fn test_asset_source_serde() {
        roundtrip(&AssetSource::Http("http://localhost:8000".to_string()));
        roundtrip(&AssetSource::Directory(PathBuf::from("assets")));
        let json = serde_json::to_string(&AssetSource::Http("http://x".to_string())).unwrap();
        assert!(json.contains(r#""type":"http""#));
    }
}
