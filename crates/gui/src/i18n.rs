use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lang {
    Ru,
    En,
}

impl Lang {
    /// Language from a settings code ("ru", "en"); anything else is English
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "ru" => Lang::Ru,
            _ => Lang::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::En => "en",
        }
    }
}

static CURRENT_LANG: AtomicU8 = AtomicU8::new(1); // 1=En (default)

pub fn lang() -> Lang {
    match CURRENT_LANG.load(Ordering::Relaxed) {
        0 => Lang::Ru,
        _ => Lang::En,
    }
}

pub fn set_lang(l: Lang) {
    CURRENT_LANG.store(
        match l {
            Lang::Ru => 0,
            Lang::En => 1,
        },
        Ordering::Relaxed,
    );
}

/// Translate a key to the current language.
pub fn t(key: &str) -> &'static str {
    translate(lang(), key)
}

/// Translate a key to the given language.
pub fn translate(lang: Lang, key: &str) -> &'static str {
    let ru = lang == Lang::Ru;
    match key {
        // ── Main menus ──────────────────────────────────────
        "menu.file" => if ru { "Файл" } else { "File" },
        "menu.export_stl" => if ru { "Экспорт STL..." } else { "Export STL..." },
        "menu.export_stl_title" => if ru { "Экспорт STL" } else { "Export STL" },
        "menu.quit" => if ru { "Выход" } else { "Quit" },

        "menu.edit" => if ru { "Правка" } else { "Edit" },
        "menu.undo" => if ru { "Вернуть удалённое  Ctrl+Z" } else { "Undo delete  Ctrl+Z" },
        "menu.delete" => if ru { "Удалить  Del" } else { "Delete  Del" },
        "menu.deselect" => if ru { "Снять выделение" } else { "Deselect" },

        "menu.view" => if ru { "Вид" } else { "View" },
        "menu.controls" => if ru { "Панель управления" } else { "Controls panel" },
        "menu.reset_camera" => if ru { "Сбросить камеру" } else { "Reset camera" },
        "menu.show_grid" => if ru { "Сетка" } else { "Grid" },
        "menu.language" => if ru { "Язык" } else { "Language" },

        // ── Controls panel ──────────────────────────────────
        "panel.title" => if ru { "Управление" } else { "Controls" },
        "panel.load_gltf" => if ru { "Загрузка GLTF" } else { "Load GLTF" },
        "panel.model" => if ru { "Модель" } else { "Model" },
        "panel.loading" => if ru { "Загрузка..." } else { "Loading..." },
        "panel.export" => if ru { "Экспорт" } else { "Export" },
        "panel.stl" => "STL",
        "panel.view" => if ru { "Вид" } else { "View" },
        "panel.outline_color" => if ru { "Цвет контура" } else { "Outline color" },
        "panel.outline_width" => if ru { "Толщина контура" } else { "Outline width" },
        "panel.bg_color" => if ru { "Цвет фона" } else { "Background color" },
        "panel.enable_pan" => if ru { "Панорамирование" } else { "Enable pan" },
        "panel.selection" => if ru { "Выделение" } else { "Selection" },
        "panel.nothing_selected" => if ru { "Ничего не выделено" } else { "Nothing selected" },
        "panel.delete" => if ru { "Удалить" } else { "Delete" },
        "panel.undo" => if ru { "Вернуть" } else { "Undo" },

        // ── Status bar ──────────────────────────────────────
        "status.no_model" => if ru { "Модель не загружена" } else { "No model loaded" },
        "status.parts" => if ru { "Частей" } else { "Parts" },
        "status.visible" => if ru { "видимых" } else { "visible" },
        "status.deleted" => if ru { "Удалено" } else { "Deleted" },
        "status.selected" => if ru { "Выделено" } else { "Selected" },
        "status.help" => if ru {
            "ЛКМ: вращение/выбор, ПКМ: сдвиг, колесо: масштаб, Del: удалить, Ctrl+Z: вернуть"
        } else {
            "LMB: orbit/select, RMB: pan, wheel: zoom, Del: delete, Ctrl+Z: undo"
        },

        // ── Fallback ────────────────────────────────────────
        _ => "???",
    }
}
