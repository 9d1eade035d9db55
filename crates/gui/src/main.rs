mod app;
mod ui;
mod viewport;

// Re-export library modules so that `crate::state`, `crate::controller`, etc.
// resolve to the lib crate types everywhere in the binary.
pub use skelview_gui_lib::command;
pub use skelview_gui_lib::controller;
pub use skelview_gui_lib::harness;
pub use skelview_gui_lib::i18n;
pub use skelview_gui_lib::input;
pub use skelview_gui_lib::state;

use app::ViewerApp;
use shared::AssetSource;
use state::{AppSettings, StartupOverrides};

/// Command line options
#[derive(Default)]
struct CliArgs {
    /// Asset root override (directory or http(s) base URL)
    assets: Option<String>,
    /// Catalog label to load at startup
    model: Option<String>,
    /// JSON command script to run headless instead of opening a window
    script: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skelview=info,skelview_gui_lib=info".into()),
        )
        .init();

    let args = parse_args();

    let settings = AppSettings::load();
    let overrides = StartupOverrides {
        source: args.assets.as_deref().map(AssetSource::parse),
        initial_model: args.model.clone(),
    };

    if let Some(path) = &args.script {
        let ok = run_script(path, &overrides.apply(&settings));
        std::process::exit(if ok { 0 } else { 1 });
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("skelview")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "skelview",
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, settings, overrides)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs::default();
    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--assets" if value.is_some() => {
                cli.assets = value;
                i += 1;
            }
            "--model" if value.is_some() => {
                cli.model = value;
                i += 1;
            }
            "--script" if value.is_some() => {
                cli.script = value;
                i += 1;
            }
            other => tracing::warn!("Ignoring unknown argument '{other}'"),
        }
        i += 1;
    }
    cli
}

/// Load the startup model, then run a JSON array of commands and print
/// one response per line. Returns false if any command failed.
fn run_script(path: &str, settings: &AppSettings) -> bool {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to read script {path}: {e}");
            return false;
        }
    };

    let mut harness = harness::TestHarness::from_settings(settings);
    if let Some(label) = settings.assets.startup_label() {
        if let Err(e) = harness.load_model_blocking(&label) {
            tracing::error!("Failed to load '{label}': {e}");
        }
    }

    let responses = match command::execute_json_batch(&mut harness, &json) {
        Ok(responses) => responses,
        Err(e) => {
            tracing::error!("{e}");
            return false;
        }
    };

    for response in &responses {
        match serde_json::to_string(response) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to serialize response: {e}"),
        }
    }
    responses.iter().all(|r| r.success)
}
