pub mod settings_panel;
pub mod status_bar;
