//! JSON command protocol for scripted sessions.
//!
//! Commands run against the headless [`TestHarness`]; the binary can replay
//! a batch on startup (`--script`).

use serde::{Deserialize, Serialize};

use crate::controller::CommandEffect;
use crate::harness::TestHarness;

/// A viewer command, as produced by input events or read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ViewerCommand {
    /// Click at normalized device coordinates
    Click { x: f32, y: f32 },
    /// Click the visible part with this name
    ClickPart { name: String },
    /// Delete the selected part
    DeleteSelected,
    /// Restore the most recently deleted part
    UndoDelete,
    /// Load a preset model by its catalog label
    LoadModel { label: String },
    /// Serialize the visible geometry as binary STL
    ExportStl,
    /// Describe the current model and selection
    Inspect,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: ViewerCommand) -> CommandResponse {
    match cmd {
        ViewerCommand::Inspect => CommandResponse::ok_with_data(harness.inspect()),

        ViewerCommand::ClickPart { name } => match harness.click_part(&name) {
            Ok(()) => CommandResponse::ok_with_data(serde_json::json!({
                "selected": harness.selected_name(),
            })),
            Err(e) => CommandResponse::err(e),
        },

        ViewerCommand::LoadModel { label } => {
            if let Err(e) = harness.controller.load_model(&label) {
                return CommandResponse::err(e.to_string());
            }
            match harness.finish_load() {
                Ok(()) => CommandResponse::ok_with_data(serde_json::json!({
                    "model": label,
                    "part_count": harness.part_count(),
                })),
                Err(e) => CommandResponse::err(e),
            }
        }

        other => match harness.apply(&other) {
            CommandEffect::Applied => CommandResponse::ok_with_data(serde_json::json!({
                "selected": harness.selected_name(),
                "history_len": harness.controller.history_len(),
            })),
            CommandEffect::Exported(bytes) => CommandResponse::ok_with_data(serde_json::json!({
                "bytes": bytes.len(),
                "triangles": crate::export::stl_triangle_count(&bytes),
            })),
            CommandEffect::Rejected(msg) => CommandResponse::err(msg),
        },
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: ViewerCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<ViewerCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_undo() {
        let json = r#"{"command": "undo_delete"}"#;
        let cmd: ViewerCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ViewerCommand::UndoDelete);
    }

    #[test]
    fn test_command_serde_click() {
        let json = r#"{"command": "click", "x": 0.25, "y": -0.5}"#;
        let cmd: ViewerCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ViewerCommand::Click { x: 0.25, y: -0.5 });
    }

    #[test]
    fn test_command_serde_load_model() {
        let json = r#"{"command": "load_model", "label": "Skeleton Bowman 3"}"#;
        let cmd: ViewerCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ViewerCommand::LoadModel { label } => assert_eq!(label, "Skeleton Bowman 3"),
            _ => panic!("Expected LoadModel"),
        }
    }

    #[test]
    fn test_execute_click_delete_undo() {
        let mut h = TestHarness::with_fixture();
        let before = h.visible_part_count();

        let resp = execute_json(&mut h, r#"{"command": "click_part", "name": "Head"}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["selected"], "Head");

        let resp = execute_json(&mut h, r#"{"command": "delete_selected"}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["history_len"], 1);
        assert_eq!(h.visible_part_count(), before - 1);

        let resp = execute_json(&mut h, r#"{"command": "undo_delete"}"#).unwrap();
        assert!(resp.success);
        assert_eq!(h.visible_part_count(), before);
    }

    #[test]
    fn test_execute_inspect() {
        let mut h = TestHarness::with_fixture();
        let resp = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap();
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data["model"], "Fixture Skeleton");
        assert!(data["parts"].as_array().unwrap().len() > 3);
    }

    #[test]
    fn test_execute_export() {
        let mut h = TestHarness::with_fixture();
        let resp = execute_json(&mut h, r#"{"command": "export_stl"}"#).unwrap();
        assert!(resp.success);
        assert!(resp.data.unwrap()["triangles"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_execute_export_without_model_fails() {
        let mut h = TestHarness::new();
        let resp = execute_json(&mut h, r#"{"command": "export_stl"}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.error.is_some());
    }

    #[test]
    fn test_execute_unknown_model() {
        let mut h = TestHarness::with_fixture();
        let resp =
            execute_json(&mut h, r#"{"command": "load_model", "label": "Dragon"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(h.model_name().as_deref(), Some("Fixture Skeleton"));
    }

    #[test]
    fn test_execute_batch() {
        let mut h = TestHarness::with_fixture();
        let batch = r#"[
            {"command": "click_part", "name": "LeftArm"},
            {"command": "click_part", "name": "LeftArm"},
            {"command": "delete_selected"}
        ]"#;
        let responses = execute_json_batch(&mut h, batch).unwrap();
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().all(|r| r.success));
        // Second click toggled the selection off, so nothing was deleted
        assert_eq!(h.controller.history_len(), 0);
    }

    #[test]
    fn test_execute_invalid_json() {
        let mut h = TestHarness::new();
        assert!(execute_json(&mut h, "not valid json").is_err());
        assert!(execute_json(&mut h, r#"{"command": "fly"}"#).is_err());
    }
}
