//! Selection and undo controller.
//!
//! Owns the current model together with the selection, the deletion
//! history and the outline set, and applies user commands to them. All
//! mutations happen on the caller's thread; the only asynchronous part,
//! model loading, is collected through [`ViewerController::poll_load`].

use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use shared::{AssetSource, ModelCatalog, PartId};

use crate::command::ViewerCommand;
use crate::error::{ExportError, LoadError};
use crate::export;
use crate::input::InputEvent;
use crate::loader::{LoadCompletion, ModelLoader};
use crate::state::history::{DeletionHistory, DeletionRecord};
use crate::state::model::Model;
use crate::state::outline::OutlineSet;
use crate::state::selection::SelectionState;
use crate::state::settings::AppSettings;
use crate::viewport::picking::PartPicker;

/// What a dispatched command produced
#[derive(Debug)]
pub enum CommandEffect {
    /// State updated, or the command was a defined no-op
    Applied,
    /// Binary STL of the visible geometry, ready to be saved
    Exported(Vec<u8>),
    /// The command could not run; the message is also in the status line
    Rejected(String),
}

pub struct ViewerController {
    model: Option<Model>,
    selection: SelectionState,
    history: DeletionHistory,
    outline: OutlineSet,
    loader: ModelLoader,
    catalog: ModelCatalog,
    source: AssetSource,
    /// Color for primitives without a material
    mesh_color: [f32; 3],
    /// Label of the request in flight
    pending_label: Option<String>,
    status: String,
}

impl ViewerController {
    pub fn new(catalog: ModelCatalog, source: AssetSource) -> Self {
        Self {
            model: None,
            selection: SelectionState::default(),
            history: DeletionHistory::default(),
            outline: OutlineSet::default(),
            loader: ModelLoader::new(),
            catalog,
            source,
            mesh_color: [0.8, 0.8, 0.78],
            pending_label: None,
            status: String::new(),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        let mut controller = Self::new(
            settings.assets.catalog.clone(),
            settings.assets.source.clone(),
        );
        controller.mesh_color = settings.viewport.mesh_color;
        controller
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn selected(&self) -> Option<PartId> {
        self.selection.primary()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn history(&self) -> &DeletionHistory {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn outline(&self) -> &OutlineSet {
        &self.outline
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }

    pub fn set_source(&mut self, source: AssetSource) {
        self.source = source;
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Label of the model being loaded, if any
    pub fn pending_label(&self) -> Option<&str> {
        self.pending_label.as_deref()
    }

    /// Last status message for the status bar
    pub fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // ── Selection ─────────────────────────────────────────────

    /// Make `part` the selection and outline it
    pub fn select(&mut self, part: PartId) {
        self.selection.select(part);
        self.outline.set(&[part]);
    }

    /// Clear the selection and the outline. `None` is a no-op.
    pub fn deselect(&mut self, part: Option<PartId>) {
        if part.is_none() {
            return;
        }
        self.selection.clear();
        self.outline.set(&[]);
    }

    /// Handle a primary click at `ndc`. Returns the nearest part hit.
    ///
    /// A miss leaves the selection unchanged. Clicking the selected part
    /// deselects it; clicking another part moves the selection there.
    pub fn handle_click(&mut self, ndc: Vec2, picker: &dyn PartPicker) -> Option<PartId> {
        let model = self.model.as_ref()?;
        let clicked = picker
            .parts_under(model, ndc)
            .into_iter()
            .find(|p| model.is_visible(*p))?;

        self.click_part(clicked);
        Some(clicked)
    }

    /// Apply the click rule to a part that was hit
    pub fn click_part(&mut self, clicked: PartId) {
        let current = self.selection.primary();
        if current == Some(clicked) {
            self.deselect(current);
            tracing::debug!("Deselected part {clicked}");
        } else {
            self.deselect(current);
            self.select(clicked);
            tracing::debug!("Selected part {clicked}");
        }
    }

    // ── Delete / undo ─────────────────────────────────────────

    /// Detach the selected part from the model, remembering where it was.
    /// Returns false when nothing is selected.
    pub fn delete_selected(&mut self) -> bool {
        let Some(part) = self.selection.primary() else {
            return false;
        };
        let Some(model) = self.model.as_mut() else {
            return false;
        };
        let Some(node) = model.part(part) else {
            return false;
        };

        let record = DeletionRecord {
            model_id: model.id().clone(),
            part,
            parent: node.parent,
            position: node.transform.translation,
        };
        let name = node.name.clone();

        let detached = model.detach(part);
        // Selection and outline must not outlive the part either way
        self.deselect(Some(part));
        if !detached {
            return false;
        }
        self.history.push(record);

        tracing::info!("Deleted part '{name}'");
        self.set_status(format!("Deleted '{name}'"));
        true
    }

    /// Put the most recently deleted part back under its parent at its
    /// recorded position. The part is not re-selected.
    pub fn undo_delete(&mut self) -> bool {
        let Some(record) = self.history.pop() else {
            return false;
        };
        let Some(model) = self.model.as_mut() else {
            return false;
        };
        if *model.id() != record.model_id {
            tracing::warn!("Dropping undo record for part {} of another model", record.part);
            return false;
        }

        if !model.attach(record.part, record.parent) {
            tracing::warn!("Part {} could not be re-attached", record.part);
            return false;
        }
        model.set_position(record.part, record.position);

        let name = model.part_name(record.part).unwrap_or_default().to_string();
        tracing::info!("Restored part '{name}'");
        self.set_status(format!("Restored '{name}'"));
        true
    }

    // ── Models ────────────────────────────────────────────────

    /// Make `model` current. Selection, outline and history belong to the
    /// previous model and are cleared.
    pub fn install_model(&mut self, model: Model) {
        tracing::info!(
            "Showing model '{}' ({} parts)",
            model.name(),
            model.part_count()
        );
        self.set_status(format!("Loaded '{}'", model.name()));
        self.selection.clear();
        self.outline.set(&[]);
        self.history.clear();
        self.model = Some(model);
    }

    /// Start loading the catalog model `label`. The current model stays
    /// until the load completes.
    pub fn load_model(&mut self, label: &str) -> Result<(), LoadError> {
        let Some(preset) = self.catalog.resolve(label) else {
            let err = LoadError::UnknownModel(label.to_string());
            tracing::error!("{err}");
            self.set_status(err.to_string());
            return Err(err);
        };

        let location = self.source.locate(&preset.path);
        let label = preset.label.clone();
        if let Err(e) = self.loader.request(&label, location, self.mesh_color) {
            tracing::error!("Failed to start loading '{label}': {e}");
            self.set_status(e.to_string());
            return Err(e);
        }

        self.set_status(format!("Loading '{label}'..."));
        self.pending_label = Some(label);
        Ok(())
    }

    /// Apply a finished load, if one is ready. Returns true when a new
    /// model became current.
    pub fn poll_load(&mut self) -> bool {
        match self.loader.poll() {
            Some(completion) => self.finish(completion),
            None => false,
        }
    }

    /// Block until the pending load finishes (or `timeout` passes) and
    /// apply it. Returns true when a new model became current.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.loader.wait(timeout) {
            Some(completion) => self.finish(completion),
            None => false,
        }
    }

    fn finish(&mut self, completion: LoadCompletion) -> bool {
        self.pending_label = None;
        match completion.result {
            Ok(model) => {
                self.install_model(model);
                true
            }
            Err(e) => {
                tracing::error!("Failed to load '{}': {e}", completion.label);
                self.set_status(format!("Failed to load '{}': {e}", completion.label));
                false
            }
        }
    }

    // ── Export ────────────────────────────────────────────────

    /// Binary STL of every visible part
    pub fn export_stl(&self) -> Result<Vec<u8>, ExportError> {
        let model = self.model.as_ref().ok_or(ExportError::NoModel)?;
        export::build_binary_stl(model)
    }

    /// Export and write to `path`
    pub fn export_stl_to(&mut self, path: &Path) -> Result<(), ExportError> {
        match self.export_stl() {
            Ok(bytes) => self.save_stl(path, &bytes),
            Err(e) => {
                self.report_export_failure(&e);
                Err(e)
            }
        }
    }

    /// Write bytes produced by [`CommandEffect::Exported`] to `path`
    pub fn save_stl(&mut self, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
        let result = export::save_file(path, bytes);
        match &result {
            Ok(()) => self.set_status(format!("Exported {}", path.display())),
            Err(e) => self.report_export_failure(e),
        }
        result
    }

    fn report_export_failure(&mut self, e: &ExportError) {
        tracing::error!("STL export failed: {e}");
        self.set_status(format!("Export failed: {e}"));
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Translate an input event and run the resulting command
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        picker: &dyn PartPicker,
    ) -> Option<CommandEffect> {
        event.command().map(|cmd| self.apply(&cmd, picker))
    }

    pub fn apply(&mut self, command: &ViewerCommand, picker: &dyn PartPicker) -> CommandEffect {
        match command {
            ViewerCommand::Click { x, y } => {
                self.handle_click(Vec2::new(*x, *y), picker);
                CommandEffect::Applied
            }
            ViewerCommand::ClickPart { name } => {
                let part = self
                    .model
                    .as_ref()
                    .and_then(|m| m.find_part(name).filter(|p| m.is_visible(*p)));
                match part {
                    Some(p) => {
                        self.click_part(p);
                        CommandEffect::Applied
                    }
                    None => self.reject(format!("No visible part named '{name}'")),
                }
            }
            ViewerCommand::DeleteSelected => {
                self.delete_selected();
                CommandEffect::Applied
            }
            ViewerCommand::UndoDelete => {
                self.undo_delete();
                CommandEffect::Applied
            }
            ViewerCommand::LoadModel { label } => match self.load_model(label) {
                Ok(()) => CommandEffect::Applied,
                Err(e) => CommandEffect::Rejected(e.to_string()),
            },
            ViewerCommand::ExportStl => match self.export_stl() {
                Ok(bytes) => CommandEffect::Exported(bytes),
                Err(e) => {
                    self.report_export_failure(&e);
                    CommandEffect::Rejected(format!("Export failed: {e}"))
                }
            },
            ViewerCommand::Inspect => CommandEffect::Applied,
        }
    }

    fn reject(&mut self, msg: String) -> CommandEffect {
        self.set_status(msg.clone());
        CommandEffect::Rejected(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::input::Key;
    use std::cell::RefCell;

    /// Picker returning a scripted hit list for each click
    struct ScriptedPicker {
        hits: RefCell<Vec<Vec<PartId>>>,
    }

    impl ScriptedPicker {
        fn new(mut clicks: Vec<Vec<PartId>>) -> Self {
            clicks.reverse();
            Self {
                hits: RefCell::new(clicks),
            }
        }
    }

    impl PartPicker for ScriptedPicker {
        fn parts_under(&self, _model: &Model, _ndc: Vec2) -> Vec<PartId> {
            self.hits.borrow_mut().pop().unwrap_or_default()
        }
    }

    fn controller() -> ViewerController {
        let mut c = ViewerController::new(ModelCatalog::default(), AssetSource::default());
        c.install_model(fixtures::skeleton_model());
        c
    }

    fn part(c: &ViewerController, name: &str) -> PartId {
        fixtures::part(c.model().unwrap(), name)
    }

    #[test]
    fn test_select_sets_outline() {
        let mut c = controller();
        let head = part(&c, "Head");
        c.select(head);
        assert_eq!(c.selected(), Some(head));
        assert_eq!(c.outline().parts(), &[head]);
    }

    #[test]
    fn test_deselect_none_is_noop() {
        let mut c = controller();
        let head = part(&c, "Head");
        c.select(head);
        c.deselect(None);
        assert_eq!(c.selected(), Some(head));
        c.deselect(Some(head));
        assert!(c.selected().is_none());
        assert!(c.outline().is_empty());
        // Idempotent
        c.deselect(Some(head));
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_click_nearest_hit_wins() {
        let mut c = controller();
        let (head, spine) = (part(&c, "Head"), part(&c, "Spine"));
        let picker = ScriptedPicker::new(vec![vec![head, spine]]);
        assert_eq!(c.handle_click(Vec2::ZERO, &picker), Some(head));
        assert_eq!(c.selected(), Some(head));
    }

    #[test]
    fn test_click_miss_keeps_selection() {
        let mut c = controller();
        let head = part(&c, "Head");
        let picker = ScriptedPicker::new(vec![vec![head], vec![]]);
        c.handle_click(Vec2::ZERO, &picker);
        assert_eq!(c.handle_click(Vec2::ZERO, &picker), None);
        assert_eq!(c.selected(), Some(head));
    }

    #[test]
    fn test_click_toggle_and_switch() {
        let mut c = controller();
        let (a, b) = (part(&c, "LeftArm"), part(&c, "RightArm"));
        let picker = ScriptedPicker::new(vec![vec![a], vec![b], vec![b]]);
        c.handle_click(Vec2::ZERO, &picker);
        c.handle_click(Vec2::ZERO, &picker);
        assert_eq!(c.selected(), Some(b));
        assert_eq!(c.outline().parts(), &[b]);
        c.handle_click(Vec2::ZERO, &picker);
        assert!(c.selected().is_none());
        assert!(c.outline().is_empty());
    }

    #[test]
    fn test_click_skips_hidden_parts() {
        let mut c = controller();
        let (bow, arm, spine) = (part(&c, "Bow"), part(&c, "LeftArm"), part(&c, "Spine"));
        c.select(arm);
        c.delete_selected();
        // A stale picker reporting a part under a deleted parent
        let picker = ScriptedPicker::new(vec![vec![bow, spine]]);
        assert_eq!(c.handle_click(Vec2::ZERO, &picker), Some(spine));
    }

    #[test]
    fn test_click_without_model_is_noop() {
        let mut c = ViewerController::new(ModelCatalog::default(), AssetSource::default());
        let picker = ScriptedPicker::new(vec![vec![0]]);
        assert_eq!(c.handle_click(Vec2::ZERO, &picker), None);
        assert!(c.selected().is_none());
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        let mut c = controller();
        let version = c.model().unwrap().version();
        assert!(!c.delete_selected());
        assert_eq!(c.history_len(), 0);
        assert_eq!(c.model().unwrap().version(), version);
    }

    #[test]
    fn test_delete_records_and_detaches() {
        let mut c = controller();
        let (arm, spine) = (part(&c, "LeftArm"), part(&c, "Spine"));
        c.select(arm);
        assert!(c.delete_selected());

        let record = c.history().last().unwrap();
        assert_eq!(record.part, arm);
        assert_eq!(record.parent, Some(spine));
        assert_eq!(record.position, [0.008, 0.002, 0.0]);
        assert_eq!(&record.model_id, c.model().unwrap().id());

        assert!(!c.model().unwrap().is_attached(arm));
        assert!(c.selected().is_none());
        assert!(c.outline().is_empty());
    }

    #[test]
    fn test_undo_restores_parent_and_position() {
        let mut c = controller();
        let (arm, spine) = (part(&c, "LeftArm"), part(&c, "Spine"));
        c.select(arm);
        c.delete_selected();
        c.model.as_mut().unwrap().set_position(arm, [1.0, 1.0, 1.0]);

        assert!(c.undo_delete());
        let model = c.model().unwrap();
        assert!(model.is_visible(arm));
        assert_eq!(model.part(arm).unwrap().parent, Some(spine));
        assert_eq!(model.position(arm), Some([0.008, 0.002, 0.0]));
        assert!(c.selected().is_none());
        assert_eq!(c.history_len(), 0);
    }

    #[test]
    fn test_undo_lifo() {
        let mut c = controller();
        let (a, b) = (part(&c, "Head"), part(&c, "RightLeg"));
        c.select(a);
        c.delete_selected();
        c.select(b);
        c.delete_selected();

        assert!(c.undo_delete());
        assert!(c.model().unwrap().is_visible(b));
        assert!(!c.model().unwrap().is_visible(a));
        assert!(c.undo_delete());
        assert!(c.model().unwrap().is_visible(a));
        assert!(!c.undo_delete());
    }

    #[test]
    fn test_undo_nested_deletions_restore_hierarchy() {
        let mut c = controller();
        let (arm, bow) = (part(&c, "LeftArm"), part(&c, "Bow"));
        c.select(bow);
        c.delete_selected();
        c.select(arm);
        c.delete_selected();

        // Strict LIFO restores the arm first, then the bow under it
        assert!(c.undo_delete());
        assert!(c.undo_delete());
        assert_eq!(c.model().unwrap().part(bow).unwrap().parent, Some(arm));
        assert!(c.model().unwrap().is_visible(bow));
    }

    #[test]
    fn test_undo_under_hidden_parent_goes_to_root() {
        let mut c = controller();
        let (arm, bow) = (part(&c, "LeftArm"), part(&c, "Bow"));
        c.select(arm);
        c.delete_selected();
        // select() does not validate, so a hidden part can still be deleted
        c.select(bow);
        c.delete_selected();

        assert!(c.undo_delete());
        let model = c.model().unwrap();
        assert_eq!(model.part(bow).unwrap().parent, None);
        assert!(model.is_visible(bow));
        assert!(!model.is_visible(arm));
    }

    #[test]
    fn test_install_model_clears_history() {
        let mut c = controller();
        let head = part(&c, "Head");
        c.select(head);
        c.delete_selected();
        assert!(c.can_undo());

        c.install_model(fixtures::two_cubes());
        assert!(!c.can_undo());
        assert!(c.selected().is_none());
        assert!(!c.undo_delete());
    }

    #[test]
    fn test_load_unknown_model_no_mutation() {
        let mut c = controller();
        let head = part(&c, "Head");
        c.select(head);
        let id = c.model().unwrap().id().clone();

        let err = c.load_model("Skeleton Archer 9").unwrap_err();
        assert!(matches!(err, LoadError::UnknownModel(_)));
        assert_eq!(c.model().unwrap().id(), &id);
        assert_eq!(c.selected(), Some(head));
        assert!(!c.is_loading());
    }

    #[test]
    fn test_export_without_model() {
        let c = ViewerController::new(ModelCatalog::default(), AssetSource::default());
        assert!(matches!(c.export_stl(), Err(ExportError::NoModel)));
    }

    #[test]
    fn test_handle_event_keys() {
        let mut c = controller();
        let head = part(&c, "Head");
        let picker = ScriptedPicker::new(vec![vec![head]]);

        c.handle_event(&InputEvent::Click { ndc: Vec2::ZERO }, &picker);
        c.handle_event(&InputEvent::KeyDown { key: Key::Delete, command: false }, &picker);
        assert_eq!(c.history_len(), 1);

        let none = c.handle_event(&InputEvent::KeyDown { key: Key::Z, command: false }, &picker);
        assert!(none.is_none());
        assert_eq!(c.history_len(), 1);

        c.handle_event(&InputEvent::KeyDown { key: Key::Z, command: true }, &picker);
        assert_eq!(c.history_len(), 0);
        assert!(c.model().unwrap().is_visible(head));
    }

    #[test]
    fn test_apply_click_part_unknown_rejected() {
        let mut c = controller();
        let picker = ScriptedPicker::new(vec![]);
        let effect = c.apply(&ViewerCommand::ClickPart { name: "Tail".into() }, &picker);
        assert!(matches!(effect, CommandEffect::Rejected(_)));
        assert!(c.status().contains("Tail"));
    }

    #[test]
    fn test_delete_of_detached_part_still_deselects() {
        let mut c = controller();
        let head = part(&c, "Head");
        c.select(head);
        assert!(c.model.as_mut().unwrap().detach(head));

        assert!(!c.delete_selected());
        assert!(c.selected().is_none());
        assert!(c.outline().is_empty());
        assert_eq!(c.history_len(), 0);
    }

    #[test]
    fn test_export_to_missing_dir_reports_failure() {
        let mut c = controller();
        let dir = fixtures::TempAssets::new();
        let path = dir.path().join("no-such-dir").join("skeleton.stl");

        let err = c.export_stl_to(&path).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(c.status().starts_with("Export failed"));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_to_file_writes_visible_triangles() {
        let mut c = controller();
        let dir = fixtures::TempAssets::new();
        let path = dir.path().join("skeleton.stl");

        c.export_stl_to(&path).unwrap();
        let written = std::fs::read(&path).unwrap();
        let expected = export::stl_triangle_count(&c.export_stl().unwrap());
        assert!(expected.is_some_and(|n| n > 0));
        assert_eq!(export::stl_triangle_count(&written), expected);
        assert!(c.status().starts_with("Exported"));
    }

    #[test]
    fn test_export_event_yields_bytes_to_save() {
        let mut c = controller();
        let picker = ScriptedPicker::new(vec![]);
        let Some(CommandEffect::Exported(bytes)) = c.handle_event(&InputEvent::ExportRequested, &picker)
        else {
            panic!("export event produced no STL bytes");
        };
        assert!(export::stl_triangle_count(&bytes).is_some());

        let dir = fixtures::TempAssets::new();
        let path = dir.path().join("out.stl");
        c.save_stl(&path, &bytes).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_export_event_without_model_rejected() {
        let mut c = ViewerController::new(ModelCatalog::default(), AssetSource::default());
        let picker = ScriptedPicker::new(vec![]);
        let effect = c.handle_event(&InputEvent::ExportRequested, &picker);
        assert!(matches!(effect, Some(CommandEffect::Rejected(_))));
        assert!(c.status().starts_with("Export failed"));
    }

    #[test]
    fn test_model_selected_event_unknown_label_rejected() {
        let mut c = controller();
        let id = c.model().unwrap().id().clone();
        let picker = ScriptedPicker::new(vec![]);
        let event = InputEvent::ModelSelected { label: "Skeleton Archer 9".into() };
        let effect = c.handle_event(&event, &picker);
        assert!(matches!(effect, Some(CommandEffect::Rejected(_))));
        assert_eq!(c.model().unwrap().id(), &id);
        assert!(!c.is_loading());
    }
}
