//! Integration tests for the selection and undo-delete behavior.
//!
//! Drives the viewer through the headless harness: clicks go through the
//! orbit camera and ray picking exactly as in the GUI.

use skelview_gui_lib::export::stl_triangle_count;
use skelview_gui_lib::harness::TestHarness;

const PARTS: [&str; 8] = [
    "Hips", "Spine", "Head", "LeftArm", "Bow", "RightArm", "LeftLeg", "RightLeg",
];

#[test]
fn test_selection_follows_last_click() {
    let mut h = TestHarness::with_fixture();
    for name in ["Head", "LeftLeg", "Bow", "Hips", "RightArm"] {
        h.click_part(name).unwrap();
        assert_eq!(h.selected_name().as_deref(), Some(name));
        assert_eq!(h.controller.outline().parts().len(), 1);
    }
}

#[test]
fn test_click_selected_part_toggles_off() {
    let mut h = TestHarness::with_fixture();
    h.click_part("Spine").unwrap();
    h.click_part("Spine").unwrap();
    assert!(h.selected_name().is_none());
    assert!(h.controller.outline().is_empty());
}

#[test]
fn test_even_clicks_leave_selection_empty() {
    let mut h = TestHarness::with_fixture();
    for _ in 0..4 {
        h.click_part("Head").unwrap();
    }
    assert!(h.selected_name().is_none());

    h.click_part("Head").unwrap();
    assert_eq!(h.selected_name().as_deref(), Some("Head"));
}

#[test]
fn test_delete_without_selection_keeps_history() {
    let mut h = TestHarness::with_fixture();
    assert!(!h.delete_selected());
    assert_eq!(h.controller.history_len(), 0);
    assert_eq!(h.visible_part_count(), PARTS.len());
}

#[test]
fn test_delete_undo_restores_every_part() {
    for name in PARTS {
        let mut h = TestHarness::with_fixture();
        let before = h.position_of(name).unwrap();

        h.click_part(name).unwrap();
        assert!(h.delete_selected());
        assert!(!h.is_visible(name));

        assert!(h.undo_delete());
        assert!(h.is_visible(name), "{name} not restored");
        assert_eq!(h.position_of(name), Some(before));
        assert!(h.selected_name().is_none());
        assert_eq!(h.controller.history_len(), 0);
        assert_eq!(h.visible_part_count(), PARTS.len());
    }
}

#[test]
fn test_undo_is_lifo() {
    let mut h = TestHarness::with_fixture();
    h.click_part("Head").unwrap();
    h.delete_selected();
    h.click_part("RightLeg").unwrap();
    h.delete_selected();

    assert!(h.undo_delete());
    assert!(h.is_visible("RightLeg"));
    assert!(!h.is_visible("Head"));

    assert!(h.undo_delete());
    assert!(h.is_visible("Head"));

    assert!(!h.undo_delete());
}

#[test]
fn test_click_delete_undo_scenario() {
    let mut h = TestHarness::with_fixture();
    assert!(h.selected_name().is_none());
    assert_eq!(h.controller.history_len(), 0);

    let pos = h.position_of("Bow").unwrap();
    h.click_part("Bow").unwrap();
    assert_eq!(h.selected_name().as_deref(), Some("Bow"));

    assert!(h.delete_selected());
    assert!(!h.is_visible("Bow"));
    let record = h.controller.history().last().unwrap();
    assert_eq!(record.part, h.part("Bow").unwrap());
    assert_eq!(record.position, pos);

    assert!(h.undo_delete());
    assert!(h.is_visible("Bow"));
    assert_eq!(h.position_of("Bow"), Some(pos));
    assert!(h.selected_name().is_none());
    assert_eq!(h.controller.history_len(), 0);
}

#[test]
fn test_export_excludes_deleted_part() {
    let mut h = TestHarness::with_fixture();
    let full = stl_triangle_count(&h.export().unwrap()).unwrap();

    h.click_part("Head").unwrap();
    h.delete_selected();
    let without_head = stl_triangle_count(&h.export().unwrap()).unwrap();
    assert!(without_head < full);

    h.undo_delete();
    let restored = stl_triangle_count(&h.export().unwrap()).unwrap();
    assert_eq!(restored, full);
}

#[test]
fn test_export_keeps_selected_part() {
    let mut h = TestHarness::with_fixture();
    let full = stl_triangle_count(&h.export().unwrap()).unwrap();
    h.click_part("Head").unwrap();
    assert_eq!(stl_triangle_count(&h.export().unwrap()).unwrap(), full);
}

#[test]
fn test_deleting_parent_hides_children_until_undo() {
    let mut h = TestHarness::with_fixture();
    h.click_part("Spine").unwrap();
    h.delete_selected();

    for name in ["Spine", "Head", "LeftArm", "Bow", "RightArm"] {
        assert!(!h.is_visible(name), "{name} should be hidden");
    }
    assert!(h.is_visible("Hips"));
    assert!(h.is_visible("LeftLeg"));

    h.undo_delete();
    assert_eq!(h.visible_part_count(), PARTS.len());
}

#[test]
fn test_click_miss_keeps_selection() {
    let mut h = TestHarness::with_fixture();
    h.click_part("Head").unwrap();
    assert_eq!(h.click(glam::Vec2::new(0.95, 0.95)), None);
    assert_eq!(h.selected_name().as_deref(), Some("Head"));
}
