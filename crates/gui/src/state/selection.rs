use shared::PartId;

/// Part selection state (at most one part)
#[derive(Default, Debug)]
pub struct SelectionState {
    selected: Option<PartId>,
    /// Version counter for selection changes (for cache invalidation)
    pub version: u64,
}

impl SelectionState {
    /// Currently selected part
    pub fn primary(&self) -> Option<PartId> {
        self.selected
    }

    /// Check if a part is selected
    pub fn is_selected(&self, id: PartId) -> bool {
        self.selected == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }

    /// Select a single part (replaces previous selection)
    pub fn select(&mut self, id: PartId) {
        self.selected = Some(id);
        self.version += 1;
    }

    /// Clear selection. Returns false when nothing was selected.
    pub fn clear(&mut self) -> bool {
        if self.selected.take().is_some() {
            self.version += 1;
            true
        } else {
            false
        }
    }
}
