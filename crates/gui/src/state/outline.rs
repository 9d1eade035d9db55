use shared::PartId;

/// Parts the outline pass draws every frame
#[derive(Default, Debug, Clone)]
pub struct OutlineSet {
    parts: Vec<PartId>,
    /// Bumped on every change so the renderer can skip re-uploads
    version: u64,
}

impl OutlineSet {
    pub fn set(&mut self, parts: &[PartId]) {
        if self.parts != parts {
            self.parts = parts.to_vec();
            self.version += 1;
        }
    }

    pub fn parts(&self) -> &[PartId] {
        &self.parts
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
