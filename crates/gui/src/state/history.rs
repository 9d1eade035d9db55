//! Deletion history for undo

use shared::{ModelId, PartId};

/// A deleted part and what is needed to put it back
#[derive(Clone, Debug, PartialEq)]
pub struct DeletionRecord {
    /// Model the part belongs to
    pub model_id: ModelId,
    pub part: PartId,
    /// Parent the part was detached from (None = model root)
    pub parent: Option<PartId>,
    /// Local position at the time of deletion
    pub position: [f32; 3],
}

/// Stack of deletions not yet undone, oldest first
#[derive(Default, Debug)]
pub struct DeletionHistory {
    records: Vec<DeletionRecord>,
}

impl DeletionHistory {
    pub fn push(&mut self, record: DeletionRecord) {
        self.records.push(record);
    }

    /// Take the most recent deletion
    pub fn pop(&mut self) -> Option<DeletionRecord> {
        self.records.pop()
    }

    pub fn last(&self) -> Option<&DeletionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records oldest first
    pub fn records(&self) -> &[DeletionRecord] {
        &self.records
    }
}
