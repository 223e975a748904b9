use tileworld_common::BlockId;

/// Errors from hotbar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HotbarError {
    #[error("hotbar slot {slot} out of range (0..{len})")]
    OutOfRange { slot: usize, len: usize },
}

/// The placeable blocks, one per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotbar {
    slots: Vec<BlockId>,
    selected: usize,
}

impl Default for Hotbar {
    fn default() -> Self {
        Self {
            slots: BlockId::SOLIDS.to_vec(),
            selected: 0,
        }
    }
}

impl Hotbar {
    pub fn slots(&self) -> &[BlockId] {
        &self.slots
    }

    pub fn selected_slot(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> BlockId {
        self.slots[self.selected]
    }

    /// Select `slot`. An out-of-range slot leaves the selection unchanged.
    pub fn select(&mut self, slot: usize) -> Result<BlockId, HotbarError> {
        if slot >= self.slots.len() {
            return Err(HotbarError::OutOfRange {
                slot,
                len: self.slots.len(),
            });
        }
        self.selected = slot;
        Ok(self.slots[slot])
    }
}
