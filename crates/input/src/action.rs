use serde::{Deserialize, Serialize};
use tileworld_common::TileCoord;

/// A high-level action any input device can produce.
///
/// Held inputs (movement, break) are reported every frame they are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Attack,
    /// Choose a hotbar slot, zero-based.
    SelectSlot(usize),
    /// Place the selected hotbar block at a cell.
    Place(TileCoord),
    /// Keep the break input held on a cell.
    BreakHold(TileCoord),
    TogglePause,
    /// Unbound input.
    Noop,
}
