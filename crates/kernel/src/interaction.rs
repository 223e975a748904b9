use crate::grid::WorldGrid;
use serde::{Deserialize, Serialize};
use tileworld_common::{Aabb, BlockId, TileCoord};

/// The single in-flight block break, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BreakState {
    #[default]
    Idle,
    InProgress { cell: TileCoord, elapsed: f32 },
}

/// Result of holding the break input for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakOutcome {
    /// Nothing is being broken (released, or the target is air).
    Idle,
    /// `progress` is in `[0, 1)`.
    InProgress { cell: TileCoord, progress: f32 },
    /// The hold completed and `block` was removed from `cell`.
    Completed { cell: TileCoord, block: BlockId },
}

/// World-mutation policy: placement checks and timed block breaking.
#[derive(Debug, Clone)]
pub struct InteractionRules {
    state: BreakState,
    break_duration: f32,
    reach: i32,
    tile_size: f32,
}

impl InteractionRules {
    pub fn new(break_duration: f32, reach: i32, tile_size: f32) -> Self {
        Self {
            state: BreakState::Idle,
            break_duration,
            reach,
            tile_size,
        }
    }

    pub fn break_state(&self) -> BreakState {
        self.state
    }

    /// Fraction of the current break, for presentation.
    pub fn break_progress(&self) -> Option<(TileCoord, f32)> {
        match self.state {
            BreakState::Idle => None,
            BreakState::InProgress { cell, elapsed } => {
                Some((cell, (elapsed / self.break_duration).clamp(0.0, 1.0)))
            }
        }
    }

    /// Whether `block` may go into `cell` given the actor's box.
    ///
    /// The cell must be in bounds and empty, within reach of the actor's
    /// centre column, supported by a solid neighbour below, left or right, and
    /// must not overlap the actor.
    pub fn can_place(&self, grid: &WorldGrid, cell: TileCoord, block: BlockId, actor: &Aabb) -> bool {
        if block.is_air() || !grid.in_bounds(cell) || grid.is_solid(cell) {
            return false;
        }
        let center_col = TileCoord::containing(actor.center(), self.tile_size).col;
        if (cell.col - center_col).abs() > self.reach {
            return false;
        }
        let supported = [cell.below(), cell.left(), cell.right()]
            .into_iter()
            .any(|n| grid.is_solid(n));
        supported && !Aabb::tile(cell, self.tile_size).intersects(actor)
    }

    /// Place `block` if [`can_place`](Self::can_place) allows it. Rejections
    /// leave the grid untouched.
    pub fn try_place(&self, grid: &mut WorldGrid, cell: TileCoord, block: BlockId, actor: &Aabb) -> bool {
        if !self.can_place(grid, cell, block, actor) {
            return false;
        }
        grid.set(cell, block);
        true
    }

    /// Hold the break input on `cell` for `dt` seconds.
    ///
    /// Targeting a new cell restarts the timer at zero without counting this
    /// tick's `dt`. A target that is air cancels the break.
    pub fn begin_or_continue_break(&mut self, grid: &mut WorldGrid, cell: TileCoord, dt: f32) -> BreakOutcome {
        let block = grid.get(cell);
        if block.is_air() {
            self.release_break();
            return BreakOutcome::Idle;
        }
        let elapsed = match self.state {
            BreakState::InProgress { cell: current, elapsed } if current == cell => elapsed + dt,
            _ => 0.0,
        };
        if elapsed >= self.break_duration {
            grid.set(cell, BlockId::Air);
            self.state = BreakState::Idle;
            return BreakOutcome::Completed { cell, block };
        }
        self.state = BreakState::InProgress { cell, elapsed };
        BreakOutcome::InProgress {
            cell,
            progress: elapsed / self.break_duration,
        }
    }

    /// Input released: drop any in-flight break without touching the world.
    pub fn release_break(&mut self) {
        self.state = BreakState::Idle;
    }
}
