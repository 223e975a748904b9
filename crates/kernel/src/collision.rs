use crate::config::PhysicsConfig;
use crate::grid::WorldGrid;
use glam::Vec2;
use tileworld_common::{Aabb, TileCoord};

/// Step-up search parameters: shift by `nudge` up to `max_nudges` times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepUp {
    pub nudge: f32,
    pub max_nudges: u32,
}

impl StepUp {
    /// Never climb; a blocked horizontal move is simply rejected.
    pub const NONE: StepUp = StepUp {
        nudge: 0.0,
        max_nudges: 0,
    };

    pub fn from_config(physics: &PhysicsConfig) -> Self {
        Self {
            nudge: physics.step_nudge,
            max_nudges: physics.max_step_nudges,
        }
    }
}

/// Outcome of resolving one displacement against the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub aabb: Aabb,
    /// Input velocity with blocked components zeroed.
    pub velocity: Vec2,
    /// Vertical pass ended on a downward contact.
    pub grounded: bool,
    /// Horizontal move was rejected by terrain or clamped at the world edge.
    pub blocked_x: bool,
    /// Vertical pass ended on an upward contact.
    pub hit_ceiling: bool,
    /// Horizontal move succeeded only by climbing.
    pub stepped: bool,
}

/// Axis-separated box-vs-grid resolution, horizontal first.
pub struct CollisionResolver<'a> {
    grid: &'a WorldGrid,
    tile_size: f32,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(grid: &'a WorldGrid, tile_size: f32) -> Self {
        Self { grid, tile_size }
    }

    pub fn world_width(&self) -> f32 {
        self.grid.cols() as f32 * self.tile_size
    }

    pub fn world_height(&self) -> f32 {
        self.grid.rows() as f32 * self.tile_size
    }

    /// Rectangles of every solid tile that strictly overlaps `aabb`.
    pub fn overlapping_tiles(&self, aabb: Aabb) -> impl Iterator<Item = Aabb> + '_ {
        let ts = self.tile_size;
        let first = TileCoord::containing(aabb.pos, ts);
        let last = TileCoord::containing(Vec2::new(aabb.right(), aabb.bottom()), ts);
        (first.row..=last.row)
            .flat_map(move |row| (first.col..=last.col).map(move |col| TileCoord::new(col, row)))
            .filter(move |&coord| self.grid.is_solid(coord))
            .map(move |coord| Aabb::tile(coord, ts))
            .filter(move |tile| tile.intersects(&aabb))
    }

    pub fn collides(&self, aabb: &Aabb) -> bool {
        self.overlapping_tiles(*aabb).next().is_some()
    }

    /// Move `aabb` by `delta`, horizontal axis first, then clamp to the world's
    /// horizontal extent, then resolve the vertical axis.
    pub fn resolve(&self, aabb: Aabb, velocity: Vec2, delta: Vec2, step: StepUp) -> Resolution {
        let mut out = Resolution {
            aabb,
            velocity,
            grounded: false,
            blocked_x: false,
            hit_ceiling: false,
            stepped: false,
        };
        self.resolve_horizontal(&mut out, delta.x, step);
        self.clamp_to_world(&mut out);
        self.resolve_vertical(&mut out, delta.y);
        out
    }

    fn resolve_horizontal(&self, out: &mut Resolution, dx: f32, step: StepUp) {
        if dx == 0.0 {
            return;
        }
        let moved = out.aabb.translated(Vec2::new(dx, 0.0));
        if !self.collides(&moved) {
            out.aabb = moved;
        } else if let Some(climbed) = self.step_up(moved, step) {
            out.aabb = climbed;
            out.stepped = true;
        } else {
            out.blocked_x = true;
            out.velocity.x = 0.0;
        }
    }

    /// Brute-force ledge climb: lift by one nudge at a time until clear.
    fn step_up(&self, moved: Aabb, step: StepUp) -> Option<Aabb> {
        (1..=step.max_nudges)
            .map(|i| moved.translated(Vec2::new(0.0, -step.nudge * i as f32)))
            .find(|candidate| !self.collides(candidate))
    }

    fn clamp_to_world(&self, out: &mut Resolution) {
        let max_left = (self.world_width() - out.aabb.size.x).max(0.0);
        let left = out.aabb.left();
        if !(0.0..=max_left).contains(&left) {
            out.aabb.pos.x = left.clamp(0.0, max_left);
            out.blocked_x = true;
            out.velocity.x = 0.0;
        }
    }

    fn resolve_vertical(&self, out: &mut Resolution, dy: f32) {
        if dy == 0.0 {
            return;
        }
        let moved = out.aabb.translated(Vec2::new(0.0, dy));
        out.aabb = moved;
        // Nearest surface in the direction of travel, so tile order is irrelevant.
        if dy > 0.0 {
            if let Some(top) = self.overlapping_tiles(moved).map(|t| t.top()).reduce(f32::min) {
                out.aabb.pos.y = top - moved.size.y;
                out.velocity.y = 0.0;
                out.grounded = true;
            }
        } else if let Some(bottom) = self
            .overlapping_tiles(moved)
            .map(|t| t.bottom())
            .reduce(f32::max)
        {
            out.aabb.pos.y = bottom;
            out.velocity.y = 0.0;
            out.hit_ceiling = true;
        }
    }
}
