use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A terrain type stored in one grid cell.
///
/// `Air` (id 0) is the only passable block; every other id is solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum BlockId {
    #[default]
    Air = 0,
    Dirt = 1,
    Grass = 2,
    Stone = 3,
    Wood = 4,
    Leaves = 5,
}

/// Raised when a raw id does not name a known block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown block id {0}")]
pub struct UnknownBlockId(pub u8);

impl BlockId {
    /// Every placeable block, in hotbar order.
    pub const SOLIDS: [BlockId; 5] = [
        BlockId::Dirt,
        BlockId::Grass,
        BlockId::Stone,
        BlockId::Wood,
        BlockId::Leaves,
    ];

    pub fn is_air(self) -> bool {
        self == BlockId::Air
    }

    pub fn is_solid(self) -> bool {
        !self.is_air()
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockId::Air => "Air",
            BlockId::Dirt => "Dirt",
            BlockId::Grass => "Grass",
            BlockId::Stone => "Stone",
            BlockId::Wood => "Wood",
            BlockId::Leaves => "Leaves",
        }
    }
}

impl TryFrom<u8> for BlockId {
    type Error = UnknownBlockId;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(BlockId::Air),
            1 => Ok(BlockId::Dirt),
            2 => Ok(BlockId::Grass),
            3 => Ok(BlockId::Stone),
            4 => Ok(BlockId::Wood),
            5 => Ok(BlockId::Leaves),
            other => Err(UnknownBlockId(other)),
        }
    }
}

impl From<BlockId> for u8 {
    fn from(id: BlockId) -> u8 {
        id as u8
    }
}

/// Integer cell address in the world grid. Signed so that neighbours of edge
/// cells can be expressed and read back as out-of-bounds air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn below(self) -> Self {
        Self::new(self.col, self.row + 1)
    }

    pub fn left(self) -> Self {
        Self::new(self.col - 1, self.row)
    }

    pub fn right(self) -> Self {
        Self::new(self.col + 1, self.row)
    }

    /// The cell containing a world-space point.
    pub fn containing(point: Vec2, tile_size: f32) -> Self {
        Self::new(
            (point.x / tile_size).floor() as i32,
            (point.y / tile_size).floor() as i32,
        )
    }
}

/// Axis-aligned box in world space. `y` grows downward, so `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(left, top),
            size: Vec2::new(width, height),
        }
    }

    /// The world-space rectangle covered by one tile.
    pub fn tile(coord: TileCoord, tile_size: f32) -> Self {
        Self::new(
            coord.col as f32 * tile_size,
            coord.row as f32 * tile_size,
            tile_size,
            tile_size,
        )
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            pos: self.pos + delta,
            size: self.size,
        }
    }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Horizontal facing of an actor or mob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Unique identifier for a mob in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MobId(pub Uuid);

impl MobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MobId {
    fn default() -> Self {
        Self::new()
    }
}

/// A request to put `block` into `cell` this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRequest {
    pub cell: TileCoord,
    pub block: BlockId,
}

/// Everything the simulation consumes from input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickIntent {
    /// -1 left, 0 none, +1 right.
    pub horizontal: i8,
    pub jump: bool,
    pub attack: bool,
    pub place: Option<PlaceRequest>,
    /// Break button held this tick.
    pub break_held: bool,
    /// Cell under the cursor; the break target while `break_held` is set.
    pub target: Option<TileCoord>,
}

impl TickIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn walk(horizontal: i8) -> Self {
        Self {
            horizontal: horizontal.signum(),
            ..Self::default()
        }
    }

    /// Break held on `cell`.
    pub fn breaking(cell: TileCoord) -> Self {
        Self {
            break_held: true,
            target: Some(cell),
            ..Self::default()
        }
    }
}
