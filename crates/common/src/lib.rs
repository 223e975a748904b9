//! Shared value types for the tile world.
//!
//! # Invariants
//! - `BlockId::Air` is the only passable block id.
//! - Boxes use screen orientation: `y` grows downward.

pub mod types;

pub use types::{
    Aabb, BlockId, Facing, MobId, PlaceRequest, TickIntent, TileCoord, UnknownBlockId,
};
