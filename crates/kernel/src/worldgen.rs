use crate::grid::WorldGrid;
use tileworld_common::{BlockId, TileCoord};

/// Rows of dirt between the grass surface and the stone below.
const DIRT_DEPTH: usize = 2;

/// Flat terrain: grass at `ground_level`, a thin dirt layer, stone to the bottom.
pub fn flat_terrain(cols: usize, rows: usize, ground_level: usize) -> WorldGrid {
    let mut grid = WorldGrid::new(cols, rows);
    for row in ground_level..rows {
        let block = if row == ground_level {
            BlockId::Grass
        } else if row <= ground_level + DIRT_DEPTH {
            BlockId::Dirt
        } else {
            BlockId::Stone
        };
        for col in 0..cols {
            grid.set(TileCoord::new(col as i32, row as i32), block);
        }
    }
    grid
}
