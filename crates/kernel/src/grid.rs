use serde::{Deserialize, Serialize};
use tileworld_common::{BlockId, TileCoord};

/// Errors from importing a grid snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid snapshot has no rows or no columns")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown block id {id} at row {row}, column {col}")]
    UnknownBlock { row: usize, col: usize, id: u8 },
}

/// Fixed-size, row-major grid of block ids.
///
/// Reads outside the grid return air and writes outside it are dropped, so
/// edge-of-map queries behave as if the world were surrounded by void.
/// Serialized as rows of raw ids, the same shape [`WorldGrid::to_rows`] exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct WorldGrid {
    cols: usize,
    rows: usize,
    cells: Vec<BlockId>,
}

impl WorldGrid {
    /// An all-air grid. Dimensions are fixed for the grid's lifetime.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![BlockId::Air; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        self.index(coord).is_some()
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        let col = usize::try_from(coord.col).ok()?;
        let row = usize::try_from(coord.row).ok()?;
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    pub fn get(&self, coord: TileCoord) -> BlockId {
        self.index(coord)
            .map_or(BlockId::Air, |i| self.cells[i])
    }

    /// The single mutator for terrain. Out-of-bounds writes are ignored.
    pub fn set(&mut self, coord: TileCoord, block: BlockId) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = block;
        }
    }

    pub fn is_solid(&self, coord: TileCoord) -> bool {
        self.get(coord).is_solid()
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|b| b.is_solid()).count()
    }

    /// Export as rows (outer) of raw block ids (inner).
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|&b| u8::from(b)).collect())
            .collect()
    }

    /// Build a grid from rows of raw ids. The shape must be non-empty and
    /// rectangular and every id must name a known block.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, GridError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(GridError::Empty);
        }
        let mut cells = Vec::with_capacity(expected * rows.len());
        for (r, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::Ragged {
                    row: r,
                    expected,
                    found: row.len(),
                });
            }
            for (c, &raw) in row.iter().enumerate() {
                let block = BlockId::try_from(raw).map_err(|e| GridError::UnknownBlock {
                    row: r,
                    col: c,
                    id: e.0,
                })?;
                cells.push(block);
            }
        }
        Ok(Self {
            cols: expected,
            rows: rows.len(),
            cells,
        })
    }

    /// Replace the whole grid from rows. On error the current contents are kept.
    pub fn replace_from_rows(&mut self, rows: &[Vec<u8>]) -> Result<(), GridError> {
        *self = Self::from_rows(rows)?;
        Ok(())
    }

    /// Deterministic FNV-1a hash of dimensions and contents.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&(self.cols as u64).to_le_bytes());
        mix(&(self.rows as u64).to_le_bytes());
        for &block in &self.cells {
            mix(&[u8::from(block)]);
        }
        h
    }
}

impl TryFrom<Vec<Vec<u8>>> for WorldGrid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<WorldGrid> for Vec<Vec<u8>> {
    fn from(grid: WorldGrid) -> Self {
        grid.to_rows()
    }
}
