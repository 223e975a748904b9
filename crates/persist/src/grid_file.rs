//! Plain JSON world files: a list of rows, each a list of block ids.

use crate::store::StoreError;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tileworld_kernel::WorldGrid;
use tracing::info;

pub fn write_grid_json(path: impl AsRef<Path>, rows: &[Vec<u8>]) -> Result<(), StoreError> {
    let path = path.as_ref();
    serde_json::to_writer(BufWriter::new(File::create(path)?), rows)?;
    info!(path = %path.display(), rows = rows.len(), "world written");
    Ok(())
}

/// Read and validate a world file. Shape or id errors surface as
/// [`StoreError::Grid`].
pub fn read_grid_json(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>, StoreError> {
    let path = path.as_ref();
    let rows: Vec<Vec<u8>> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    WorldGrid::from_rows(&rows)?;
    info!(path = %path.display(), rows = rows.len(), "world read");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::flat_terrain;

    #[test]
    fn json_file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("world.json");
        let rows = flat_terrain(6, 5, 2).to_rows();
        write_grid_json(&path, &rows).unwrap();
        assert_eq!(read_grid_json(&path).unwrap(), rows);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[[0,0,0,0,0,0],"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("world.json");
        std::fs::write(&path, "[[0,1],[2]]").unwrap();
        assert!(matches!(read_grid_json(&path), Err(StoreError::Grid(_))));

        std::fs::write(&path, "[[0,9]]").unwrap();
        assert!(matches!(read_grid_json(&path), Err(StoreError::Grid(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_grid_json(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_grid_json(tmp.path().join("absent.json")),
            Err(StoreError::Io(_))
        ));
    }
}
