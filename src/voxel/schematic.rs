use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{BlockreelError, BlockreelResult},
    store::write_json_atomic,
    voxel::grid::{Bounds, VoxelGrid},
    voxel::palette::intensity_palette,
};

/// Fixed target data version: Java Edition 1.19.2.
pub const DATA_VERSION: i32 = 3120;

/// One placed voxel: coordinate plus its index into the region's palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoxelRecord {
    pub pos: [i32; 3],
    pub palette_index: u8,
}

/// Persisted form of a [`VoxelGrid`]: a named, versioned container carrying
/// the full palette, the complete coordinate -> palette-index mapping, and the
/// bounding volume. Immutable once built; one file per retained frame.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SchematicRegion {
    pub name: String,
    pub data_version: i32,
    pub bounds: Bounds,
    pub palette: Vec<String>,
    pub voxels: Vec<VoxelRecord>,
}

impl SchematicRegion {
    pub const FILE_EXTENSION: &'static str = "schem";

    pub fn from_grid(name: impl Into<String>, grid: &VoxelGrid) -> BlockreelResult<Self> {
        let bounds = grid
            .bounds()
            .ok_or_else(|| anyhow::anyhow!("refusing to serialize an empty voxel grid"))?;
        Ok(Self {
            name: name.into(),
            data_version: DATA_VERSION,
            bounds,
            palette: intensity_palette().to_vec(),
            voxels: grid
                .iter()
                .map(|(pos, palette_index)| VoxelRecord { pos, palette_index })
                .collect(),
        })
    }

    /// Write `<name>.schem` into `dir` atomically; returns the final path.
    pub fn save(&self, dir: &Path) -> BlockreelResult<PathBuf> {
        let path = dir.join(format!("{}.{}", self.name, Self::FILE_EXTENSION));
        write_json_atomic(&path, self)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> BlockreelResult<Self> {
        let bytes = fs::read(path).map_err(|e| {
            BlockreelError::io(format!(
                "failed to read schematic '{}': {e}",
                path.display()
            ))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            BlockreelError::decode(format!(
                "failed to parse schematic '{}': {e}",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new();
        grid.set([1, 0, 1], 15).unwrap();
        grid.set([1, 0, -1], 0).unwrap();
        grid.set([1, 0, -3], 8).unwrap();
        grid
    }

    #[test]
    fn from_grid_captures_palette_bounds_and_version() {
        let region = SchematicRegion::from_grid("frame_0000", &sample_grid()).unwrap();
        assert_eq!(region.name, "frame_0000");
        assert_eq!(region.data_version, DATA_VERSION);
        assert_eq!(region.palette.len(), 16);
        assert_eq!(region.voxels.len(), 3);
        assert_eq!(region.bounds.min, [1, 0, -3]);
        assert_eq!(region.bounds.max, [1, 0, 1]);
    }

    #[test]
    fn from_grid_rejects_empty_grids() {
        assert!(SchematicRegion::from_grid("frame_0000", &VoxelGrid::new()).is_err());
    }

    #[test]
    fn json_roundtrip_preserves_the_mapping() {
        let region = SchematicRegion::from_grid("frame_0007", &sample_grid()).unwrap();
        let json = serde_json::to_string(&region).unwrap();
        let back: SchematicRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, region.name);
        assert_eq!(back.data_version, region.data_version);
        assert_eq!(back.bounds, region.bounds);
        assert_eq!(back.palette, region.palette);
        assert_eq!(back.voxels, region.voxels);
    }
}
