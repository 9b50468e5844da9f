use std::collections::BTreeMap;

use crate::error::BlockreelResult;
use crate::voxel::palette::PALETTE_SIZE;

/// Inclusive bounding volume of a voxel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl Bounds {
    pub fn extent(&self) -> [u32; 3] {
        std::array::from_fn(|axis| self.max[axis].abs_diff(self.min[axis]) + 1)
    }
}

/// Sparse voxel grid for one frame: coordinate -> intensity palette index.
///
/// Built fresh per frame. A coordinate may be written once; the `BTreeMap`
/// keeps iteration (and therefore serialization) deterministic.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    cells: BTreeMap<[i32; 3], u8>,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: [i32; 3], palette_index: u8) -> BlockreelResult<()> {
        if usize::from(palette_index) >= PALETTE_SIZE {
            return Err(anyhow::anyhow!(
                "palette index {palette_index} out of range at {pos:?}"
            )
            .into());
        }
        if self.cells.insert(pos, palette_index).is_some() {
            return Err(anyhow::anyhow!("voxel coordinate {pos:?} written twice").into());
        }
        Ok(())
    }

    pub fn get(&self, pos: [i32; 3]) -> Option<u8> {
        self.cells.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ([i32; 3], u8)> + '_ {
        self.cells.iter().map(|(pos, idx)| (*pos, *idx))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut cells = self.cells.keys();
        let first = *cells.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for pos in cells {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(pos[axis]);
                bounds.max[axis] = bounds.max[axis].max(pos[axis]);
            }
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_double_writes() {
        let mut grid = VoxelGrid::new();
        grid.set([1, 0, 1], 15).unwrap();
        assert!(grid.set([1, 0, 1], 3).is_err());
        assert_eq!(grid.get([1, 0, 1]), Some(15));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn rejects_out_of_palette_indices() {
        let mut grid = VoxelGrid::new();
        assert!(grid.set([0, 0, 0], 16).is_err());
        assert!(grid.is_empty());
    }

    #[test]
    fn bounds_cover_negative_coordinates() {
        let mut grid = VoxelGrid::new();
        grid.set([2, 0, 1], 1).unwrap();
        grid.set([1, 5, -3], 2).unwrap();
        let bounds = grid.bounds().unwrap();
        assert_eq!(bounds.min, [1, 0, -3]);
        assert_eq!(bounds.max, [2, 5, 1]);
        assert_eq!(bounds.extent(), [2, 6, 5]);
        assert!(VoxelGrid::new().bounds().is_none());
    }

    #[test]
    fn iteration_is_deterministic() {
        let mut a = VoxelGrid::new();
        let mut b = VoxelGrid::new();
        for pos in [[3, 1, -2], [0, 0, 0], [-1, 4, 2]] {
            a.set(pos, 5).unwrap();
        }
        for pos in [[-1, 4, 2], [3, 1, -2], [0, 0, 0]] {
            b.set(pos, 5).unwrap();
        }
        let av: Vec<_> = a.iter().collect();
        let bv: Vec<_> = b.iter().collect();
        assert_eq!(av, bv);
    }
}
