use image::RgbImage;

use crate::{
    error::{BlockreelError, BlockreelResult},
    voxel::grid::VoxelGrid,
};

/// World-space offset of the voxel block: pixel (0, height-1) of a frame lands
/// its red voxel at this coordinate.
pub const LAYER_ORIGIN: [i32; 3] = [1, 0, 1];

/// Separation between neighboring pixels (x, y) and between the three
/// channel layers (z). All strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelSpacing {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelSpacing {
    pub fn new(x: i32, y: i32, z: i32) -> BlockreelResult<Self> {
        let spacing = Self { x, y, z };
        spacing.validate()?;
        Ok(spacing)
    }

    pub fn validate(&self) -> BlockreelResult<()> {
        if self.x < 1 || self.y < 1 || self.z < 1 {
            return Err(BlockreelError::config(format!(
                "voxel separations must be positive, got ({}, {}, {})",
                self.x, self.y, self.z
            )));
        }
        Ok(())
    }
}

impl Default for VoxelSpacing {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 2 }
    }
}

/// Map a frame to its three-layer voxel grid.
///
/// Every pixel emits one voxel per channel: red on the `z = 1` layer, green
/// one layer behind it, blue two layers behind, with image rows flipped so the
/// bottom image row sits at world `y = 0`.
///
/// The intensity index is always the sample's top nibble (`v >> 4`, 0..=15) —
/// the palette has exactly 16 entries, so this re-quantizes to 4 bits no
/// matter what bit depth the quantize pass was configured with. The two knobs
/// are intentionally independent.
pub fn emit_frame(img: &RgbImage, spacing: VoxelSpacing) -> BlockreelResult<VoxelGrid> {
    spacing.validate()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BlockreelError::decode("frame contains no pixels"));
    }

    let height = img.height() as i32;
    let mut grid = VoxelGrid::new();
    for (x, y, px) in img.enumerate_pixels() {
        let inverted_y = height - y as i32 - 1;
        for (layer, sample) in px.0.iter().enumerate() {
            let idx = sample >> 4;
            let pos = [
                x as i32 * spacing.x + LAYER_ORIGIN[0],
                inverted_y * spacing.y + LAYER_ORIGIN[1],
                -(layer as i32) * spacing.z + LAYER_ORIGIN[2],
            ];
            grid.set(pos, idx)?;
        }
    }
    Ok(grid)
}
