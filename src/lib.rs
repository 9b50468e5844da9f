//! Blockreel turns a video into layered voxel schematic frames.
//!
//! The pipeline runs as independent passes over an on-disk artifact store:
//!
//! 1. **Extract**: decode the source video (system `ffmpeg` over a pipe),
//!    drop frames to hit the target rate, resize under the aspect policy, and
//!    persist `frame_NNNN.png` plus an ordered manifest.
//! 2. **Quantize**: reduce every channel to `2^bits` levels and persist
//!    `quantized_frame_NNNN.png`.
//! 3. **Voxelize**: re-encode each quantized frame as a three-layer voxel
//!    region (one layer per RGB channel, intensity palette of 16 barrel
//!    states) and persist one schematic file per frame.
//!
//! Passes communicate only through the store, so each can be re-run on its
//! own over the same directory. Frame transforms are pure and deterministic;
//! the quantize and voxelize passes can optionally fan out over a worker pool.
#![forbid(unsafe_code)]

pub mod core;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod quantize;
pub mod resize;
pub mod sampler;
pub mod store;
pub mod voxel;

pub use self::core::{Dimensions, Fps};
pub use error::{BlockreelError, BlockreelResult};
pub use media::probe::{VideoSourceInfo, probe_video};
pub use media::source::{FrameSource, RawFrame};
pub use media::{is_ffmpeg_on_path, is_ffprobe_on_path};
pub use pipeline::{
    ConvertStats, PROGRESS_INTERVAL, PassStats, PipelineConfig, Threading, convert_video,
    extract_frames, quantize_frames, voxelize_frames,
};
pub use quantize::Quantizer;
pub use resize::{fitted_dimensions, resize_to_output};
pub use sampler::TemporalSampler;
pub use store::{
    FrameManifest, FrameRecord, OutputLayout, frame_file_name, list_frames, parse_frame_index,
    quantized_file_name, scan_indexed_images, schematic_name, write_png_atomic,
};
pub use voxel::emit::{LAYER_ORIGIN, VoxelSpacing, emit_frame};
pub use voxel::grid::{Bounds, VoxelGrid};
pub use voxel::palette::{PALETTE_SIZE, intensity_palette, palette_entry};
pub use voxel::schematic::{DATA_VERSION, SchematicRegion, VoxelRecord};
