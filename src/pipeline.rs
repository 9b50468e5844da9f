use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use image::RgbImage;
use rayon::prelude::*;

use crate::{
    core::Dimensions,
    error::{BlockreelError, BlockreelResult},
    media::source::FrameSource,
    quantize::Quantizer,
    resize::{fitted_dimensions, resize_to_output},
    sampler::TemporalSampler,
    store::{
        FrameManifest, FrameRecord, OutputLayout, frame_file_name, list_frames,
        quantized_file_name, schematic_name, write_png_atomic,
    },
    voxel::emit::{VoxelSpacing, emit_frame},
    voxel::schematic::SchematicRegion,
};

/// Progress events are emitted every this many processed frames.
pub const PROGRESS_INTERVAL: u64 = 100;

/// Everything the pipeline needs besides the input path. Validated as a whole
/// before any pass touches the source, so bad combinations fail fast instead
/// of partway through processing.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub target_width: u32,
    pub target_height: u32,
    /// Unset keeps every source frame.
    pub target_fps: Option<u32>,
    pub keep_aspect_ratio: bool,
    pub bits_per_channel: u8,
    pub spacing: VoxelSpacing,
    pub output_root: PathBuf,
}

impl PipelineConfig {
    pub fn validate(&self) -> BlockreelResult<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(BlockreelError::config(
                "target width/height must be non-zero",
            ));
        }
        if let Some(fps) = self.target_fps
            && fps == 0
        {
            return Err(BlockreelError::config("target fps must be > 0 when set"));
        }
        Quantizer::new(self.bits_per_channel)?;
        self.spacing.validate()
    }
}

/// Worker-pool knob for the quantize and voxelize passes. The extract pass is
/// always sequential: stream decoding is forward-only.
#[derive(Clone, Debug, Default)]
pub struct Threading {
    pub parallel: bool,
    /// Worker count; `None` uses the rayon heuristic.
    pub threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Frames the pass saw (decoded frames for extract, listed files after).
    pub frames_total: u64,
    /// Artifacts written.
    pub frames_written: u64,
    /// Dropped by the sampler (extract) or skipped as unreadable (later passes).
    pub frames_skipped: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub extract: PassStats,
    pub quantize: PassStats,
    pub voxelize: PassStats,
}

/// First pass: decode, temporally resample, resize, persist frames.
#[tracing::instrument(skip(cfg, layout))]
pub fn extract_frames(
    video: &Path,
    cfg: &PipelineConfig,
    layout: &OutputLayout,
) -> BlockreelResult<PassStats> {
    cfg.validate()?;

    let mut source = FrameSource::open(video)?;
    let sampler = TemporalSampler::new(source.info().fps.as_f64(), cfg.target_fps)?;
    let target = Dimensions::new(cfg.target_width, cfg.target_height);
    let out_dims = fitted_dimensions(target, source.info().dimensions(), cfg.keep_aspect_ratio);
    tracing::info!(
        estimated = source.info().frame_count_estimate(),
        width = out_dims.width,
        height = out_dims.height,
        interval = sampler.interval(),
        "extracting frames"
    );

    let mut manifest = FrameManifest::default();
    let mut decoded = 0u64;
    let mut retained = 0u64;
    while let Some(frame) = source.next_frame()? {
        decoded += 1;
        if !sampler.retains(frame.decode_index) {
            continue;
        }
        let resized = resize_to_output(&frame.into_image()?, out_dims);
        let file_name = frame_file_name(retained);
        write_png_atomic(&layout.frames_dir().join(&file_name), &resized)?;
        manifest.push(FrameRecord {
            index: retained,
            file_name,
            width: out_dims.width,
            height: out_dims.height,
        });
        retained += 1;
        if retained.is_multiple_of(PROGRESS_INTERVAL) {
            tracing::info!(frames = retained, "extracted");
        }
    }
    source.finish()?;
    manifest.save(layout.frames_dir())?;

    Ok(PassStats {
        frames_total: decoded,
        frames_written: retained,
        frames_skipped: decoded - retained,
    })
}

/// Second pass: reduce per-channel bit depth of every frame in `frames_dir`.
#[tracing::instrument(skip(layout, threading))]
pub fn quantize_frames(
    frames_dir: &Path,
    bits_per_channel: u8,
    layout: &OutputLayout,
    threading: &Threading,
) -> BlockreelResult<PassStats> {
    let quantizer = Quantizer::new(bits_per_channel)?;
    let entries = list_frames(frames_dir)?;

    let (stats, records) = run_frame_pass(&entries, threading, "quantize", |index, path| {
        let mut img = load_rgb(path)?;
        quantizer.quantize_in_place(&mut img);
        let file_name = quantized_file_name(index);
        write_png_atomic(&layout.quantized_dir().join(&file_name), &img)?;
        Ok(FrameRecord {
            index,
            file_name,
            width: img.width(),
            height: img.height(),
        })
    })?;

    FrameManifest { frames: records }.save(layout.quantized_dir())?;
    Ok(stats)
}

/// Third pass: re-encode every quantized frame as a voxel schematic region.
#[tracing::instrument(skip(layout, threading))]
pub fn voxelize_frames(
    quantized_dir: &Path,
    spacing: VoxelSpacing,
    layout: &OutputLayout,
    threading: &Threading,
) -> BlockreelResult<PassStats> {
    spacing.validate()?;
    let entries = list_frames(quantized_dir)?;

    let (stats, _) = run_frame_pass(&entries, threading, "voxelize", |index, path| {
        let img = load_rgb(path)?;
        let grid = emit_frame(&img, spacing)?;
        let region = SchematicRegion::from_grid(schematic_name(index), &grid)?;
        let saved = region.save(layout.schematics_dir())?;
        Ok(FrameRecord {
            index,
            file_name: saved
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            width: img.width(),
            height: img.height(),
        })
    })?;

    Ok(stats)
}

/// Run all three passes over a fresh layout under `cfg.output_root`.
pub fn convert_video(
    video: &Path,
    cfg: &PipelineConfig,
    threading: &Threading,
) -> BlockreelResult<ConvertStats> {
    cfg.validate()?;
    let layout = OutputLayout::create(&cfg.output_root)?;
    let extract = extract_frames(video, cfg, &layout)?;
    let quantize = quantize_frames(
        layout.frames_dir(),
        cfg.bits_per_channel,
        &layout,
        threading,
    )?;
    let voxelize = voxelize_frames(layout.quantized_dir(), cfg.spacing, &layout, threading)?;
    Ok(ConvertStats {
        extract,
        quantize,
        voxelize,
    })
}

fn load_rgb(path: &Path) -> BlockreelResult<RgbImage> {
    let img = image::open(path).map_err(|e| {
        BlockreelError::decode(format!("failed to read frame '{}': {e}", path.display()))
    })?;
    Ok(img.to_rgb8())
}

/// Drive `work` over indexed frame files, sequentially or on a worker pool.
///
/// A decode failure on one frame is logged and skipped (the frame simply has
/// no output); any other failure aborts the pass. Output files are written
/// atomically by the workers, so a partial pass leaves no ambiguous artifacts.
fn run_frame_pass<F>(
    entries: &[(u64, PathBuf)],
    threading: &Threading,
    stage: &'static str,
    work: F,
) -> BlockreelResult<(PassStats, Vec<FrameRecord>)>
where
    F: Fn(u64, &Path) -> BlockreelResult<FrameRecord> + Sync,
{
    let done = AtomicU64::new(0);
    let run_one = |index: u64, path: &Path| -> BlockreelResult<Option<FrameRecord>> {
        let outcome = match work(index, path) {
            Ok(record) => Some(record),
            Err(BlockreelError::Decode(msg)) => {
                tracing::warn!(stage, frame = index, %msg, "skipping unreadable frame");
                None
            }
            Err(other) => return Err(other),
        };
        let processed = done.fetch_add(1, Ordering::Relaxed) + 1;
        if processed.is_multiple_of(PROGRESS_INTERVAL) {
            tracing::info!(stage, frames = processed, "progress");
        }
        Ok(outcome)
    };

    let results: Vec<Option<FrameRecord>> = if threading.parallel {
        let pool = build_thread_pool(threading.threads)?;
        pool.install(|| {
            entries
                .par_iter()
                .map(|(index, path)| run_one(*index, path))
                .collect::<BlockreelResult<_>>()
        })?
    } else {
        let mut out = Vec::with_capacity(entries.len());
        for (index, path) in entries {
            out.push(run_one(*index, path)?);
        }
        out
    };

    let mut stats = PassStats {
        frames_total: entries.len() as u64,
        ..PassStats::default()
    };
    let mut records = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Some(record) => {
                stats.frames_written += 1;
                records.push(record);
            }
            None => stats.frames_skipped += 1,
        }
    }
    Ok((stats, records))
}

fn build_thread_pool(threads: Option<usize>) -> BlockreelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(BlockreelError::config(
            "threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build worker thread pool: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PipelineConfig {
        PipelineConfig {
            target_width: 64,
            target_height: 64,
            target_fps: Some(10),
            keep_aspect_ratio: true,
            bits_per_channel: 4,
            spacing: VoxelSpacing::default(),
            output_root: PathBuf::from("processed"),
        }
    }

    #[test]
    fn config_validation_catches_each_bad_field() {
        assert!(valid_config().validate().is_ok());

        let mut cfg = valid_config();
        cfg.target_width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.target_fps = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.bits_per_channel = 9;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.spacing = VoxelSpacing { x: 1, y: 0, z: 2 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_worker_threads_are_rejected() {
        assert!(build_thread_pool(Some(0)).is_err());
        assert!(build_thread_pool(Some(2)).is_ok());
        assert!(build_thread_pool(None).is_ok());
    }
}
