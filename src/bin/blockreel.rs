use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use blockreel::{
    ConvertStats, OutputLayout, PassStats, PipelineConfig, Threading, VoxelSpacing, convert_video,
    extract_frames, quantize_frames, voxelize_frames,
};

#[derive(Parser, Debug)]
#[command(name = "blockreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, resize, and temporally resample frames from a video.
    Extract(ExtractArgs),
    /// Reduce the per-channel bit depth of a directory of frames.
    Quantize(QuantizeArgs),
    /// Re-encode quantized frames as layered voxel schematic regions.
    Voxelize(VoxelizeArgs),
    /// Run the full pipeline: extract, quantize, voxelize.
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input video file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory root.
    #[arg(long, default_value = "processed")]
    out: PathBuf,

    #[command(flatten)]
    frame: FrameArgs,
}

#[derive(Parser, Debug)]
struct QuantizeArgs {
    /// Directory of extracted frames.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Output directory root.
    #[arg(long, default_value = "processed")]
    out: PathBuf,

    /// Bits per color channel (1-8).
    #[arg(long, default_value_t = 4)]
    bits: u8,

    #[command(flatten)]
    threading: ThreadingArgs,
}

#[derive(Parser, Debug)]
struct VoxelizeArgs {
    /// Directory of quantized frames.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Output directory root.
    #[arg(long, default_value = "processed")]
    out: PathBuf,

    #[command(flatten)]
    spacing: SpacingArgs,

    #[command(flatten)]
    threading: ThreadingArgs,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input video file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory root.
    #[arg(long, default_value = "processed")]
    out: PathBuf,

    #[command(flatten)]
    frame: FrameArgs,

    /// Bits per color channel (1-8).
    #[arg(long, default_value_t = 4)]
    bits: u8,

    #[command(flatten)]
    spacing: SpacingArgs,

    #[command(flatten)]
    threading: ThreadingArgs,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Target frame width.
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Target frame height.
    #[arg(long, default_value_t = 64)]
    height: u32,

    /// Target frame rate; unset keeps every source frame.
    #[arg(long)]
    fps: Option<u32>,

    /// Fit the source aspect ratio inside the target dimensions.
    #[arg(long)]
    keep_aspect_ratio: bool,
}

#[derive(Args, Debug)]
struct SpacingArgs {
    /// Horizontal separation between pixel columns.
    #[arg(long, default_value_t = 1)]
    x_separation: i32,

    /// Vertical separation between pixel rows.
    #[arg(long, default_value_t = 1)]
    y_separation: i32,

    /// Separation between the R/G/B layers along z.
    #[arg(long, default_value_t = 2)]
    layer_separation: i32,
}

#[derive(Args, Debug)]
struct ThreadingArgs {
    /// Process frames on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (defaults to the rayon heuristic).
    #[arg(long)]
    threads: Option<usize>,
}

impl FrameArgs {
    fn into_config(self, bits: u8, spacing: VoxelSpacing, output_root: PathBuf) -> PipelineConfig {
        PipelineConfig {
            target_width: self.width,
            target_height: self.height,
            target_fps: self.fps,
            keep_aspect_ratio: self.keep_aspect_ratio,
            bits_per_channel: bits,
            spacing,
            output_root,
        }
    }
}

impl SpacingArgs {
    fn into_spacing(self) -> anyhow::Result<VoxelSpacing> {
        Ok(VoxelSpacing::new(
            self.x_separation,
            self.y_separation,
            self.layer_separation,
        )?)
    }
}

impl ThreadingArgs {
    fn into_threading(self) -> Threading {
        Threading {
            parallel: self.parallel,
            threads: self.threads,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Quantize(args) => cmd_quantize(args),
        Command::Voxelize(args) => cmd_voxelize(args),
        Command::Convert(args) => cmd_convert(args),
    }
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let cfg = args
        .frame
        .into_config(4, VoxelSpacing::default(), args.out);
    let layout = OutputLayout::create(&cfg.output_root)?;
    let stats = extract_frames(&args.in_path, &cfg, &layout)?;
    eprintln!(
        "extracted {} of {} decoded frames to {}",
        stats.frames_written,
        stats.frames_total,
        layout.frames_dir().display()
    );
    Ok(())
}

fn cmd_quantize(args: QuantizeArgs) -> anyhow::Result<()> {
    let layout = OutputLayout::create(&args.out)?;
    let stats = quantize_frames(
        &args.in_dir,
        args.bits,
        &layout,
        &args.threading.into_threading(),
    )?;
    report_pass("quantized", &stats, layout.quantized_dir());
    Ok(())
}

fn cmd_voxelize(args: VoxelizeArgs) -> anyhow::Result<()> {
    let layout = OutputLayout::create(&args.out)?;
    let stats = voxelize_frames(
        &args.in_dir,
        args.spacing.into_spacing()?,
        &layout,
        &args.threading.into_threading(),
    )?;
    report_pass("voxelized", &stats, layout.schematics_dir());
    Ok(())
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let spacing = args.spacing.into_spacing()?;
    let cfg = args.frame.into_config(args.bits, spacing, args.out);
    let threading = args.threading.into_threading();
    let ConvertStats {
        extract,
        quantize,
        voxelize,
    } = convert_video(&args.in_path, &cfg, &threading)?;
    eprintln!(
        "extracted {} of {} decoded frames",
        extract.frames_written, extract.frames_total
    );
    eprintln!(
        "quantized {} frames ({} skipped)",
        quantize.frames_written, quantize.frames_skipped
    );
    eprintln!(
        "wrote {} schematics ({} skipped) to {}",
        voxelize.frames_written,
        voxelize.frames_skipped,
        cfg.output_root.join("schematics").display()
    );
    Ok(())
}

fn report_pass(verb: &str, stats: &PassStats, dest: &std::path::Path) {
    eprintln!(
        "{verb} {} of {} frames ({} skipped) under {}",
        stats.frames_written,
        stats.frames_total,
        stats.frames_skipped,
        dest.display()
    );
}
