use anyhow::{Context, Result};
use image::RgbaImage;

use crate::blend::{create_blender, BlendStrategy};
use crate::device::Gpu;
use crate::layers::{GpuLayers, LayerSet};
use crate::reference::{self, ImageDiff};
use crate::render::{read_rgba8, OutputRing, RenderCtx};
use crate::schedule::{CommandScheduler, ScheduleMode};
use crate::time::{FrameClock, FrameStats};

use super::BenchConfig;

/// Result of one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub strategy: BlendStrategy,
    pub schedule: ScheduleMode,
    pub frames: usize,
    pub calls_per_frame: u32,
    pub stats: FrameStats,
    /// Present when verification was requested.
    pub diff: Option<ImageDiff>,
}

/// Maximum per-channel difference tolerated against the CPU reference.
///
/// Intermediates are f16, so partially transparent inputs may drift by a
/// code value after sRGB encoding.
pub const VERIFY_TOLERANCE: u8 = 2;

/// Loads or generates the configured layers.
pub fn load_layers(config: &BenchConfig) -> Result<LayerSet> {
    match &config.layers_dir {
        Some(dir) => LayerSet::load_dir(dir, config.layer_count)
            .with_context(|| format!("failed to load layers from {}", dir.display())),
        None => LayerSet::generate(config.width, config.height, config.layer_count)
            .context("failed to generate layers"),
    }
}

/// Runs `config.strategy` against already built layers.
pub fn run_with_layers(gpu: &Gpu, config: &BenchConfig, layers: &LayerSet) -> Result<BenchReport> {
    let device = gpu.device();
    let queue = gpu.queue();
    let ctx = RenderCtx::new(device, queue);

    let gpu_layers =
        GpuLayers::upload(device, queue, layers).context("failed to upload layers")?;
    let mut blender = create_blender(config.strategy, &ctx, &gpu_layers)
        .with_context(|| format!("failed to build {} blender", config.strategy))?;
    let mut outputs = OutputRing::new(
        device,
        layers.width(),
        layers.height(),
        config.max_frames_in_flight,
    );
    let mut scheduler = CommandScheduler::new(config.schedule, config.max_frames_in_flight);

    log::info!(
        "{}: {} layers of {}x{}, {} frames, {} scheduling",
        config.strategy.label(),
        layers.len(),
        layers.width(),
        layers.height(),
        config.frames,
        config.schedule
    );

    // Warm-up: pipeline compilation and first-use costs stay out of the stats.
    let mut calls_per_frame = 0;
    let mut clock = FrameClock::new();
    let mut stats = FrameStats::with_capacity(config.frames);

    for frame in 0..=config.frames {
        scheduler.begin_frame(device)?;
        let output = outputs.acquire();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tbdr frame encoder"),
        });
        calls_per_frame = blender.encode(&ctx, &mut encoder, output)?;
        scheduler.submit(queue, encoder.finish());

        if frame == 0 {
            scheduler.finish(device)?;
            clock.reset();
            continue;
        }

        let time = clock.tick();
        log::trace!("frame {} took {:?}", time.frame_index, time.dt);
        stats.record(time);
    }
    scheduler.finish(device)?;

    log::info!(
        "{}: mean {:.2?} (min {:.2?}, max {:.2?}), {:.1} fps, {} calls/frame",
        config.strategy,
        stats.mean(),
        stats.min(),
        stats.max(),
        stats.fps(),
        calls_per_frame
    );

    let needs_readback = config.verify || config.output_png.is_some();
    let last: Option<RgbaImage> = if needs_readback {
        Some(read_rgba8(device, queue, outputs.last())?)
    } else {
        None
    };

    if let (Some(path), Some(img)) = (&config.output_png, &last) {
        img.save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    let diff = match (&last, config.verify) {
        (Some(img), true) => {
            let expected = reference::composite(layers)?;
            let diff = reference::compare(&expected, img)
                .context("GPU output and reference differ in size")?;
            if diff.within(VERIFY_TOLERANCE) {
                log::info!("verification passed ({diff:?})");
            } else {
                log::warn!("verification failed ({diff:?})");
            }
            Some(diff)
        }
        _ => None,
    };

    Ok(BenchReport {
        strategy: config.strategy,
        schedule: config.schedule,
        frames: config.frames,
        calls_per_frame,
        stats,
        diff,
    })
}

/// Builds layers from `config` and runs the configured strategy.
pub fn run(gpu: &Gpu, config: &BenchConfig) -> Result<BenchReport> {
    let layers = load_layers(config)?;
    run_with_layers(gpu, config, &layers)
}
