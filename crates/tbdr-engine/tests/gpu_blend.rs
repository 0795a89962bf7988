//! End-to-end checks of every blend strategy against the CPU reference.
//!
//! These need a GPU adapter (a software one is fine). Without one they log
//! and return early.

use tbdr_engine::bench::{run_with_layers, BenchConfig, VERIFY_TOLERANCE};
use tbdr_engine::blend::{create_blender, BlendError, BlendStrategy};
use tbdr_engine::device::{Gpu, GpuInit};
use image::{Rgba, RgbaImage};
use tbdr_engine::layers::{GpuLayers, LayerError, LayerSet};
use tbdr_engine::render::{RenderCtx, Target};
use tbdr_engine::schedule::ScheduleMode;

fn gpu() -> Option<Gpu> {
    match Gpu::new_blocking(GpuInit::default()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn config(strategy: BlendStrategy, schedule: ScheduleMode) -> BenchConfig {
    BenchConfig {
        width: 64,
        height: 32,
        layer_count: 6,
        frames: 3,
        strategy,
        schedule,
        max_frames_in_flight: 2,
        verify: true,
        ..Default::default()
    }
}

#[test]
fn every_strategy_matches_reference() {
    let Some(gpu) = gpu() else { return };
    let layers = LayerSet::generate(64, 32, 6).unwrap();

    for strategy in BlendStrategy::ALL {
        let report =
            run_with_layers(&gpu, &config(strategy, ScheduleMode::Unconstrained), &layers)
                .unwrap();
        let diff = report.diff.expect("verification requested");
        assert!(
            diff.within(VERIFY_TOLERANCE),
            "{strategy}: {diff:?} exceeds tolerance"
        );
        assert_eq!(
            report.calls_per_frame as usize,
            strategy.calls_per_frame(layers.len()),
            "{strategy}"
        );
        assert_eq!(report.stats.count(), 3);
    }
}

#[test]
fn serial_schedule_and_two_layers() {
    let Some(gpu) = gpu() else { return };
    let layers = LayerSet::generate(16, 16, 2).unwrap();

    for strategy in BlendStrategy::ALL {
        let mut cfg = config(strategy, ScheduleMode::Serial);
        cfg.width = 16;
        cfg.height = 16;
        cfg.layer_count = 2;
        let report = run_with_layers(&gpu, &cfg, &layers).unwrap();
        assert!(report.diff.unwrap().within(VERIFY_TOLERANCE), "{strategy}");
    }
}

#[test]
fn mismatched_output_is_rejected() {
    let Some(gpu) = gpu() else { return };
    let ctx = RenderCtx::new(gpu.device(), gpu.queue());
    let layers = GpuLayers::upload(
        gpu.device(),
        gpu.queue(),
        &LayerSet::generate(32, 16, 3).unwrap(),
    )
    .unwrap();
    let wrong = Target::output(gpu.device(), "wrong size", 16, 16);

    for strategy in BlendStrategy::ALL {
        let mut blender = create_blender(strategy, &ctx, &layers).unwrap();
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        let err = blender.encode(&ctx, &mut encoder, &wrong).unwrap_err();
        assert!(matches!(err, BlendError::OutputSizeMismatch { .. }));
    }
}

#[test]
fn tiled_strategy_needs_even_size() {
    let Some(gpu) = gpu() else { return };
    let ctx = RenderCtx::new(gpu.device(), gpu.queue());
    let layers = GpuLayers::upload(
        gpu.device(),
        gpu.queue(),
        &LayerSet::generate(33, 16, 3).unwrap(),
    )
    .unwrap();
    let result = create_blender(BlendStrategy::ComputeTiled, &ctx, &layers);
    assert!(matches!(result, Err(BlendError::Tile(_))));
}

#[test]
fn layer_zero_reaches_the_output_unchanged() {
    let Some(gpu) = gpu() else { return };
    // Bottom layer opaque red, top layer fully transparent.
    let red = RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]));
    let clear = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
    let layers = LayerSet::from_images(vec![red, clear]).unwrap();

    for strategy in BlendStrategy::ALL {
        let mut cfg = config(strategy, ScheduleMode::Serial);
        cfg.width = 16;
        cfg.height = 16;
        cfg.layer_count = 2;
        cfg.frames = 1;
        let diff = run_with_layers(&gpu, &cfg, &layers).unwrap().diff.unwrap();
        assert_eq!(diff.mismatched_pixels, 0, "{strategy}: {diff:?}");
    }
}

#[test]
fn oversized_layers_are_rejected_before_upload() {
    let Some(gpu) = gpu() else { return };
    let limit = gpu.device().limits().max_texture_dimension_2d;
    let wide = LayerSet::from_images(vec![RgbaImage::new(limit + 1, 1)]).unwrap();

    let err = GpuLayers::upload(gpu.device(), gpu.queue(), &wide).unwrap_err();
    assert!(matches!(err, LayerError::TooLarge { width, .. } if width == limit + 1));
}

#[test]
fn array_limit_only_affects_monolithic_strategy() {
    let Some(gpu) = gpu() else { return };
    let limit = gpu.device().limits().max_texture_array_layers as usize;
    let images = vec![RgbaImage::new(2, 2); limit + 1];
    let layers = GpuLayers::upload(
        gpu.device(),
        gpu.queue(),
        &LayerSet::from_images(images).unwrap(),
    )
    .unwrap();
    let ctx = RenderCtx::new(gpu.device(), gpu.queue());

    let result = create_blender(BlendStrategy::ComputeMonolithic, &ctx, &layers);
    assert!(matches!(
        result,
        Err(BlendError::Layers(LayerError::TooManyLayers { count, .. })) if count == limit + 1
    ));
    assert!(create_blender(BlendStrategy::Compute, &ctx, &layers).is_ok());
}
