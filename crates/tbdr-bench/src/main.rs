use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tbdr_engine::bench::{self, BenchConfig, BenchReport, VERIFY_TOLERANCE};
use tbdr_engine::blend::BlendStrategy;
use tbdr_engine::device::{Gpu, GpuInit};
use tbdr_engine::logging::{init_logging, LoggingConfig};
use tbdr_engine::schedule::ScheduleMode;

/// Composite a stack of image layers on the GPU with different pass layouts
/// and report frame times.
#[derive(Debug, Parser)]
#[command(name = "tbdr-bench", version)]
struct Args {
    /// Blend strategy: render, compute, compute-tiled, compute-monolithic.
    #[arg(long, default_value = "compute-tiled")]
    strategy: BlendStrategy,

    /// Run every strategy in turn (overrides --strategy).
    #[arg(long)]
    all: bool,

    /// Frames to measure (after one warm-up frame).
    #[arg(long, default_value_t = 60)]
    frames: usize,

    #[arg(long, default_value_t = 4000)]
    width: u32,

    #[arg(long, default_value_t = 2000)]
    height: u32,

    /// Number of layers to composite.
    #[arg(long, default_value_t = 50)]
    layers: usize,

    /// Load block_{i}.png layers from this directory instead of generating them.
    #[arg(long)]
    layers_dir: Option<PathBuf>,

    /// Write the generated layers as block_{i}.png into this directory and exit.
    #[arg(long)]
    save_layers: Option<PathBuf>,

    /// Wait for each frame to finish before encoding the next.
    #[arg(long)]
    serial: bool,

    /// Output targets in rotation (2 or 3 behaves like a drawable pool).
    #[arg(long, default_value_t = 2)]
    max_frames_in_flight: usize,

    /// Write the last frame as PNG. With --all, the strategy name is appended.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Compare the last frame with the CPU reference compositor.
    #[arg(long)]
    verify: bool,

    /// Use the software fallback adapter.
    #[arg(long)]
    fallback_adapter: bool,

    /// Log filter (env_logger syntax); defaults to RUST_LOG or info.
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn config(&self, strategy: BlendStrategy) -> BenchConfig {
        let output_png = self.output.as_ref().map(|path| {
            if self.all {
                suffixed(path, strategy.name())
            } else {
                path.clone()
            }
        });

        BenchConfig {
            width: self.width,
            height: self.height,
            layer_count: self.layers,
            frames: self.frames,
            strategy,
            schedule: if self.serial {
                ScheduleMode::Serial
            } else {
                ScheduleMode::Unconstrained
            },
            max_frames_in_flight: self.max_frames_in_flight,
            layers_dir: self.layers_dir.clone(),
            output_png,
            verify: self.verify,
        }
    }
}

/// `out.png` + `compute` -> `out-compute.png`.
fn suffixed(path: &std::path::Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    path.with_file_name(name)
}

fn print_report(report: &BenchReport) {
    let verdict = match report.diff {
        Some(diff) if diff.within(VERIFY_TOLERANCE) => "ok".to_string(),
        Some(diff) => format!("MISMATCH (max delta {})", diff.max_channel_delta),
        None => "-".to_string(),
    };
    println!(
        "  {:<42} {:>9.2?} {:>9.2?} {:>9.2?} {:>8.1} {:>6}  {}",
        report.strategy.label(),
        report.stats.mean(),
        report.stats.min(),
        report.stats.max(),
        report.stats.fps(),
        report.calls_per_frame,
        verdict
    );
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.as_str()),
        None => LoggingConfig::default(),
    });

    if let Some(dir) = &args.save_layers {
        let layers = bench::load_layers(&args.config(args.strategy))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        layers.save_dir(dir)?;
        log::info!("saved {} layers to {}", layers.len(), dir.display());
        return Ok(());
    }

    let gpu = Gpu::new_blocking(GpuInit {
        force_fallback_adapter: args.fallback_adapter,
        ..Default::default()
    })?;

    let strategies: Vec<BlendStrategy> = if args.all {
        BlendStrategy::ALL.to_vec()
    } else {
        vec![args.strategy]
    };

    // Layers are shared by every strategy of one invocation.
    let layers = bench::load_layers(&args.config(args.strategy))?;

    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        reports.push(bench::run_with_layers(&gpu, &args.config(strategy), &layers)?);
    }

    let info = gpu.adapter_info();
    println!();
    println!(
        "  {} layers, {}x{}, {} frames, {} on {} ({:?})",
        layers.len(),
        layers.width(),
        layers.height(),
        args.frames,
        args.config(args.strategy).schedule,
        info.name,
        info.backend
    );
    println!(
        "  {:<42} {:>9} {:>9} {:>9} {:>8} {:>6}  verify",
        "strategy", "mean", "min", "max", "fps", "calls"
    );
    for report in &reports {
        print_report(report);
    }
    println!();

    let failed = reports
        .iter()
        .filter(|r| r.diff.is_some_and(|d| !d.within(VERIFY_TOLERANCE)))
        .count();
    anyhow::ensure!(failed == 0, "{failed} strategies did not match the CPU reference");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_keeps_extension() {
        assert_eq!(
            suffixed(std::path::Path::new("out/frame.png"), "render"),
            PathBuf::from("out/frame-render.png")
        );
        assert_eq!(
            suffixed(std::path::Path::new("frame"), "compute"),
            PathBuf::from("frame-compute")
        );
    }

    #[test]
    fn parses_strategy_and_flags() {
        let args = Args::parse_from([
            "tbdr-bench",
            "--strategy",
            "render",
            "--serial",
            "--frames",
            "3",
        ]);
        let config = args.config(args.strategy);
        assert_eq!(config.strategy, BlendStrategy::Render);
        assert_eq!(config.schedule, ScheduleMode::Serial);
        assert_eq!(config.frames, 3);
        assert_eq!(config.layer_count, 50);
    }

    #[test]
    fn rejects_unknown_strategy() {
        assert!(Args::try_parse_from(["tbdr-bench", "--strategy", "nope"]).is_err());
    }
}
