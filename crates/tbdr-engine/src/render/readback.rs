use anyhow::{Context, Result};
use image::RgbaImage;

use super::{Target, OUTPUT_FORMAT};

/// Copies an `Rgba8Unorm` target back to the CPU.
///
/// Blocks until the copy has completed.
pub fn read_rgba8(device: &wgpu::Device, queue: &wgpu::Queue, target: &Target) -> Result<RgbaImage> {
    anyhow::ensure!(
        target.texture().format() == OUTPUT_FORMAT,
        "readback expects {OUTPUT_FORMAT:?}, got {:?}",
        target.texture().format()
    );

    let (width, height) = target.size();
    let row_bytes = width * 4;
    let bytes_per_row = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("tbdr readback buffer"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("tbdr readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: target.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = std::sync::mpsc::channel();
    buffer
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("device poll failed during readback")?;
    rx.recv()
        .context("readback callback was dropped")?
        .context("failed to map readback buffer")?;

    let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
    {
        let mapped = buffer.slice(..).get_mapped_range();
        for row in mapped.chunks_exact(bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..row_bytes as usize]);
        }
    }
    buffer.unmap();

    RgbaImage::from_raw(width, height, pixels).context("readback produced a short image")
}
