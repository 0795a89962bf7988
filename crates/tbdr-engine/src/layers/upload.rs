use super::{LayerError, LayerSet};

/// Layers resident on the GPU, one `Rgba8UnormSrgb` 2D texture each.
///
/// Strategies that need every layer behind one binding build a
/// [`LayerArray`] from these with [`GpuLayers::to_array`].
#[derive(Clone, Debug)]
pub struct GpuLayers {
    textures: Vec<wgpu::Texture>,
    views: Vec<wgpu::TextureView>,
    width: u32,
    height: u32,
}

/// All layers copied into a single 2D array texture.
pub struct LayerArray {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuLayers {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Uploads every layer as its own texture.
    ///
    /// Fails without touching the device when the layer size exceeds
    /// `max_texture_dimension_2d`.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layers: &LayerSet,
    ) -> Result<Self, LayerError> {
        let (width, height) = (layers.width(), layers.height());
        check_dimensions(width, height, device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let textures: Vec<wgpu::Texture> = layers
            .images()
            .iter()
            .enumerate()
            .map(|(i, img)| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("tbdr layer #{i}")),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: Self::FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                queue.write_texture(
                    texture.as_image_copy(),
                    img.as_raw(),
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(width * 4),
                        rows_per_image: Some(height),
                    },
                    size,
                );
                texture
            })
            .collect();

        let views = textures
            .iter()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
            .collect();

        log::debug!("uploaded {} layers ({width}x{height})", textures.len());

        Ok(Self {
            textures,
            views,
            width,
            height,
        })
    }

    /// Copies the layers into one array texture, layer `i` at array index `i`.
    ///
    /// Fails without touching the device when there are more layers than
    /// `max_texture_array_layers`.
    pub fn to_array(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<LayerArray, LayerError> {
        let count = self.textures.len();
        check_array_layers(count, device.limits().max_texture_array_layers)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tbdr layer array"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: count as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tbdr layer array copy"),
        });
        for (i, layer) in self.textures.iter().enumerate() {
            encoder.copy_texture_to_texture(
                layer.as_image_copy(),
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: i as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                layer.size(),
            );
        }
        queue.submit(std::iter::once(encoder.finish()));

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("tbdr layer array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        Ok(LayerArray { texture, view })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layer_view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }
}

impl LayerArray {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn layer_count(&self) -> u32 {
        self.texture.depth_or_array_layers()
    }
}

fn check_dimensions(width: u32, height: u32, limit: u32) -> Result<(), LayerError> {
    if width > limit || height > limit {
        return Err(LayerError::TooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

fn check_array_layers(count: usize, limit: u32) -> Result<(), LayerError> {
    if count > limit as usize {
        return Err(LayerError::TooManyLayers { count, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_up_to_limit_pass() {
        assert!(check_dimensions(8192, 8192, 8192).is_ok());
        assert!(check_dimensions(1, 1, 8192).is_ok());
    }

    #[test]
    fn either_axis_over_limit_fails() {
        for (w, h) in [(8193, 1), (1, 8193)] {
            match check_dimensions(w, h, 8192) {
                Err(LayerError::TooLarge {
                    width,
                    height,
                    limit,
                }) => assert_eq!((width, height, limit), (w, h, 8192)),
                other => panic!("unexpected result for {w}x{h}: {other:?}"),
            }
        }
    }

    #[test]
    fn array_layer_limit_is_inclusive() {
        assert!(check_array_layers(256, 256).is_ok());
        assert!(matches!(
            check_array_layers(257, 256),
            Err(LayerError::TooManyLayers {
                count: 257,
                limit: 256
            })
        ));
    }
}
