use std::path::{Path, PathBuf};

use super::{LayerError, LayerSet};

fn layer_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("block_{index}.png"))
}

impl LayerSet {
    /// Loads `block_0.png` .. `block_{count-1}.png` from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, count: usize) -> Result<Self, LayerError> {
        let dir = dir.as_ref();
        let images = (0..count)
            .map(|i| {
                let path = layer_path(dir, i);
                image::open(&path)
                    .map(|img| img.into_rgba8())
                    .map_err(|source| LayerError::Image { path, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("loaded {} layers from {}", images.len(), dir.display());
        LayerSet::from_images(images)
    }

    /// Writes every layer as `block_{i}.png` into `dir`.
    pub fn save_dir(&self, dir: impl AsRef<Path>) -> Result<(), LayerError> {
        let dir = dir.as_ref();
        for (i, img) in self.images.iter().enumerate() {
            let path = layer_path(dir, i);
            img.save(&path)
                .map_err(|source| LayerError::Image { path, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let set = LayerSet::generate(16, 8, 3).unwrap();
        set.save_dir(dir.path()).unwrap();

        let loaded = LayerSet::load_dir(dir.path(), 3).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.images(), set.images());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = LayerSet::load_dir(dir.path(), 1).unwrap_err();
        match err {
            LayerError::Image { path, .. } => assert!(path.ends_with("block_0.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let a = image::RgbaImage::new(4, 4);
        let b = image::RgbaImage::new(4, 2);
        let err = LayerSet::from_images(vec![a, b]).unwrap_err();
        assert!(matches!(err, LayerError::SizeMismatch { index: 1, .. }));
    }
}
