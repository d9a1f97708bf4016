use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::decode as assets_decode,
    foundation::{
        core::Size,
        error::{CollageError, CollageResult},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Build an image of one solid premultiplied color.
    pub fn solid(width: u32, height: u32, rgba8_premul: [u8; 4]) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul.repeat(width as usize * height as usize)),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Index of an image in [`ImageSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageId(pub u32);

/// Images referenced by a draw plan, loaded once each.
#[derive(Clone, Debug, Default)]
pub struct ImageSet {
    images: Vec<PreparedImage>,
    ids_by_path: HashMap<PathBuf, ImageId>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `path`, loading it on first use. `None` when loading fails.
    pub fn intern(&mut self, path: &Path, loader: &dyn ImageLoader) -> Option<ImageId> {
        if let Some(id) = self.ids_by_path.get(path) {
            return Some(*id);
        }
        let image = loader.load(path)?;
        let id = ImageId(self.images.len() as u32);
        self.images.push(image);
        self.ids_by_path.insert(path.to_path_buf(), id);
        Some(id)
    }

    pub fn get(&self, id: ImageId) -> CollageResult<&PreparedImage> {
        self.images
            .get(id.0 as usize)
            .ok_or_else(|| CollageError::backend(format!("unknown ImageId {}", id.0)))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Maps a resolved image location to decoded pixels.
///
/// Failures are reported as `None`; the planner degrades them to placeholders.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Option<PreparedImage>;
}

/// Reads and decodes images from the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Option<PreparedImage> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot read image");
                return None;
            }
        };
        match assets_decode::decode_image(&bytes) {
            Ok(img) => {
                tracing::debug!(path = %path.display(), img.width, img.height, "decoded image");
                Some(img)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot decode image");
                None
            }
        }
    }
}

/// Loader that never produces an image; every node renders as a placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullImageLoader;

impl ImageLoader for NullImageLoader {
    fn load(&self, _path: &Path) -> Option<PreparedImage> {
        None
    }
}

/// In-memory loader keyed by resolved path.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageLoader {
    images: HashMap<PathBuf, PreparedImage>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, image: PreparedImage) {
        self.images.insert(path.into(), image);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, image: PreparedImage) -> Self {
        self.insert(path, image);
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self, path: &Path) -> Option<PreparedImage> {
        self.images.get(path).cloned()
    }
}

impl<L: ImageLoader + ?Sized> ImageLoader for &L {
    fn load(&self, path: &Path) -> Option<PreparedImage> {
        (**self).load(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
