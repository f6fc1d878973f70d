use std::fs;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{DatasetError, Result};
use crate::geometry::{ImageBounds, Rect};

/// Imaging backend used by the dataset builder.
///
/// Regions passed to `write_patch` are already clamped to the image.
pub trait ImageStore {
    type Image;

    fn load(&self, path: &Path) -> Result<Self::Image>;

    fn bounds(&self, image: &Self::Image) -> ImageBounds;

    /// Crop `region`, resize it to `size` (`[width, height]`) and persist it at `dest`.
    fn write_patch(&self, image: &Self::Image, region: Rect, size: [u32; 2], dest: &Path) -> Result<()>;

    fn prepare_dir(&self, dir: &Path) -> Result<()>;
}

/// Filesystem store backed by the `image` crate. Patches are written as
/// 3-channel JPEG.
#[derive(Debug, Clone, Copy)]
pub struct FsImageStore {
    pub filter: FilterType,
}

impl Default for FsImageStore {
    fn default() -> Self {
        Self { filter: FilterType::Triangle }
    }
}

impl ImageStore for FsImageStore {
    type Image = DynamicImage;

    fn load(&self, path: &Path) -> Result<DynamicImage> {
        image::open(path).map_err(|source| DatasetError::Decode { path: path.to_path_buf(), source })
    }

    fn bounds(&self, image: &DynamicImage) -> ImageBounds {
        let (width, height) = image.dimensions();
        ImageBounds { width, height }
    }

    fn write_patch(&self, image: &DynamicImage, region: Rect, size: [u32; 2], dest: &Path) -> Result<()> {
        let x = u32::try_from(region.xmin).unwrap_or(0);
        let y = u32::try_from(region.ymin).unwrap_or(0);
        let w = u32::try_from(region.width()).unwrap_or(0);
        let h = u32::try_from(region.height()).unwrap_or(0);

        let patch = image.crop_imm(x, y, w, h);
        let resized = patch.resize_exact(size[0], size[1], self.filter);
        // jpeg has no alpha channel
        let rgb = resized.to_rgb8();
        rgb.save_with_format(dest, ImageFormat::Jpeg)
            .map_err(|source| DatasetError::Encode { path: dest.to_path_buf(), source })
    }

    fn prepare_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| DatasetError::io(dir, e))
    }
}
