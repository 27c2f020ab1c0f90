use async_trait::async_trait;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use planref_core::traits::ImageStore;
use planref_core::{BBox, Error, Result};

/// Page images stored as files in one plan folder.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn crop(&self, filename: &str, bbox: BBox) -> Result<Vec<u8>> {
        let path = self.root.join(filename);
        if !path.is_file() {
            return Err(Error::UnknownFile(filename.to_string()));
        }
        tokio::task::spawn_blocking(move || crop_png(&path, bbox))
            .await
            .map_err(|e| Error::PermanentProvider(format!("crop task failed: {e}")))?
    }
}

fn crop_png(path: &Path, bbox: BBox) -> Result<Vec<u8>> {
    let img = image::open(path).map_err(image_error)?;
    let cropped = crop_clamped(&img, bbox)?;
    let mut buf = Vec::new();
    cropped.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).map_err(image_error)?;
    Ok(buf)
}

/// Crops to the part of `bbox` that lies on the image.
fn crop_clamped(img: &DynamicImage, bbox: BBox) -> Result<DynamicImage> {
    let clamp = |v: i32, limit: u32| u32::try_from(v.max(0)).unwrap_or(0).min(limit);
    let (x1, x2) = (clamp(bbox.left, img.width()), clamp(bbox.right, img.width()));
    let (y1, y2) = (clamp(bbox.top, img.height()), clamp(bbox.bottom, img.height()));
    if x2 <= x1 || y2 <= y1 {
        return Err(Error::PermanentProvider(format!(
            "crop region {bbox} is empty on a {}x{} image",
            img.width(),
            img.height()
        )));
    }
    Ok(img.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

fn image_error(e: ImageError) -> Error {
    match e {
        ImageError::IoError(io) => Error::Io(io),
        other => Error::PermanentProvider(other.to_string()),
    }
}
