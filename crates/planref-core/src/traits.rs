use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{BBox, TextBox};

/// Recognizes text on a page image.
///
/// Implementations report network or service faults as
/// [`Error::TransientProvider`](crate::Error::TransientProvider) and bad input
/// as [`Error::PermanentProvider`](crate::Error::PermanentProvider).
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Stable identifier for the provider (e.g. `azure:v3.2`).
    fn provider_id(&self) -> &str;
    /// Text fragments on the page, in the order the provider reported them.
    async fn recognize(&self, page_image: &Path) -> Result<Vec<TextBox>>;
}

/// Serves page images by filename and crops regions out of them.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// PNG-encoded pixels of `bbox` on the page image `filename`.
    async fn crop(&self, filename: &str, bbox: BBox) -> Result<Vec<u8>>;
}

/// Splits a PDF into one image per page.
pub trait PdfRasterizer: Send + Sync {
    /// Page image paths, in page order.
    fn rasterize(&self, pdf_path: &Path, output_dir: &Path, target_long_edge_px: u32) -> Result<Vec<PathBuf>>;
}
