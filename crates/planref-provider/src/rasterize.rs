use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use planref_core::plan_folder::list_page_images;
use planref_core::traits::PdfRasterizer;
use planref_core::{Error, Result};

const PAGE_PREFIX: &str = "page";

/// Rasterizes with poppler's `pdftoppm`, one PNG per page.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
}

impl Default for Pdftoppm {
    fn default() -> Self { Self::new("pdftoppm") }
}

impl Pdftoppm {
    pub fn new(binary: impl Into<PathBuf>) -> Self { Self { binary: binary.into() } }
}

impl PdfRasterizer for Pdftoppm {
    fn rasterize(&self, pdf_path: &Path, output_dir: &Path, target_long_edge_px: u32) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;
        let status = Command::new(&self.binary)
            .arg(pdf_path)
            .arg(output_dir.join(PAGE_PREFIX))
            .args(["-png", "-scale-to"])
            .arg(target_long_edge_px.to_string())
            .status()?;
        if !status.success() {
            return Err(Error::PermanentProvider(format!(
                "{} exited with {status} for {}",
                self.binary.display(),
                pdf_path.display()
            )));
        }
        // pdftoppm zero-pads page numbers, so name order is page order.
        let pages: Vec<PathBuf> = list_page_images(output_dir)?
            .into_iter()
            .filter(|p| p.filename.starts_with(&format!("{PAGE_PREFIX}-")))
            .map(|p| p.path)
            .collect();
        info!(pdf = %pdf_path.display(), pages = pages.len(), "rasterized");
        Ok(pages)
    }
}
