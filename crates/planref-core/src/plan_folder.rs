//! Discovery of page images inside a plan folder.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One rasterized plan page on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// File name inside the plan folder; the key every index uses for the page.
    pub filename: String,
    pub path: PathBuf,
}

impl PageImage {
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = page_key(path)?;
        Ok(Self { filename, path: path.to_path_buf() })
    }
}

/// The page key for an image path: its file name.
pub fn page_key(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::UnknownFile(path.display().to_string()))
}

/// Every `.png` directly inside `plan_dir`, sorted by file name.
pub fn list_page_images(plan_dir: &Path) -> Result<Vec<PageImage>> {
    if !plan_dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("plan folder {} does not exist", plan_dir.display()),
        )));
    }
    let mut pages = Vec::new();
    for entry in walkdir::WalkDir::new(plan_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("png") {
            pages.push(PageImage::from_path(path)?);
        }
    }
    pages.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(pages)
}
