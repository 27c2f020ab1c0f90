use tracing::debug;

use planref_core::traits::ImageStore;
use planref_core::types::{DetailRef, GraphicLocation};
use planref_core::{BBox, Result, TextBox};
use planref_index::PlanIndex;

/// A detail graphic cut out of its page.
#[derive(Debug, Clone)]
pub struct CroppedGraphic {
    pub location: GraphicLocation,
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
}

/// Query surface for front ends: the plan index plus the page images behind it.
pub struct PlanService<S> {
    index: PlanIndex,
    store: S,
}

impl<S: ImageStore> PlanService<S> {
    pub fn new(index: PlanIndex, store: S) -> Self { Self { index, store } }

    pub fn index(&self) -> &PlanIndex { &self.index }

    pub fn store(&self) -> &S { &self.store }

    pub fn list_pages(&self) -> Vec<&str> { self.index.list_pages() }

    pub fn text_in_bbox(&self, filename: &str, bbox: &BBox) -> Result<Vec<&TextBox>> { self.index.text_in_bbox(filename, bbox) }

    pub fn resolve_tag(&self, filename: &str, tag_bbox: &BBox) -> Result<DetailRef> { self.index.resolve_tag(filename, tag_bbox) }

    /// Resolves the tag, finds the registered graphic, and crops it from its page.
    pub async fn graphic_for_tag(&self, filename: &str, tag_bbox: &BBox) -> Result<CroppedGraphic> {
        let location = self.index.locate_graphic_for_tag(filename, tag_bbox)?;
        debug!(tag_page = %filename, graphic_page = %location.filename, bbox = %location.bbox, "cropping detail graphic");
        let png = self.store.crop(&location.filename, location.bbox).await?;
        Ok(CroppedGraphic { location, png })
    }
}
