use std::collections::BTreeMap;
use tracing::info;

use planref_core::types::{DetailRef, GraphicLocation};
use planref_core::{BBox, Error, Result, TextBox};

use crate::page_index::PageIndex;
use crate::page_number::{derive_page_numbers, page_number_of, PageNumberTable};
use crate::registry::{DetailGraphic, DetailGraphicRegistry};
use crate::snapshot::{GraphicRegistrations, PlanSnapshot};
use crate::tag::resolve_tag;

/// Text, page numbers and detail graphics of one multi-page plan.
///
/// Page indices and the page-number table are fixed at construction, so every
/// query sees a fully ingested plan. Only the graphic registry grows afterwards.
#[derive(Debug)]
pub struct PlanIndex {
    pages: BTreeMap<String, PageIndex>,
    page_numbers: PageNumberTable,
    page_number_region: BBox,
    graphics: DetailGraphicRegistry,
}

impl PlanIndex {
    pub fn build<I, S>(pages: I, page_number_region: BBox) -> Self
    where
        I: IntoIterator<Item = (S, Vec<TextBox>)>,
        S: Into<String>,
    {
        let pages: BTreeMap<String, PageIndex> = pages
            .into_iter()
            .map(|(filename, boxes)| {
                let filename = filename.into();
                (filename.clone(), PageIndex::new(filename, boxes))
            })
            .collect();
        let page_numbers = derive_page_numbers(pages.values(), &page_number_region);
        let graphics = DetailGraphicRegistry::new(pages.keys().cloned());
        info!(pages = pages.len(), page_number_keys = page_numbers.len(), "plan index built");
        Self { pages, page_numbers, page_number_region, graphics }
    }

    pub fn from_snapshot(snapshot: &PlanSnapshot, page_number_region: BBox) -> Self {
        Self::build(snapshot.pages.iter().map(|(f, boxes)| (f.clone(), boxes.clone())), page_number_region)
    }

    pub fn to_snapshot(&self) -> PlanSnapshot {
        let pages = self.pages.iter().map(|(f, page)| (f.clone(), page.boxes().to_vec())).collect();
        PlanSnapshot { pages }
    }

    pub fn list_pages(&self) -> Vec<&str> { self.pages.keys().map(String::as_str).collect() }

    pub fn page(&self, filename: &str) -> Result<&PageIndex> {
        self.pages.get(filename).ok_or_else(|| Error::UnknownFile(filename.to_string()))
    }

    pub fn page_numbers(&self) -> &PageNumberTable { &self.page_numbers }

    pub fn text_in_bbox(&self, filename: &str, bbox: &BBox) -> Result<Vec<&TextBox>> {
        Ok(self.page(filename)?.text_in_bbox(bbox))
    }

    /// The label chosen from the page-number region of `filename`.
    pub fn page_number_of(&self, filename: &str) -> Result<Option<&str>> {
        Ok(page_number_of(self.page(filename)?, &self.page_number_region).map(|t| t.text.as_str()))
    }

    pub fn filename_for_page(&self, page_num: &str) -> Result<&str> {
        self.page_numbers
            .filename_for(page_num)
            .ok_or_else(|| Error::UnknownPage(page_num.to_string()))
    }

    pub fn resolve_tag(&self, filename: &str, tag_bbox: &BBox) -> Result<DetailRef> {
        resolve_tag(self.page(filename)?, tag_bbox, &self.page_numbers)
    }

    pub fn register_graphic(&self, filename: &str, graphic: BBox, number: BBox) -> Result<()> {
        self.graphics.register(filename, DetailGraphic { graphic, number })
    }

    pub fn graphics_on(&self, filename: &str) -> Result<Vec<DetailGraphic>> { self.graphics.entries(filename) }

    /// Re-applies saved registrations in their original order.
    pub fn apply_registrations(&self, saved: &GraphicRegistrations) -> Result<()> {
        for (filename, entries) in &saved.pages {
            for entry in entries {
                self.graphics.register(filename, *entry)?;
            }
        }
        Ok(())
    }

    pub fn registrations(&self) -> GraphicRegistrations { GraphicRegistrations { pages: self.graphics.export() } }

    pub fn graphic_bbox(&self, detail: &DetailRef) -> Result<GraphicLocation> {
        let filename = self.filename_for_page(&detail.page_num)?;
        let page = self.page(filename)?;
        let bbox = self.graphics.find(page, detail)?;
        Ok(GraphicLocation { filename: filename.to_string(), bbox })
    }

    /// Tag on `filename` -> referenced page -> registered graphic.
    pub fn locate_graphic_for_tag(&self, filename: &str, tag_bbox: &BBox) -> Result<GraphicLocation> {
        let detail = self.resolve_tag(filename, tag_bbox)?;
        self.graphic_bbox(&detail)
    }
}
