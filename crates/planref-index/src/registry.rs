//! Curated detail-graphic locations.
//!
//! Each page keeps an ordered list of `(graphic, number)` rectangles added by
//! explicit registration. Lookups scan that list in registration order and the
//! first entry whose number region reads the wanted detail number wins. Every
//! page has its own lock, so registering on one page never blocks lookups on
//! another, while append and scan on the same page are serialized.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use planref_core::types::DetailRef;
use planref_core::{BBox, Error, Result};

use crate::page_index::PageIndex;

/// A detail graphic and the rectangle where its number label appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailGraphic {
    pub graphic: BBox,
    pub number: BBox,
}

#[derive(Debug, Default)]
pub struct DetailGraphicRegistry {
    pages: HashMap<String, Mutex<Vec<DetailGraphic>>>,
}

impl DetailGraphicRegistry {
    pub fn new<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = filenames.into_iter().map(|f| (f.into(), Mutex::new(Vec::new()))).collect();
        Self { pages }
    }

    fn page(&self, filename: &str) -> Result<MutexGuard<'_, Vec<DetailGraphic>>> {
        let slot = self.pages.get(filename).ok_or_else(|| Error::UnknownFile(filename.to_string()))?;
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Appends without checking overlap against earlier entries.
    pub fn register(&self, filename: &str, entry: DetailGraphic) -> Result<()> {
        self.page(filename)?.push(entry);
        debug!(page = %filename, graphic = %entry.graphic, number = %entry.number, "registered detail graphic");
        Ok(())
    }

    pub fn entries(&self, filename: &str) -> Result<Vec<DetailGraphic>> { Ok(self.page(filename)?.clone()) }

    /// The graphic on `page` whose number region holds exactly `detail.detail_num`.
    pub fn find(&self, page: &PageIndex, detail: &DetailRef) -> Result<BBox> {
        let entries = self.page(page.filename())?;
        if entries.is_empty() {
            return Err(Error::NoRegistry(page.filename().to_string()));
        }
        for entry in entries.iter() {
            let labels = page.text_in_bbox(&entry.number);
            match labels.as_slice() {
                [] => {}
                [label] if label.text == detail.detail_num => return Ok(entry.graphic),
                [_] => {}
                many => {
                    return Err(Error::AmbiguousNumber { filename: page.filename().to_string(), found: many.len() });
                }
            }
        }
        Err(Error::GraphicNotFound { page_num: detail.page_num.clone(), detail_num: detail.detail_num.clone() })
    }

    /// Non-empty registrations by filename, in registration order.
    pub fn export(&self) -> BTreeMap<String, Vec<DetailGraphic>> {
        self.pages
            .iter()
            .map(|(f, slot)| (f.clone(), slot.lock().unwrap_or_else(PoisonError::into_inner).clone()))
            .filter(|(_, entries)| !entries.is_empty())
            .collect()
    }
}
