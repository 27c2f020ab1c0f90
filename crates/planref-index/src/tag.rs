use tracing::debug;

use planref_core::types::DetailRef;
use planref_core::{BBox, Error, Result};

use crate::page_index::PageIndex;
use crate::page_number::PageNumberTable;

/// Reads a detail tag: exactly two fragments, one of them a known page number.
///
/// The physical order of the fragments does not matter; the one found in
/// `page_numbers` is the page reference and the other is the detail number.
pub fn resolve_tag(page: &PageIndex, tag_bbox: &BBox, page_numbers: &PageNumberTable) -> Result<DetailRef> {
    let fragments = page.text_in_bbox(tag_bbox);
    let [first, second] = fragments.as_slice() else {
        debug!(page = %page.filename(), %tag_bbox, found = fragments.len(), "malformed detail tag");
        return Err(Error::MalformedTag { found: fragments.len() });
    };
    let (page_num, detail_num) = match (page_numbers.contains(&first.text), page_numbers.contains(&second.text)) {
        (true, false) => (first, second),
        (false, true) => (second, first),
        _ => {
            return Err(Error::IndeterminateTagRoles { first: first.text.clone(), second: second.text.clone() });
        }
    };
    Ok(DetailRef { page_num: page_num.text.clone(), detail_num: detail_num.text.clone() })
}
