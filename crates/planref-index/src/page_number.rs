//! Page-number recognition, ranking and normalization.
//!
//! Every page carries its own label in the same fixed region. Text in that
//! region is filtered against the page-number shape, the largest match wins,
//! and the winner is registered under two keys: the upper-cased OCR text and a
//! corrected form with OCR confusables (`I`, `O`) turned into digits. Callers
//! may look a page up by either.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

use planref_core::{BBox, TextBox};

use crate::page_index::PageIndex;

/// 1-2 letters, optional space, 1-4 digits or confusables, optional `.`
/// sub-index with trailing letter, optional ` OPT`/`-OPT` suffix.
const PAGE_NUMBER_PATTERN: &str = r"^[A-Za-z]{1,2}\s?[\dIOo]{1,4}(\.*\d{1,3}[A-Za-z]?)?([\s\-]OPT)?$";

const OPT_MARKER: &str = "OPT";

fn page_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PAGE_NUMBER_PATTERN).expect("page number pattern compiles"))
}

pub fn is_page_number(text: &str) -> bool { page_number_regex().is_match(text) }

/// The candidate with the largest box area; the earliest one on equal areas.
pub fn select_page_number<'a>(candidates: &[&'a TextBox]) -> Option<&'a TextBox> {
    candidates
        .iter()
        .copied()
        .reduce(|best, c| if c.bbox.area() > best.bbox.area() { c } else { best })
}

/// The two lookup keys derived from one page label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPageNumber {
    /// OCR text, upper-cased.
    pub raw: String,
    /// Confusables replaced, whitespace removed, `OPT` re-appended when flagged.
    pub corrected: String,
    /// The label marks an optional variant page.
    pub optional: bool,
}

pub fn normalize(text: &str) -> NormalizedPageNumber {
    let raw = text.trim().to_uppercase();
    let (base, optional) = match raw.strip_suffix(OPT_MARKER) {
        Some(rest) => (rest.trim_end_matches(|c: char| c.is_whitespace() || c == '-'), true),
        None => (raw.as_str(), false),
    };
    let mut corrected: String = base
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            'I' => '1',
            'O' => '0',
            other => other,
        })
        .collect();
    if optional {
        corrected.push_str(OPT_MARKER);
    }
    NormalizedPageNumber { raw, corrected, optional }
}

/// Page-number keys to the filename of the page that carries them.
#[derive(Debug, Clone, Default)]
pub struct PageNumberTable {
    by_key: HashMap<String, String>,
}

impl PageNumberTable {
    pub fn new() -> Self { Self::default() }

    /// Registers both the raw and the corrected key for `filename`.
    pub fn insert(&mut self, page_num: &NormalizedPageNumber, filename: &str) {
        for key in [&page_num.raw, &page_num.corrected] {
            if let Some(previous) = self.by_key.insert(key.clone(), filename.to_string()) {
                if previous != filename {
                    warn!(key = %key, previous = %previous, current = %filename, "page number claimed by two pages; keeping the later one");
                }
            }
        }
    }

    pub fn filename_for(&self, page_num: &str) -> Option<&str> { self.by_key.get(page_num).map(String::as_str) }

    pub fn contains(&self, page_num: &str) -> bool { self.by_key.contains_key(page_num) }

    /// Keys pointing at `filename`, sorted.
    pub fn keys_for(&self, filename: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .by_key
            .iter()
            .filter(|(_, f)| f.as_str() == filename)
            .map(|(k, _)| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize { self.by_key.len() }

    pub fn is_empty(&self) -> bool { self.by_key.is_empty() }
}

/// The label found in `region` on `page`, if any text there has page-number shape.
pub fn page_number_of<'a>(page: &'a PageIndex, region: &BBox) -> Option<&'a TextBox> {
    let candidates: Vec<&TextBox> = page
        .text_in_bbox(region)
        .into_iter()
        .filter(|tb| is_page_number(&tb.text))
        .collect();
    let chosen = select_page_number(&candidates);
    if candidates.len() > 1 {
        debug!(page = %page.filename(), candidates = candidates.len(), chosen = ?chosen.map(|c| &c.text), "picked largest page number candidate");
    }
    chosen
}

/// Scans `region` on every page. Pages without a label are logged and skipped.
pub fn derive_page_numbers<'a>(pages: impl IntoIterator<Item = &'a PageIndex>, region: &BBox) -> PageNumberTable {
    let mut table = PageNumberTable::new();
    for page in pages {
        match page_number_of(page, region) {
            Some(label) => table.insert(&normalize(&label.text), page.filename()),
            None => warn!(page = %page.filename(), %region, "no page number found"),
        }
    }
    table
}
