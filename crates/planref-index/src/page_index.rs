use std::collections::HashMap;
use tracing::trace;

use planref_core::{BBox, TextBox};

/// All recognized text on one page, in provider order.
#[derive(Debug, Clone)]
pub struct PageIndex {
    filename: String,
    boxes: Vec<TextBox>,
}

impl PageIndex {
    /// A rectangle reported twice keeps its first position and its last text.
    pub fn new(filename: impl Into<String>, boxes: impl IntoIterator<Item = TextBox>) -> Self {
        let mut slots: HashMap<BBox, usize> = HashMap::new();
        let mut ordered: Vec<TextBox> = Vec::new();
        for tb in boxes {
            match slots.get(&tb.bbox) {
                Some(&i) => ordered[i].text = tb.text,
                None => {
                    slots.insert(tb.bbox, ordered.len());
                    ordered.push(tb);
                }
            }
        }
        Self { filename: filename.into(), boxes: ordered }
    }

    pub fn filename(&self) -> &str { &self.filename }

    pub fn boxes(&self) -> &[TextBox] { &self.boxes }

    pub fn len(&self) -> usize { self.boxes.len() }

    pub fn is_empty(&self) -> bool { self.boxes.is_empty() }

    /// Text boxes lying entirely inside `target`, in page order.
    ///
    /// Boxes that only overlap the target are left out. An empty result means
    /// the region holds no text.
    pub fn text_in_bbox(&self, target: &BBox) -> Vec<&TextBox> {
        self.boxes
            .iter()
            .filter(|tb| {
                let contained = target.contains(&tb.bbox);
                trace!(page = %self.filename, %target, text_bbox = %tb.bbox, contained, "containment");
                contained
            })
            .collect()
    }
}
