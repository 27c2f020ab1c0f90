//! Domain types shared by the index, the providers and the front ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Axis-aligned rectangle in page-image pixel coordinates.
///
/// Edges are inclusive. Serialized as `[left, top, right, bottom]`, which is
/// also the order accepted by [`BBox::from_str`] (`"left,top,right,bottom"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BBox {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Build from the `left, top, width, height` form most OCR services report.
    ///
    /// `None` for a negative extent or an edge past `i32::MAX`.
    pub fn from_ltwh(left: i32, top: i32, width: i32, height: i32) -> Option<Self> {
        if width < 0 || height < 0 {
            return None;
        }
        Some(Self::new(left, top, left.checked_add(width)?, top.checked_add(height)?))
    }

    pub fn width(&self) -> i64 { i64::from(self.right) - i64::from(self.left) }

    pub fn height(&self) -> i64 { i64::from(self.bottom) - i64::from(self.top) }

    pub fn area(&self) -> i64 { self.width() * self.height() }

    /// True when all four edges of `other` lie within `self`, edges inclusive.
    ///
    /// Overlap is not enough: a box crossing any edge is not contained.
    pub fn contains(&self, other: &BBox) -> bool {
        let horizontal = |x: i32| self.left <= x && x <= self.right;
        let vertical = |y: i32| self.top <= y && y <= self.bottom;
        horizontal(other.left) && horizontal(other.right) && vertical(other.top) && vertical(other.bottom)
    }
}

impl From<[i32; 4]> for BBox {
    fn from([left, top, right, bottom]: [i32; 4]) -> Self { Self::new(left, top, right, bottom) }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self { [b.left, b.top, b.right, b.bottom] }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

impl FromStr for BBox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidBBox(format!("{s}: {e}")))?;
        let &[left, top, right, bottom] = parts.as_slice() else {
            return Err(Error::InvalidBBox(format!("{s}: expected left,top,right,bottom")));
        };
        if left > right || top > bottom {
            return Err(Error::InvalidBBox(format!("{s}: edges are inverted")));
        }
        Ok(Self::new(left, top, right, bottom))
    }
}

/// A recognized text fragment and the rectangle it was found in.
///
/// Serialized as a `[[left, top, right, bottom], text]` pair so a page's
/// boxes read as a plain rectangle-to-string list in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(BBox, String)", into = "(BBox, String)")]
pub struct TextBox {
    pub bbox: BBox,
    pub text: String,
}

impl TextBox {
    pub fn new(bbox: BBox, text: impl Into<String>) -> Self { Self { bbox, text: text.into() } }
}

impl From<(BBox, String)> for TextBox {
    fn from((bbox, text): (BBox, String)) -> Self { Self { bbox, text } }
}

impl From<TextBox> for (BBox, String) {
    fn from(t: TextBox) -> Self { (t.bbox, t.text) }
}

/// A page number and detail number read from a detail tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRef {
    pub page_num: String,
    pub detail_num: String,
}

/// Where a detail graphic lives: the page image and the graphic's rectangle on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicLocation {
    pub filename: String,
    pub bbox: BBox,
}
