//! On-disk artifacts: OCR results per page, and curated graphic registrations.
//!
//! The OCR snapshot lets a plan be re-indexed without calling the OCR provider
//! again. Its schema is the page index itself:
//! `{"A101.png": [[[left, top, right, bottom], "text"], ...], ...}`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use planref_core::{Result, TextBox};

use crate::registry::DetailGraphic;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanSnapshot {
    pub pages: BTreeMap<String, Vec<TextBox>>,
}

impl PlanSnapshot {
    pub fn load(path: &Path) -> Result<Self> { read_json(path) }

    /// An empty snapshot when `path` does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() { Self::load(path) } else { Ok(Self::default()) }
    }

    pub fn save(&self, path: &Path) -> Result<()> { write_json(path, self) }

    pub fn contains(&self, filename: &str) -> bool { self.pages.contains_key(filename) }

    pub fn insert(&mut self, filename: impl Into<String>, boxes: Vec<TextBox>) { self.pages.insert(filename.into(), boxes); }
}

/// Graphic registrations by filename, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphicRegistrations {
    pub pages: BTreeMap<String, Vec<DetailGraphic>>,
}

impl GraphicRegistrations {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() { read_json(path) } else { Ok(Self::default()) }
    }

    pub fn save(&self, path: &Path) -> Result<()> { write_json(path, self) }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
