use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::PageSource;
use crate::layout::{DocumentLayout, PageLayout};

/// Serves pages from a `DocumentLayout` JSON file, such as one written by
/// the `layout` command or by an external decoder.
pub struct LayoutFileSource {
    path: PathBuf,
    layout: DocumentLayout,
}

impl LayoutFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let layout: DocumentLayout = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            layout,
        })
    }
}

impl PageSource for LayoutFileSource {
    fn describe(&self) -> String {
        if self.layout.source.is_empty() {
            self.path.display().to_string()
        } else {
            format!("{} (layout of {})", self.path.display(), self.layout.source)
        }
    }

    fn page_count(&self) -> Result<usize> {
        Ok(self
            .layout
            .pages
            .iter()
            .map(|page| page.page_number)
            .max()
            .unwrap_or(0))
    }

    fn decode_pages(&self, first: usize, last: usize) -> Result<Vec<PageLayout>> {
        Ok(self
            .layout
            .pages
            .iter()
            .filter(|page| page.page_number >= first && page.page_number <= last)
            .cloned()
            .collect())
    }
}
