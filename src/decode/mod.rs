use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, warn};

use crate::layout::PageLayout;

mod layout_file;
mod poppler;

use layout_file::LayoutFileSource;
use poppler::PopplerSource;

pub use poppler::poppler_tool_versions;

/// Supplies decoded page layouts, addressed by 1-based page number.
pub trait PageSource {
    fn describe(&self) -> String;

    fn page_count(&self) -> Result<usize>;

    /// Decodes the inclusive page range `first..=last`.
    fn decode_pages(&self, first: usize, last: usize) -> Result<Vec<PageLayout>>;

    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn open_source(path: &Path) -> Result<Box<dyn PageSource>> {
    if !path.exists() {
        bail!("input file not found: {}", path.display());
    }

    let is_layout_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_layout_json {
        let source = LayoutFileSource::open(path)
            .with_context(|| format!("failed to load layout file {}", path.display()))?;
        return Ok(Box::new(source));
    }

    Ok(Box::new(PopplerSource::new(path)?))
}

/// Decodes one batch, falling back to page-by-page decoding when the batch
/// call fails so a corrupt page only costs itself. The result holds exactly
/// one entry per page in `first..=last`, in order.
pub fn decode_batch(
    source: &dyn PageSource,
    first: usize,
    last: usize,
) -> Vec<(usize, Result<PageLayout>)> {
    match source.decode_pages(first, last) {
        Ok(pages) => assign_pages(first, last, pages),
        Err(error) if first == last => vec![(first, Err(error))],
        Err(error) => {
            warn!(
                first_page = first,
                last_page = last,
                error = %error,
                "batch decode failed; retrying page by page"
            );
            (first..=last)
                .map(|page_number| {
                    let decoded = source
                        .decode_pages(page_number, page_number)
                        .and_then(|pages| take_page(page_number, pages));
                    (page_number, decoded)
                })
                .collect()
        }
    }
}

/// Lazily decodes pages `1..=last_page` in batches of `chunk_size`; at most
/// one batch of decoded pages is held at a time.
pub struct DecodedPages<'a> {
    source: &'a dyn PageSource,
    next_page: usize,
    last_page: usize,
    chunk_size: usize,
    buffered: VecDeque<(usize, Result<PageLayout>)>,
}

impl<'a> DecodedPages<'a> {
    pub fn new(source: &'a dyn PageSource, last_page: usize, chunk_size: usize) -> Self {
        Self {
            source,
            next_page: 1,
            last_page,
            chunk_size: chunk_size.max(1),
            buffered: VecDeque::new(),
        }
    }
}

impl Iterator for DecodedPages<'_> {
    type Item = (usize, Result<PageLayout>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffered.is_empty() {
            if self.next_page > self.last_page {
                return None;
            }
            let first = self.next_page;
            let last = (first + self.chunk_size - 1).min(self.last_page);
            debug!(first_page = first, last_page = last, "decoding page batch");
            self.buffered.extend(decode_batch(self.source, first, last));
            self.next_page = last + 1;
        }
        self.buffered.pop_front()
    }
}

fn assign_pages(
    first: usize,
    last: usize,
    pages: Vec<PageLayout>,
) -> Vec<(usize, Result<PageLayout>)> {
    let mut slots: Vec<Option<PageLayout>> = (first..=last).map(|_| None).collect();
    for page in pages {
        if page.page_number < first || page.page_number > last {
            continue;
        }
        let slot = page.page_number - first;
        slots[slot] = Some(page);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(offset, slot)| {
            let page_number = first + offset;
            let decoded =
                slot.ok_or_else(|| anyhow!("page {page_number} missing from decoder output"));
            (page_number, decoded)
        })
        .collect()
}

fn take_page(page_number: usize, pages: Vec<PageLayout>) -> Result<PageLayout> {
    pages
        .into_iter()
        .find(|page| page.page_number == page_number)
        .ok_or_else(|| anyhow!("page {page_number} missing from decoder output"))
}
