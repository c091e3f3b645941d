use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum ParagraphStrategy {
    Reconstruct(ReconstructConfig),
    LinePerParagraph,
}

impl ParagraphStrategy {
    pub(super) fn from_args(args: &crate::cli::ParagraphArgs) -> Self {
        if !args.preserve_paragraphs {
            return Self::LinePerParagraph;
        }

        Self::Reconstruct(ReconstructConfig {
            gap_factor: args.para_gap_factor,
            indent_threshold: args.para_indent_threshold,
            abbreviation_exceptions: args.abbreviation_exceptions,
            ..ReconstructConfig::default()
        })
    }

    fn mode(&self) -> ContentMode {
        match self {
            Self::Reconstruct(_) => ContentMode::Reconstructed,
            Self::LinePerParagraph => ContentMode::LinePerParagraph,
        }
    }

    pub(super) fn apply(&self, page: &PageLayout) -> PageContent {
        match self {
            Self::Reconstruct(config) => reconstruct_page(page, config),
            Self::LinePerParagraph => naive_page(page),
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct ConversionStats {
    pub(super) processed_pages: usize,
    pub(super) failed_pages: Vec<usize>,
    pub(super) paragraphs: usize,
    pub(super) image_placeholders: usize,
    pub(super) forced_splits: usize,
    pub(super) warnings: Vec<String>,
}

/// Streams pages from the decoder through the paragraph strategy into the
/// sink, one page at a time. Decode failures only empty their own page.
pub(super) fn convert_pages<I>(
    pages: I,
    strategy: &ParagraphStrategy,
    sink: &mut dyn PageSink,
    progress_every: usize,
) -> Result<ConversionStats>
where
    I: Iterator<Item = (usize, Result<PageLayout>)>,
{
    let mut stats = ConversionStats::default();
    let progress_every = progress_every.max(1);
    let mut batch_start = 1usize;

    for (page_number, decoded) in pages {
        match decoded {
            Ok(layout) => {
                let content = strategy.apply(&layout);
                stats.paragraphs += content.paragraph_count();
                stats.image_placeholders += content.image_count();
                stats.forced_splits += content.forced_splits;
                sink.write_page(&content)?;
            }
            Err(error) => {
                warn!(page = page_number, error = %error, "page extraction failed; writing empty page");
                stats.failed_pages.push(page_number);
                stats
                    .warnings
                    .push(format!("page {page_number} extraction failed: {error:#}"));
                sink.write_failed_page(page_number)?;
            }
        }
        stats.processed_pages += 1;

        if stats.processed_pages % progress_every == 0 {
            info!(
                first_page = batch_start,
                last_page = page_number,
                mode = ?strategy.mode(),
                "pages written"
            );
            batch_start = page_number + 1;
        }
    }

    if batch_start <= stats.processed_pages {
        info!(
            first_page = batch_start,
            last_page = stats.processed_pages,
            "pages written"
        );
    }

    Ok(stats)
}
