use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::LayoutArgs;
use crate::decode::{DecodedPages, open_source};
use crate::layout::{DocumentLayout, PageLayout};
use crate::util::write_json_pretty;

pub fn run(args: LayoutArgs) -> Result<()> {
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let source = open_source(&args.input)?;
    let page_count = source
        .page_count()
        .with_context(|| format!("failed to read page count of {}", source.describe()))?;
    let last_page = args
        .max_pages
        .map(|max_pages| max_pages.min(page_count))
        .unwrap_or(page_count);

    info!(source = %source.describe(), page_count, last_page, "dumping page layout");
    for warning in source.warnings() {
        warn!(warning = %warning, "decoder warning");
    }

    let (layout, failed_pages) = collect_layout(
        source.describe(),
        DecodedPages::new(source.as_ref(), last_page, args.chunk_size),
    );

    write_json_pretty(&args.output, &layout)?;
    info!(
        path = %args.output.display(),
        pages = layout.pages.len(),
        text_blocks = layout
            .pages
            .iter()
            .map(PageLayout::text_block_count)
            .sum::<usize>(),
        failed_pages,
        "wrote layout json"
    );

    Ok(())
}

/// Failed pages are kept as empty layouts so page numbering stays dense.
fn collect_layout<I>(source: String, pages: I) -> (DocumentLayout, usize)
where
    I: Iterator<Item = (usize, Result<PageLayout>)>,
{
    let mut failed_pages = 0usize;
    let pages = pages
        .map(|(page_number, decoded)| match decoded {
            Ok(page) => page,
            Err(error) => {
                warn!(page = page_number, error = %error, "page extraction failed; keeping empty page");
                failed_pages += 1;
                PageLayout::empty(page_number)
            }
        })
        .collect();

    (DocumentLayout { source, pages }, failed_pages)
}
