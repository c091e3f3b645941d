use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SourceParagraph {
    pub(super) page_number: Option<usize>,
    pub(super) text: String,
}

/// Reads `<p>` elements of converted HTML in document order, tagging each with
/// the `data-page-number` of its enclosing `div.page`.
pub(super) struct HtmlParagraphReader {
    page: Selector,
    paragraph: Selector,
    noise: NoiseFilter,
}

impl HtmlParagraphReader {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            page: selector("div.page")?,
            paragraph: selector("p")?,
            noise: NoiseFilter::new()?,
        })
    }

    pub(super) fn read_files(&self, paths: &[PathBuf]) -> Result<Vec<SourceParagraph>> {
        let mut paragraphs = Vec::new();
        for path in paths {
            let html = fs::read_to_string(path)
                .with_context(|| format!("failed to read html file {}", path.display()))?;
            let parsed = self.parse(&html);
            info!(path = %path.display(), paragraphs = parsed.len(), "read html file");
            paragraphs.extend(parsed);
        }
        Ok(paragraphs)
    }

    pub(super) fn parse(&self, html: &str) -> Vec<SourceParagraph> {
        let document = Html::parse_document(html);
        let mut paragraphs = Vec::new();
        let mut dropped = 0usize;

        let pages = document.select(&self.page).collect::<Vec<_>>();
        if pages.is_empty() {
            for element in document.select(&self.paragraph) {
                self.push_paragraph(&mut paragraphs, &mut dropped, None, element);
            }
        } else {
            for page in pages {
                let page_number = page
                    .value()
                    .attr("data-page-number")
                    .and_then(|value| value.trim().parse::<usize>().ok());
                for element in page.select(&self.paragraph) {
                    self.push_paragraph(&mut paragraphs, &mut dropped, page_number, element);
                }
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped running header/footer paragraphs");
        }
        paragraphs
    }

    fn push_paragraph(
        &self,
        paragraphs: &mut Vec<SourceParagraph>,
        dropped: &mut usize,
        page_number: Option<usize>,
        element: ElementRef<'_>,
    ) {
        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.noise.is_noise(text) {
            *dropped += 1;
            return;
        }
        paragraphs.push(SourceParagraph {
            page_number,
            text: text.to_string(),
        });
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|error| anyhow!("invalid css selector {css}: {error:?}"))
}
