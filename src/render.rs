use crate::reconstruct::{ContentMode, PageContent, PageItem};

pub const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";
pub const HTML_DOCUMENT_FOOTER: &str = "</body>\n</html>";

const PAGE_STYLE: &str =
    ".page { margin-bottom: 20px; border-bottom: 1px dashed #ccc; padding-bottom: 10px; }";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 16);
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn html_document_header(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n",
        escape_html(title),
        PAGE_STYLE
    )
}

pub fn render_page_html(page: &PageContent) -> String {
    let mut html = format!(
        "<div class=\"page\" id=\"page_{0}\" data-page-number=\"{0}\">\n",
        page.page_number
    );

    for item in &page.items {
        match item {
            PageItem::Paragraph(text) => {
                html.push_str("<p>");
                html.push_str(&escape_html(text));
                html.push_str("</p>\n");
            }
            PageItem::Image => {
                html.push_str("<div class=\"image\">");
                html.push_str(item.text());
                html.push_str("</div>\n");
            }
        }
    }

    html.push_str("</div>\n");
    html
}

/// Plain-text rendering of one page, without the trailing page break.
pub fn render_page_text(page: &PageContent) -> String {
    let mut text = String::new();
    match page.mode {
        ContentMode::Reconstructed => {
            for item in &page.items {
                text.push_str(item.text());
                text.push_str("\n\n");
            }
        }
        ContentMode::LinePerParagraph => {
            for item in &page.items {
                text.push_str(item.text());
                text.push('\n');
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BBox, Block, Line, PageLayout};
    use crate::reconstruct::{ReconstructConfig, reconstruct_page};
    use regex::Regex;

    fn unescape_html(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#x27;", "'")
            .replace("&amp;", "&")
    }

    fn html_items(html: &str) -> Vec<String> {
        let item_regex =
            Regex::new(r#"<p>(.*?)</p>|<div class="image">(.*?)</div>"#).expect("regex compiles");
        item_regex
            .captures_iter(html)
            .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
            .map(|value| unescape_html(value.as_str()))
            .collect()
    }

    fn text_items(text: &str) -> Vec<String> {
        text.split("\n\n")
            .filter(|chunk| !chunk.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    fn sample_page() -> PageLayout {
        PageLayout {
            page_number: 7,
            blocks: vec![
                Block::Text {
                    lines: vec![
                        Line::new(BBox::new(72.0, 100.0, 500.0, 110.0), "Loads <kPa> & \"snow\""),
                        Line::new(BBox::new(72.0, 112.0, 500.0, 122.0), "shall be deter-"),
                        Line::new(BBox::new(72.0, 124.0, 500.0, 134.0), "mined per Article 4.1.6.2."),
                        Line::new(BBox::new(72.0, 136.0, 500.0, 146.0), "Owner's duties"),
                    ],
                },
                Block::Image {
                    bbox: BBox::default(),
                },
            ],
            ..PageLayout::default()
        }
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"a < b & "c" > 'd'"#),
            "a &lt; b &amp; &quot;c&quot; &gt; &#x27;d&#x27;"
        );
    }

    #[test]
    fn html_page_is_wrapped_in_numbered_container() {
        let content = reconstruct_page(&sample_page(), &ReconstructConfig::default());
        let html = render_page_html(&content);

        assert!(html.starts_with("<div class=\"page\" id=\"page_7\" data-page-number=\"7\">\n"));
        assert!(html.contains("<p>Loads &lt;kPa&gt; &amp; &quot;snow&quot; shall be determined per Article 4.1.6.2.</p>"));
        assert!(html.contains("<div class=\"image\">[Image]</div>\n"));
        assert!(html.ends_with("</div>\n"));
    }

    #[test]
    fn html_and_text_renderings_carry_identical_paragraphs() {
        let content = reconstruct_page(&sample_page(), &ReconstructConfig::default());
        let from_html = html_items(&render_page_html(&content));
        let from_text = text_items(&render_page_text(&content));

        assert_eq!(from_html, from_text);
        assert_eq!(
            from_text,
            vec![
                "Loads <kPa> & \"snow\" shall be determined per Article 4.1.6.2.".to_string(),
                "Owner's duties".to_string(),
                "[Image]".to_string(),
            ]
        );
    }

    #[test]
    fn naive_text_mode_writes_one_line_per_paragraph() {
        let content = crate::reconstruct::naive_page(&sample_page());
        assert_eq!(
            render_page_text(&content),
            "Loads <kPa> & \"snow\"\nshall be deter-\nmined per Article 4.1.6.2.\nOwner's duties\n"
        );
    }

    #[test]
    fn document_header_escapes_title() {
        let header = html_document_header("PDF Chunk 1: Pages 1-50");
        assert!(header.starts_with("<!DOCTYPE html>\n<html>\n<head>\n"));
        assert!(header.contains("<title>PDF Chunk 1: Pages 1-50</title>"));
        assert!(header.ends_with("<body>\n"));
    }
}
