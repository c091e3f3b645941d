//! Paragraph reconstruction from positioned PDF text lines.
//!
//! Each text block is fed line by line through a [`ParagraphAccumulator`].
//! A line starts a new paragraph when the vertical gap to the previous line
//! exceeds `gap_factor` line heights, when it is indented past
//! `indent_threshold` relative to the block's first line, or when the
//! previous line ends a sentence. State never crosses a block boundary.

use crate::layout::{Block, Line, PageLayout};

pub const IMAGE_PLACEHOLDER: &str = "[Image]";
pub const DEFAULT_GAP_FACTOR: f64 = 1.5;
pub const DEFAULT_INDENT_THRESHOLD: f64 = 10.0;
pub const DEFAULT_MAX_LINES_PER_PARAGRAPH: usize = 100;

const SENTENCE_TERMINATORS: [char; 5] = ['.', '?', '!', ':', ';'];
const ABBREVIATIONS: [&str; 3] = ["e.g.", "i.e.", "etc."];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructConfig {
    pub gap_factor: f64,
    pub indent_threshold: f64,
    pub max_lines_per_paragraph: usize,
    /// Treat a trailing `e.g.`, `i.e.` or `etc.` as mid-sentence.
    pub abbreviation_exceptions: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            gap_factor: DEFAULT_GAP_FACTOR,
            indent_threshold: DEFAULT_INDENT_THRESHOLD,
            max_lines_per_paragraph: DEFAULT_MAX_LINES_PER_PARAGRAPH,
            abbreviation_exceptions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageItem {
    Paragraph(String),
    Image,
}

impl PageItem {
    pub fn text(&self) -> &str {
        match self {
            Self::Paragraph(text) => text,
            Self::Image => IMAGE_PLACEHOLDER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    #[default]
    Reconstructed,
    LinePerParagraph,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub page_number: usize,
    pub mode: ContentMode,
    pub items: Vec<PageItem>,
    pub forced_splits: usize,
}

impl PageContent {
    pub fn empty(page_number: usize, mode: ContentMode) -> Self {
        Self {
            page_number,
            mode,
            ..Self::default()
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, PageItem::Paragraph(_)))
            .count()
    }

    pub fn image_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, PageItem::Image))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockParagraphs {
    pub paragraphs: Vec<String>,
    pub forced_splits: usize,
}

/// Why a pending paragraph was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emission {
    Boundary,
    LineCap,
    BlockEnd,
}

/// Per-block paragraph state: the lines of the paragraph in progress, the
/// bottom edge of the last accepted line and the block's starting x.
#[derive(Debug)]
pub struct ParagraphAccumulator<'a> {
    config: &'a ReconstructConfig,
    block_left: f64,
    prev_bottom: f64,
    pending: Vec<String>,
    output: BlockParagraphs,
}

impl<'a> ParagraphAccumulator<'a> {
    pub fn new(config: &'a ReconstructConfig, block_left: f64) -> Self {
        Self {
            config,
            block_left,
            prev_bottom: -1.0,
            pending: Vec::new(),
            output: BlockParagraphs::default(),
        }
    }

    pub fn push_line(&mut self, line: &Line) {
        if line.is_empty() {
            return;
        }

        // prev_bottom stays <= 0 for the first line and for boxes without geometry
        if self.prev_bottom > 0.0 && self.starts_new_paragraph(line) && !self.pending.is_empty() {
            self.flush(Emission::Boundary);
        }

        // a full paragraph is only split when another line would continue it
        if self.pending.len() >= self.config.max_lines_per_paragraph {
            self.flush(Emission::LineCap);
        }

        self.pending.push(line.text().trim().to_string());
        self.prev_bottom = line.bbox.bottom;
    }

    pub fn finish(mut self) -> BlockParagraphs {
        if !self.pending.is_empty() {
            self.flush(Emission::BlockEnd);
        }
        self.output
    }

    fn starts_new_paragraph(&self, line: &Line) -> bool {
        let y_gap = line.bbox.top - self.prev_bottom;
        let line_height = line.bbox.height();
        let x_indent = line.bbox.left - self.block_left;

        y_gap > self.config.gap_factor * line_height
            || x_indent > self.config.indent_threshold
            || self
                .pending
                .last()
                .is_some_and(|previous| ends_sentence(previous, self.config.abbreviation_exceptions))
    }

    fn flush(&mut self, reason: Emission) {
        let lines = std::mem::take(&mut self.pending);
        self.output.paragraphs.push(join_lines(&lines));
        if reason == Emission::LineCap {
            self.output.forced_splits += 1;
        }
    }
}

pub fn ends_sentence(text: &str, abbreviation_exceptions: bool) -> bool {
    let Some(last) = text.chars().last() else {
        return false;
    };
    if !SENTENCE_TERMINATORS.contains(&last) {
        return false;
    }
    if abbreviation_exceptions {
        let lowered = text.to_lowercase();
        return !ABBREVIATIONS
            .iter()
            .any(|abbreviation| lowered.ends_with(abbreviation));
    }
    true
}

/// Joins line texts with single spaces; a line ending in `-` loses the
/// hyphen and runs straight into the next line.
pub fn join_lines(lines: &[String]) -> String {
    let mut joined = String::new();
    for (index, line) in lines.iter().enumerate() {
        let is_last = index + 1 == lines.len();
        if is_last {
            joined.push_str(line);
        } else if let Some(stem) = line.strip_suffix('-') {
            joined.push_str(stem);
        } else {
            joined.push_str(line);
            joined.push(' ');
        }
    }
    joined
}

pub fn reconstruct_block(lines: &[Line], config: &ReconstructConfig) -> BlockParagraphs {
    let block_left = lines.first().map(|line| line.bbox.left).unwrap_or(0.0);
    let mut accumulator = ParagraphAccumulator::new(config, block_left);
    for line in lines {
        accumulator.push_line(line);
    }
    accumulator.finish()
}

pub fn reconstruct_page(page: &PageLayout, config: &ReconstructConfig) -> PageContent {
    let mut content = PageContent::empty(page.page_number, ContentMode::Reconstructed);

    for block in &page.blocks {
        match block {
            Block::Text { lines } => {
                let block_paragraphs = reconstruct_block(lines, config);
                content.forced_splits += block_paragraphs.forced_splits;
                content.items.extend(
                    block_paragraphs
                        .paragraphs
                        .into_iter()
                        .map(PageItem::Paragraph),
                );
            }
            Block::Image { .. } => content.items.push(PageItem::Image),
        }
    }

    content
}

/// One paragraph per non-empty line, images dropped.
pub fn naive_page(page: &PageLayout) -> PageContent {
    let mut content = PageContent::empty(page.page_number, ContentMode::LinePerParagraph);

    for block in &page.blocks {
        let Block::Text { lines } = block else {
            continue;
        };
        for line in lines.iter().filter(|line| !line.is_empty()) {
            content
                .items
                .push(PageItem::Paragraph(line.text().trim().to_string()));
        }
    }

    content
}
