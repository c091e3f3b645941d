use super::*;

const MIN_PART_PARAGRAPHS: usize = 10;
const DEFINED_TERMS_LOOKBACK: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LocateMethod {
    StartPage,
    PartHeading,
    SectionNumbering,
    DefinedTerms,
    DocumentStart,
    NumberedRuns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LocatedPart {
    pub(super) method: LocateMethod,
    pub(super) paragraphs: Vec<String>,
}

/// Page mode: everything from the first paragraph on `start_page` up to (not
/// including) the first page that mentions the next part.
pub(super) fn locate_by_page(
    paragraphs: &[SourceParagraph],
    patterns: &PartPatterns,
    start_page: usize,
) -> LocatedPart {
    let mut collected = Vec::new();
    let mut index = 0usize;

    while index < paragraphs.len() {
        let page_number = paragraphs[index].page_number;
        let page_end = paragraphs[index..]
            .iter()
            .position(|paragraph| paragraph.page_number != page_number)
            .map(|offset| index + offset)
            .unwrap_or(paragraphs.len());
        let page = &paragraphs[index..page_end];
        index = page_end;

        if page_number.is_none_or(|number| number < start_page) {
            continue;
        }
        if page
            .iter()
            .any(|paragraph| patterns.mentions_next_part(&paragraph.text))
        {
            info!(page = ?page_number, next_part = patterns.next_part, "found start of next part");
            break;
        }
        collected.extend(page.iter().map(|paragraph| paragraph.text.clone()));
    }

    LocatedPart {
        method: LocateMethod::StartPage,
        paragraphs: collected,
    }
}

/// Marker mode: finds the part's opening heading by several fallbacks, cuts at
/// the next part's marker and falls back to a numbered-run scan when the
/// result is implausibly small.
pub(super) fn locate_by_markers(paragraphs: &[String], patterns: &PartPatterns) -> LocatedPart {
    let (start, method) = find_start(paragraphs, patterns);
    let end = paragraphs
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, text)| patterns.is_part_end(text))
        .map(|(index, text)| {
            info!(end_marker = %text, "found part end marker");
            index
        })
        .unwrap_or(paragraphs.len());

    let located = LocatedPart {
        method,
        paragraphs: paragraphs[start.min(end)..end].to_vec(),
    };
    info!(method = ?located.method, paragraphs = located.paragraphs.len(), "located part content");

    if located.paragraphs.len() >= MIN_PART_PARAGRAPHS {
        return located;
    }

    warn!(
        paragraphs = located.paragraphs.len(),
        "part content looks too small; scanning numbered runs"
    );
    let alternative = numbered_runs(paragraphs, patterns);
    if alternative.len() > located.paragraphs.len() {
        info!(paragraphs = alternative.len(), "using numbered-run scan result");
        return LocatedPart {
            method: LocateMethod::NumberedRuns,
            paragraphs: alternative,
        };
    }
    located
}

fn find_start(paragraphs: &[String], patterns: &PartPatterns) -> (usize, LocateMethod) {
    if let Some(index) = paragraphs
        .iter()
        .position(|text| patterns.is_part_heading(text))
    {
        debug!(marker = %paragraphs[index], "found part heading");
        return (index, LocateMethod::PartHeading);
    }

    if let Some(index) = paragraphs
        .iter()
        .position(|text| patterns.is_first_section_marker(text))
    {
        debug!(marker = %paragraphs[index], "found first section numbering");
        return (index, LocateMethod::SectionNumbering);
    }

    for (index, text) in paragraphs.iter().enumerate() {
        if !text.contains("Defined Terms") {
            continue;
        }
        let window_start = index.saturating_sub(DEFINED_TERMS_LOOKBACK);
        if let Some(offset) = paragraphs[window_start..index]
            .iter()
            .position(|previous| patterns.is_defined_terms_article(previous))
        {
            debug!(marker = %paragraphs[window_start + offset], "found article near defined terms");
            return (window_start + offset, LocateMethod::DefinedTerms);
        }
    }

    warn!(part = patterns.part, "no start marker found; starting at document start");
    (0, LocateMethod::DocumentStart)
}

fn numbered_runs(paragraphs: &[String], patterns: &PartPatterns) -> Vec<String> {
    let mut collected = Vec::new();
    let mut in_part = false;

    for text in paragraphs {
        if patterns.starts_with_part_number(text) || (in_part && !patterns.starts_next_part(text)) {
            in_part = true;
            collected.push(text.clone());
        }
        if in_part && patterns.is_part_end(text) {
            in_part = false;
        }
    }

    collected
}
