use super::*;

/// Regexes whose shape depends on the part being extracted.
#[derive(Debug, Clone)]
pub(super) struct PartPatterns {
    pub(super) part: u32,
    pub(super) next_part: u32,
    part_mention: Regex,
    next_part_mention: Regex,
    first_section_number: Regex,
    defined_terms_article: Regex,
    any_part_number: Regex,
    section_heading: Regex,
    subsection_heading: Regex,
    article_heading: Regex,
    article_label: Regex,
}

impl PartPatterns {
    pub(super) fn new(part: u32) -> Result<Self> {
        let next_part = part + 1;
        Ok(Self {
            part,
            next_part,
            part_mention: compile(&format!(r"\bPart {part}\b"))?,
            next_part_mention: compile(&format!(r"\bPart {next_part}\b"))?,
            first_section_number: compile(&format!(r"^{part}\.1(\.\d+)*\.?$"))?,
            defined_terms_article: compile(&format!(r"^{part}\.2\.1\.\d+\.?$"))?,
            any_part_number: compile(&format!(r"^{part}\.\d+(\.\d+)*\.?"))?,
            section_heading: compile(&format!(r"^{part}\.\d+\.?$"))?,
            subsection_heading: compile(&format!(r"^{part}\.\d+\.\d+\.?$"))?,
            article_heading: compile(&format!(r"^{part}\.\d+\.\d+\.\d+\.?$"))?,
            article_label: compile(&format!(r"^Article {part}\.\d+\.\d+\.\d+"))?,
        })
    }

    pub(super) fn mentions_part(&self, text: &str) -> bool {
        self.part_mention.is_match(text)
    }

    pub(super) fn mentions_next_part(&self, text: &str) -> bool {
        self.next_part_mention.is_match(text)
    }

    /// A standalone `Part N` heading, or a Division B banner naming the part.
    pub(super) fn is_part_heading(&self, text: &str) -> bool {
        let bare = format!("Part {}", self.part);
        (text.contains("Division B") && self.mentions_part(text))
            || text == bare
            || text.strip_suffix('.') == Some(bare.as_str())
            || text.contains(&format!("Part {} General", self.part))
    }

    pub(super) fn is_first_section_marker(&self, text: &str) -> bool {
        self.first_section_number.is_match(text)
            || text.contains(&format!("Section {}.1", self.part))
    }

    pub(super) fn is_defined_terms_article(&self, text: &str) -> bool {
        self.defined_terms_article.is_match(text)
    }

    pub(super) fn starts_with_part_number(&self, text: &str) -> bool {
        self.any_part_number.is_match(text)
    }

    pub(super) fn starts_next_part(&self, text: &str) -> bool {
        text.starts_with(&format!("{}.", self.next_part))
    }

    /// Paragraph that ends the part in marker mode.
    pub(super) fn is_part_end(&self, text: &str) -> bool {
        self.mentions_next_part(text) || text.contains("Division C") || self.starts_next_part(text)
    }

    pub(super) fn heading_level(&self, text: &str) -> Option<HeadingLevel> {
        if self.section_heading.is_match(text) || text.starts_with(&format!("Section {}.", self.part)) {
            Some(HeadingLevel::Section)
        } else if self.subsection_heading.is_match(text) {
            Some(HeadingLevel::Subsection)
        } else if self.article_heading.is_match(text) || self.article_label.is_match(text) {
            Some(HeadingLevel::Article)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HeadingLevel {
    Section,
    Subsection,
    Article,
}

/// Running headers and footers repeated on every page of the code.
#[derive(Debug, Clone)]
pub(super) struct NoiseFilter {
    division_footer: Regex,
}

impl NoiseFilter {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            division_footer: compile(r"^\d+-\d+\s+Division\s+A$")?,
        })
    }

    pub(super) fn is_noise(&self, text: &str) -> bool {
        text.starts_with("National Building Code of Canada")
            || text.starts_with("Copyright ©")
            || (text.starts_with("Division A") && text.chars().count() < 15)
            || self.division_footer.is_match(text)
    }
}

/// Pulls the most specific dotted number out of a heading.
#[derive(Debug, Clone)]
pub(super) struct NumberExtractor {
    candidates: Vec<Regex>,
}

impl NumberExtractor {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            candidates: vec![
                compile(r"\d+\.\d+\.\d+\.\d+")?,
                compile(r"\d+\.\d+\.\d+")?,
                compile(r"\d+\.\d+")?,
            ],
        })
    }

    pub(super) fn extract(&self, text: &str) -> Option<String> {
        self.candidates
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|found| found.as_str().to_string())
    }
}

pub(super) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid regex pattern: {pattern}"))
}
