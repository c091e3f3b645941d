use super::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct ArticleNode {
    pub(super) title: String,
    pub(super) number: Option<String>,
    pub(super) content: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct SubsectionNode {
    pub(super) title: String,
    pub(super) number: Option<String>,
    pub(super) content: Vec<String>,
    pub(super) articles: Vec<ArticleNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct SectionNode {
    pub(super) title: String,
    pub(super) number: Option<String>,
    pub(super) content: Vec<String>,
    pub(super) subsections: Vec<SubsectionNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct PartNode {
    pub(super) title: String,
    pub(super) number: String,
    /// Text that precedes the first section heading.
    pub(super) content: Vec<String>,
    pub(super) sections: Vec<SectionNode>,
}

impl PartNode {
    pub(super) fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub(super) fn subsection_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.subsections.len())
            .sum()
    }

    pub(super) fn article_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|section| &section.subsections)
            .map(|subsection| subsection.articles.len())
            .sum()
    }
}

/// Builds the heading tree. A heading that arrives before its parent level
/// exists is kept as plain content of the nearest open node, so no text is
/// dropped.
pub(super) fn build_part_tree(
    paragraphs: &[String],
    patterns: &PartPatterns,
    numbers: &NumberExtractor,
) -> PartNode {
    let mut part = PartNode {
        title: format!("Part {}", patterns.part),
        number: patterns.part.to_string(),
        ..PartNode::default()
    };

    for text in paragraphs {
        match patterns.heading_level(text) {
            Some(HeadingLevel::Section) => part.sections.push(SectionNode {
                title: text.clone(),
                number: numbers.extract(text),
                ..SectionNode::default()
            }),
            Some(HeadingLevel::Subsection) => match part.sections.last_mut() {
                Some(section) => section.subsections.push(SubsectionNode {
                    title: text.clone(),
                    number: numbers.extract(text),
                    ..SubsectionNode::default()
                }),
                None => part.content.push(text.clone()),
            },
            Some(HeadingLevel::Article) => {
                match part
                    .sections
                    .last_mut()
                    .and_then(|section| section.subsections.last_mut())
                {
                    Some(subsection) => subsection.articles.push(ArticleNode {
                        title: text.clone(),
                        number: numbers.extract(text),
                        content: Vec::new(),
                    }),
                    None => open_content(&mut part).push(text.clone()),
                }
            }
            None => open_content(&mut part).push(text.clone()),
        }
    }

    part
}

/// Content list of the deepest node currently open.
fn open_content(part: &mut PartNode) -> &mut Vec<String> {
    let Some(section) = part.sections.last_mut() else {
        return &mut part.content;
    };
    let Some(subsection) = section.subsections.last_mut() else {
        return &mut section.content;
    };
    match subsection.articles.last_mut() {
        Some(article) => &mut article.content,
        None => &mut subsection.content,
    }
}

/// Replaces every content list with its merged paragraphs.
pub(super) fn merge_part(part: PartNode, grouper: &dyn ParagraphGrouper) -> Result<PartNode> {
    let mut merged = part;
    merged.content = merge_chunks(grouper, &merged.content)
        .with_context(|| format!("failed to merge content of {}", merged.title))?;

    for section in &mut merged.sections {
        section.content = merge_chunks(grouper, &section.content)
            .with_context(|| format!("failed to merge content of {}", section.title))?;
        for subsection in &mut section.subsections {
            subsection.content = merge_chunks(grouper, &subsection.content)
                .with_context(|| format!("failed to merge content of {}", subsection.title))?;
            for article in &mut subsection.articles {
                article.content = merge_chunks(grouper, &article.content)
                    .with_context(|| format!("failed to merge content of {}", article.title))?;
            }
        }
        info!(
            section = %section.title,
            subsections = section.subsections.len(),
            grouper = grouper.name(),
            "merged section"
        );
    }

    Ok(merged)
}
