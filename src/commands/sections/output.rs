use super::*;

/// Text rendering of the merged tree: the part title and a blank line, then
/// each heading on its own line followed by its paragraphs, each paragraph
/// followed by a blank line.
pub(super) fn format_output(part: &PartNode) -> Vec<String> {
    let mut lines = vec![part.title.clone(), String::new()];
    push_paragraphs(&mut lines, &part.content);

    for section in &part.sections {
        lines.push(section.title.clone());
        push_paragraphs(&mut lines, &section.content);
        for subsection in &section.subsections {
            lines.push(subsection.title.clone());
            push_paragraphs(&mut lines, &subsection.content);
            for article in &subsection.articles {
                lines.push(article.title.clone());
                push_paragraphs(&mut lines, &article.content);
            }
        }
    }

    lines
}

fn push_paragraphs(lines: &mut Vec<String>, paragraphs: &[String]) {
    for paragraph in paragraphs {
        lines.push(paragraph.clone());
        lines.push(String::new());
    }
}
