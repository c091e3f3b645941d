use super::*;

pub fn run(args: SectionsArgs) -> Result<()> {
    let patterns = PartPatterns::new(args.part)?;
    let reader = HtmlParagraphReader::new()?;
    let paragraphs = reader.read_files(&args.html_files)?;
    info!(
        files = args.html_files.len(),
        paragraphs = paragraphs.len(),
        part = args.part,
        "loaded converted html"
    );

    let located = match args.start_page {
        Some(start_page) => locate_by_page(&paragraphs, &patterns, start_page),
        None => {
            let texts = paragraphs
                .into_iter()
                .map(|paragraph| paragraph.text)
                .collect::<Vec<_>>();
            locate_by_markers(&texts, &patterns)
        }
    };
    if located.paragraphs.is_empty() {
        bail!("no content found for Part {}", args.part);
    }

    let numbers = NumberExtractor::new()?;
    let tree = build_part_tree(&located.paragraphs, &patterns, &numbers);
    info!(
        method = ?located.method,
        chunks = located.paragraphs.len(),
        sections = tree.section_count(),
        subsections = tree.subsection_count(),
        articles = tree.article_count(),
        "built section tree"
    );

    let grouper = build_grouper(args.merge, &args.llm)?;
    info!(merge = args.merge.as_str(), grouper = grouper.name(), "merging paragraphs");
    let merged = merge_part(tree, grouper.as_ref())?;

    write_lines(&args.output, &format_output(&merged))?;
    write_json_pretty(&args.json, &merged)?;
    info!(
        text = %args.output.display(),
        json = %args.json.display(),
        "wrote part content"
    );

    Ok(())
}
