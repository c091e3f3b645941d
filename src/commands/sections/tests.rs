use std::cell::RefCell;
use std::collections::VecDeque;

use super::*;

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn on_page(page_number: usize, items: &[&str]) -> Vec<SourceParagraph> {
    items
        .iter()
        .map(|text| SourceParagraph {
            page_number: Some(page_number),
            text: text.to_string(),
        })
        .collect()
}

fn part_patterns(part: u32) -> PartPatterns {
    PartPatterns::new(part).expect("part patterns should compile")
}

fn llm_config(batch_size: usize) -> LlmConfig {
    LlmConfig {
        api_key: "test-key".to_string(),
        model: "gpt-4o-mini".to_string(),
        endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        batch_size,
        delay: Duration::ZERO,
        temperature: 0.3,
        timeout: Duration::from_secs(1),
    }
}

fn llm_args(api_key: Option<&str>) -> LlmArgs {
    LlmArgs {
        api_key: api_key.map(str::to_string),
        llm_model: "gpt-4o-mini".to_string(),
        llm_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        llm_batch_size: 15,
        llm_delay_ms: 1000,
        llm_temperature: 0.3,
        llm_timeout_secs: 60,
    }
}

struct ScriptedClient {
    replies: RefCell<VecDeque<Result<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl CompletionClient for &ScriptedClient {
    fn complete(&self, _system: &str, user: &str) -> Result<String> {
        self.prompts.borrow_mut().push(user.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted reply left")))
    }
}

#[test]
fn html_reader_tracks_pages_and_drops_running_headers() {
    let html = r#"<!DOCTYPE html><html><body>
<div class="page" id="page_3" data-page-number="3">
<p>National Building Code of Canada 2020 Volume 1</p>
<p>1.1.</p>
<p>Fire &amp; smoke</p>
<p>   </p>
</div>
<div class="page" id="page_4" data-page-number="4">
<p>1-2 Division A</p>
<p>Division A</p>
<p>Application</p>
</div>
</body></html>"#;

    let reader = HtmlParagraphReader::new().expect("reader should build");
    let paragraphs = reader.parse(html);
    assert_eq!(
        paragraphs,
        vec![
            SourceParagraph {
                page_number: Some(3),
                text: "1.1.".to_string()
            },
            SourceParagraph {
                page_number: Some(3),
                text: "Fire & smoke".to_string()
            },
            SourceParagraph {
                page_number: Some(4),
                text: "Application".to_string()
            },
        ]
    );
}

#[test]
fn html_reader_accepts_documents_without_page_divs() {
    let reader = HtmlParagraphReader::new().expect("reader should build");
    let paragraphs = reader.parse("<html><body><p>Scope</p><p>Copyright © NRC 1941</p></body></html>");
    assert_eq!(paragraphs.len(), 1);
    assert_eq!(paragraphs[0].page_number, None);
    assert_eq!(paragraphs[0].text, "Scope");
}

#[test]
fn noise_filter_matches_running_headers_only() {
    let filter = NoiseFilter::new().expect("filter should build");
    assert!(filter.is_noise("National Building Code of Canada 2020"));
    assert!(filter.is_noise("Copyright © NRC 1941 - 2019"));
    assert!(filter.is_noise("Division A"));
    assert!(filter.is_noise("1-12 Division A"));
    assert!(!filter.is_noise("Division A Compliance, Objectives"));
    assert!(!filter.is_noise("Application of Division A"));
}

#[test]
fn page_mode_stops_at_page_mentioning_next_part() {
    let mut paragraphs = vec![SourceParagraph {
        page_number: None,
        text: "Preface".to_string(),
    }];
    paragraphs.extend(on_page(1, &["Previous part text"]));
    paragraphs.extend(on_page(2, &["Part 2", "Objectives"]));
    paragraphs.extend(on_page(3, &["2.1.", "Application of objectives."]));
    paragraphs.extend(on_page(4, &["Notes", "Part 3", "Functional Statements"]));

    let located = locate_by_page(&paragraphs, &part_patterns(2), 2);
    assert_eq!(located.method, LocateMethod::StartPage);
    assert_eq!(
        located.paragraphs,
        texts(&["Part 2", "Objectives", "2.1.", "Application of objectives."])
    );
}

#[test]
fn marker_mode_cuts_from_part_heading_to_next_part() {
    let paragraphs = texts(&[
        "Front matter",
        "Part 1",
        "Compliance",
        "1.1.",
        "Application",
        "1.1.1.",
        "Scope",
        "1.1.1.1.",
        "This Part applies to all buildings.",
        "More text here.",
        "Another line.",
        "Part 2",
        "Objectives",
    ]);

    let located = locate_by_markers(&paragraphs, &part_patterns(1));
    assert_eq!(located.method, LocateMethod::PartHeading);
    assert_eq!(located.paragraphs.len(), 10);
    assert_eq!(located.paragraphs[0], "Part 1");
    assert_eq!(located.paragraphs[9], "Another line.");
}

#[test]
fn part_heading_needs_exact_part_number() {
    let patterns = part_patterns(1);
    assert!(patterns.is_part_heading("Part 1"));
    assert!(patterns.is_part_heading("Part 1."));
    assert!(patterns.is_part_heading("Division B Part 1 General"));
    assert!(!patterns.is_part_heading("Part 10"));
    assert!(!patterns.is_part_heading("Division B Part 12"));
}

#[test]
fn small_result_falls_back_to_numbered_runs() {
    let paragraphs = texts(&[
        "Intro",
        "Part 1",
        "Part 2 begins here",
        "1.1.",
        "Application",
        "1.1.1.",
        "Scope text.",
        "2.1.",
        "Other part",
    ]);

    let located = locate_by_markers(&paragraphs, &part_patterns(1));
    assert_eq!(located.method, LocateMethod::NumberedRuns);
    assert_eq!(
        located.paragraphs,
        texts(&["1.1.", "Application", "1.1.1.", "Scope text."])
    );
}

#[test]
fn defined_terms_marker_looks_back_for_first_article() {
    let paragraphs = texts(&[
        "Cover",
        "1.2.1.1.",
        "Some text",
        "Defined Terms",
        "Building means a structure.",
    ]);

    let located = locate_by_markers(&paragraphs, &part_patterns(1));
    assert_eq!(located.method, LocateMethod::DefinedTerms);
    assert_eq!(located.paragraphs[0], "1.2.1.1.");
    assert_eq!(located.paragraphs.len(), 4);
}

#[test]
fn missing_markers_start_at_document_start() {
    let paragraphs = texts(&["alpha", "beta"]);
    let located = locate_by_markers(&paragraphs, &part_patterns(1));
    assert_eq!(located.method, LocateMethod::DocumentStart);
    assert_eq!(located.paragraphs, paragraphs);
}

#[test]
fn tree_nests_sections_subsections_and_articles() {
    let paragraphs = texts(&[
        "Part 1",
        "Compliance",
        "1.1.",
        "Application",
        "Intro to section.",
        "1.1.1.",
        "Scope",
        "1.1.1.1.",
        "Article text one.",
        "Article text two.",
        "Section 1.2. Terms",
        "1.2.1.",
        "Definitions",
    ]);
    let numbers = NumberExtractor::new().expect("extractor should build");
    let part = build_part_tree(&paragraphs, &part_patterns(1), &numbers);

    assert_eq!(part.title, "Part 1");
    assert_eq!(part.number, "1");
    assert_eq!(part.content, texts(&["Part 1", "Compliance"]));
    assert_eq!(part.section_count(), 2);
    assert_eq!(part.subsection_count(), 2);
    assert_eq!(part.article_count(), 1);

    let first = &part.sections[0];
    assert_eq!(first.number.as_deref(), Some("1.1"));
    assert_eq!(first.content, texts(&["Application", "Intro to section."]));
    let subsection = &first.subsections[0];
    assert_eq!(subsection.number.as_deref(), Some("1.1.1"));
    assert_eq!(subsection.content, texts(&["Scope"]));
    let article = &subsection.articles[0];
    assert_eq!(article.number.as_deref(), Some("1.1.1.1"));
    assert_eq!(
        article.content,
        texts(&["Article text one.", "Article text two."])
    );

    let second = &part.sections[1];
    assert_eq!(second.title, "Section 1.2. Terms");
    assert_eq!(second.number.as_deref(), Some("1.2"));
    assert_eq!(second.subsections[0].content, texts(&["Definitions"]));
}

#[test]
fn headings_without_parent_stay_as_content() {
    let paragraphs = texts(&["1.1.1.", "1.1.1.1.", "Body"]);
    let numbers = NumberExtractor::new().expect("extractor should build");
    let part = build_part_tree(&paragraphs, &part_patterns(1), &numbers);
    assert!(part.sections.is_empty());
    assert_eq!(part.content, paragraphs);
}

#[test]
fn heuristic_grouper_splits_titles_lists_and_sentences() {
    let chunks = texts(&[
        "1.2.1.1.",
        "Fire separations shall be",
        "continuous.",
        "They shall also",
        "1) be rated",
        "for 1 h;",
        "2) extend to the roof.",
        "This applies e.g.",
        "Walls and floors.",
        "1.2.1.2. Exits",
        "must be clear.",
    ]);

    let grouper = HeuristicGrouper::new().expect("grouper should build");
    let groups = grouper.group(&chunks).expect("grouping should succeed");
    assert_eq!(
        groups,
        vec![
            vec![0],
            vec![1, 2],
            vec![3],
            vec![4, 5],
            vec![6],
            vec![7, 8],
            vec![9],
            vec![10]
        ]
    );

    let merged = merge_chunks(&grouper, &chunks).expect("merge should succeed");
    assert_eq!(merged[1], "Fire separations shall be continuous.");
    assert_eq!(merged[3], "1) be rated for 1 h;");
    assert_eq!(merged[5], "This applies e.g. Walls and floors.");
}

#[test]
fn passthrough_grouper_keeps_every_chunk() {
    let chunks = texts(&["one", "two"]);
    let merged = merge_chunks(&PassthroughGrouper, &chunks).expect("merge should succeed");
    assert_eq!(merged, chunks);
    assert!(
        merge_chunks(&PassthroughGrouper, &[])
            .expect("empty merge should succeed")
            .is_empty()
    );
}

#[test]
fn sanitize_groups_covers_each_chunk_once_in_order() {
    let groups = vec![vec![1, 0], vec![0, 2], vec![9], vec![]];
    assert_eq!(sanitize_groups(&groups, 4), vec![vec![0, 1], vec![2], vec![3]]);

    let interleaved = vec![vec![0, 2], vec![1]];
    assert_eq!(
        sanitize_groups(&interleaved, 3),
        vec![vec![0], vec![1], vec![2]]
    );

    assert_eq!(sanitize_groups(&[], 2), vec![vec![0], vec![1]]);
}

#[test]
fn response_parser_accepts_bare_wrapped_and_fenced_arrays() {
    let parser = GroupResponseParser::new().expect("parser should build");
    let bare = r#"[{"paragraph_index": 0, "chunk_indices": [0, 1]}, {"paragraph_index": 1, "chunk_indices": [2]}]"#;
    assert_eq!(parser.parse(bare).expect("bare array"), vec![vec![0, 1], vec![2]]);

    let wrapped = format!("Here is the grouping:\n{bare}\nLet me know if you need more.");
    assert_eq!(
        parser.parse(&wrapped).expect("wrapped array"),
        vec![vec![0, 1], vec![2]]
    );

    let fenced = "```json\n[{\"paragraph_index\": 0, \"chunk_indices\": [0]}]\n```";
    assert_eq!(parser.parse(fenced).expect("fenced array"), vec![vec![0]]);

    assert!(parser.parse("I cannot help with that.").is_err());
}

#[test]
fn llm_grouper_batches_and_falls_back_per_batch() {
    let client = ScriptedClient::new(vec![
        Ok(r#"[{"chunk_indices": [0]}, {"chunk_indices": [1]}]"#.to_string()),
        Err(anyhow!("rate limited")),
        Ok("```json\n[{\"paragraph_index\": 0, \"chunk_indices\": [0, 5]}]\n```".to_string()),
    ]);
    let grouper = LlmGrouper::new(llm_config(2), &client).expect("grouper should build");
    let chunks = texts(&["a", "b", "c", "d", "e"]);

    let groups = grouper.group(&chunks).expect("grouping never fails");
    assert_eq!(groups, vec![vec![0], vec![1], vec![2, 3], vec![4]]);

    let prompts = client.prompts.borrow();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains(r#"["a","b"]"#));
    assert!(prompts[2].contains(r#"["e"]"#));
}

#[test]
fn llm_config_requires_api_key() {
    assert!(LlmConfig::from_args(&llm_args(None)).is_err());
    assert!(LlmConfig::from_args(&llm_args(Some("  "))).is_err());

    let config = LlmConfig::from_args(&llm_args(Some("sk-test"))).expect("config should build");
    assert_eq!(config.batch_size, 15);
    assert_eq!(config.delay, Duration::from_millis(1000));

    let mut args = llm_args(Some("sk-test"));
    args.llm_batch_size = 0;
    assert!(LlmConfig::from_args(&args).is_err());
}

#[test]
fn format_output_lists_titles_then_blank_separated_paragraphs() {
    let part = PartNode {
        title: "Part 1".to_string(),
        number: "1".to_string(),
        content: texts(&["Compliance"]),
        sections: vec![SectionNode {
            title: "1.1.".to_string(),
            number: Some("1.1".to_string()),
            content: texts(&["Application text."]),
            subsections: vec![SubsectionNode {
                title: "1.1.1.".to_string(),
                number: Some("1.1.1".to_string()),
                content: Vec::new(),
                articles: vec![ArticleNode {
                    title: "1.1.1.1.".to_string(),
                    number: Some("1.1.1.1".to_string()),
                    content: texts(&["First.", "Second."]),
                }],
            }],
        }],
    };

    assert_eq!(
        format_output(&part),
        texts(&[
            "Part 1",
            "",
            "Compliance",
            "",
            "1.1.",
            "Application text.",
            "",
            "1.1.1.",
            "1.1.1.1.",
            "First.",
            "",
            "Second.",
            "",
        ])
    );
}

#[test]
fn run_writes_text_and_json_for_located_part() {
    let dir = std::env::temp_dir().join(format!("bcextract_sections_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");

    let html = r#"<html><body>
<div class="page" id="page_1" data-page-number="1">
<p>Part 1</p><p>Compliance</p><p>1.1.</p><p>Application</p><p>1.1.1.</p><p>Scope</p>
<p>1.1.1.1.</p><p>This Part applies to</p><p>all buildings.</p><p>Fire &amp; smoke</p><p>must be controlled.</p>
</div>
<div class="page" id="page_2" data-page-number="2">
<p>Part 2</p><p>Objectives</p>
</div>
</body></html>"#;
    let html_path = dir.join("part_1_1_to_2.html");
    fs::write(&html_path, html).expect("html fixture");

    let args = SectionsArgs {
        html_files: vec![html_path],
        part: 1,
        start_page: None,
        output: dir.join("part_content.txt"),
        json: dir.join("part_sections.json"),
        merge: MergeMode::Heuristic,
        llm: llm_args(None),
    };
    run(args).expect("sections run should succeed");

    let text = fs::read_to_string(dir.join("part_content.txt")).expect("text output");
    assert!(text.starts_with("Part 1\n\n"));
    assert!(text.contains(
        "1.1.1.1.\nThis Part applies to all buildings.\n\nFire & smoke must be controlled.\n\n"
    ));
    assert!(!text.contains("Objectives"));

    let raw = fs::read_to_string(dir.join("part_sections.json")).expect("json output");
    let part: PartNode = serde_json::from_str(&raw).expect("json should parse");
    assert_eq!(
        part.sections[0].subsections[0].articles[0].number.as_deref(),
        Some("1.1.1.1")
    );

    let _ = fs::remove_dir_all(&dir);
}
