use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::warn;

use super::PageSource;
use crate::layout::{BBox, Block, Line, PageLayout, TextSpan};
use crate::model::ToolVersions;

/// Decodes pages through the poppler command line tools: `pdfinfo` for the
/// page count, `pdftotext -bbox-layout` for block/line/word geometry and,
/// when installed, `pdfimages -list` for image placeholders.
pub struct PopplerSource {
    pdf_path: PathBuf,
    images_enabled: bool,
    parser: BboxLayoutParser,
}

impl PopplerSource {
    pub fn new(pdf_path: &Path) -> Result<Self> {
        if !command_available("pdftotext") {
            bail!("pdftotext is required to decode {}", pdf_path.display());
        }

        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            images_enabled: command_available("pdfimages"),
            parser: BboxLayoutParser::new()?,
        })
    }
}

impl PageSource for PopplerSource {
    fn describe(&self) -> String {
        self.pdf_path.display().to_string()
    }

    fn page_count(&self) -> Result<usize> {
        let pdf_arg = self.pdf_path.to_string_lossy().to_string();
        let info = run_tool("pdfinfo", &[pdf_arg.as_str()])?;
        parse_pdfinfo_page_count(&info)
            .with_context(|| format!("pdfinfo reported no page count for {}", self.describe()))
    }

    fn decode_pages(&self, first: usize, last: usize) -> Result<Vec<PageLayout>> {
        let first_arg = first.to_string();
        let last_arg = last.to_string();
        let pdf_arg = self.pdf_path.to_string_lossy().to_string();

        let xhtml = run_tool(
            "pdftotext",
            &[
                "-bbox-layout",
                "-enc",
                "UTF-8",
                "-f",
                first_arg.as_str(),
                "-l",
                last_arg.as_str(),
                pdf_arg.as_str(),
                "-",
            ],
        )?;
        let mut pages = self.parser.parse(&xhtml, first);

        if self.images_enabled {
            let listing = run_tool(
                "pdfimages",
                &[
                    "-list",
                    "-f",
                    first_arg.as_str(),
                    "-l",
                    last_arg.as_str(),
                    pdf_arg.as_str(),
                ],
            );
            // text survives a failed image listing
            let image_counts = match listing {
                Ok(listing) => parse_pdfimages_listing(&listing),
                Err(error) => {
                    warn!(first_page = first, last_page = last, error = %error, "pdfimages failed; no image placeholders for batch");
                    HashMap::new()
                }
            };
            for page in &mut pages {
                let count = image_counts.get(&page.page_number).copied().unwrap_or(0);
                page.blocks.extend((0..count).map(|_| Block::Image {
                    bbox: BBox::default(),
                }));
            }
        }

        Ok(pages)
    }

    fn warnings(&self) -> Vec<String> {
        if self.images_enabled {
            Vec::new()
        } else {
            vec!["pdfimages unavailable; image blocks will not produce placeholders".to_string()]
        }
    }
}

/// Regex-driven reader for the XHTML emitted by `pdftotext -bbox-layout`.
struct BboxLayoutParser {
    element_regex: Regex,
    attribute_regex: Regex,
}

impl BboxLayoutParser {
    fn new() -> Result<Self> {
        Ok(Self {
            element_regex: Regex::new(
                r"(?s)<word\b[^>]*>(.*?)</word>|<(/?)(page|block|line)\b([^>]*?)/?>",
            )
            .context("failed to compile bbox element regex")?,
            attribute_regex: Regex::new(r#"([A-Za-z]+)="([^"]*)""#)
                .context("failed to compile bbox attribute regex")?,
        })
    }

    fn parse(&self, xhtml: &str, first_page: usize) -> Vec<PageLayout> {
        let mut pages = Vec::<PageLayout>::new();
        let mut current_lines: Option<Vec<Line>> = None;
        let mut current_line: Option<Line> = None;

        for captures in self.element_regex.captures_iter(xhtml) {
            if let Some(word) = captures.get(1) {
                let Some(line) = current_line.as_mut() else {
                    continue;
                };
                let text = decode_entities(word.as_str());
                if text.is_empty() {
                    continue;
                }
                let text = if line.spans.is_empty() {
                    text
                } else {
                    format!(" {text}")
                };
                line.spans.push(TextSpan { text });
                continue;
            }

            let closing = captures.get(2).is_some_and(|m| !m.as_str().is_empty());
            let element = captures.get(3).map(|m| m.as_str()).unwrap_or("");
            let attributes = captures.get(4).map(|m| m.as_str()).unwrap_or("");

            match (element, closing) {
                ("page", false) => {
                    let attrs = self.attributes(attributes);
                    pages.push(PageLayout {
                        page_number: first_page + pages.len(),
                        width: attr_f64(&attrs, "width"),
                        height: attr_f64(&attrs, "height"),
                        blocks: Vec::new(),
                    });
                }
                ("block", false) => current_lines = Some(Vec::new()),
                ("block", true) => {
                    if let (Some(lines), Some(page)) = (current_lines.take(), pages.last_mut()) {
                        page.blocks.push(Block::Text { lines });
                    }
                }
                ("line", false) => {
                    let attrs = self.attributes(attributes);
                    current_line = Some(Line {
                        bbox: BBox::new(
                            attr_f64(&attrs, "xMin"),
                            attr_f64(&attrs, "yMin"),
                            attr_f64(&attrs, "xMax"),
                            attr_f64(&attrs, "yMax"),
                        ),
                        spans: Vec::new(),
                    });
                }
                ("line", true) => {
                    if let (Some(line), Some(lines)) = (current_line.take(), current_lines.as_mut())
                    {
                        lines.push(line);
                    }
                }
                _ => {}
            }
        }

        pages
    }

    fn attributes<'a>(&self, raw: &'a str) -> HashMap<&'a str, &'a str> {
        self.attribute_regex
            .captures_iter(raw)
            .filter_map(|captures| {
                let name = captures.get(1)?.as_str();
                let value = captures.get(2)?.as_str();
                Some((name, value))
            })
            .collect()
    }
}

fn attr_f64(attributes: &HashMap<&str, &str>, name: &str) -> f64 {
    attributes
        .get(name)
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .replace('\u{0000}', "")
        .trim()
        .to_string()
}

fn parse_pdfinfo_page_count(info: &str) -> Option<usize> {
    info.lines().find_map(|line| {
        line.strip_prefix("Pages:")
            .and_then(|value| value.trim().parse::<usize>().ok())
    })
}

/// Counts `image` rows per page; masks are not separate pictures.
fn parse_pdfimages_listing(listing: &str) -> HashMap<usize, usize> {
    let mut counts = HashMap::<usize, usize>::new();
    for row in listing.lines() {
        let mut columns = row.split_whitespace();
        let Some(page_number) = columns.next().and_then(|value| value.parse::<usize>().ok())
        else {
            continue;
        };
        let kind = columns.nth(1).unwrap_or("");
        if kind == "image" {
            *counts.entry(page_number).or_insert(0) += 1;
        }
    }
    counts
}

fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}

fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} returned non-zero exit status: {}",
            program,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn command_version_optional(program: &str) -> Option<String> {
    let output = Command::new(program).arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub fn poppler_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version_optional("pdftotext"),
        pdfinfo: command_version_optional("pdfinfo"),
        pdfimages: command_version_optional("pdfimages"),
    }
}
