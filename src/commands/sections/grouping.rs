use super::*;

/// Decides which consecutive text chunks belong to the same paragraph.
pub(super) trait ParagraphGrouper {
    fn name(&self) -> &'static str;

    /// Groups of chunk indices; each group becomes one paragraph.
    fn group(&self, chunks: &[String]) -> Result<Vec<Vec<usize>>>;
}

pub(super) fn merge_chunks(grouper: &dyn ParagraphGrouper, chunks: &[String]) -> Result<Vec<String>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let groups = sanitize_groups(&grouper.group(chunks)?, chunks.len());
    Ok(groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|&index| chunks[index].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

/// Normalizes grouper output into contiguous runs that cover every chunk
/// exactly once, in order. Out-of-range indices are ignored, a chunk claimed
/// twice stays with its first group and unclaimed chunks stand alone.
pub(super) fn sanitize_groups(groups: &[Vec<usize>], len: usize) -> Vec<Vec<usize>> {
    let mut owner: Vec<Option<usize>> = vec![None; len];
    for (group_id, group) in groups.iter().enumerate() {
        for &index in group {
            if let Some(slot) = owner.get_mut(index) {
                slot.get_or_insert(group_id);
            }
        }
    }

    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut previous_owner = None;
    for (index, current) in owner.into_iter().enumerate() {
        let continues_run = current.is_some() && current == previous_owner;
        previous_owner = current;
        match runs.last_mut() {
            Some(run) if continues_run => run.push(index),
            _ => runs.push(vec![index]),
        }
    }
    runs
}

/// One paragraph per chunk.
pub(super) struct PassthroughGrouper;

impl ParagraphGrouper for PassthroughGrouper {
    fn name(&self) -> &'static str {
        "none"
    }

    fn group(&self, chunks: &[String]) -> Result<Vec<Vec<usize>>> {
        Ok((0..chunks.len()).map(|index| vec![index]).collect())
    }
}

/// Rule-based grouping: headings and numbered titles stand alone, list items
/// open a paragraph, and a capitalized chunk after a finished sentence opens
/// a paragraph. Everything else continues the current paragraph.
pub(super) struct HeuristicGrouper {
    headings: Vec<Regex>,
    numbered_title: Regex,
    list_item: Regex,
}

impl HeuristicGrouper {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            headings: vec![
                compile(r"^\d+\.\d+\.\d+\.\d+\.?$")?,
                compile(r"^Article \d+\.\d+\.\d+\.\d+")?,
                compile(r"^Section \d+\.\d+\.\d+")?,
                compile(r"^\d+\.\d+\.\d+(\.\d+)?\.?")?,
            ],
            numbered_title: compile(r"^\d+\.\d+(\.\d+)*\.?\s+\S")?,
            list_item: compile(r"^(\d+\)|\w+\))\s+\S")?,
        })
    }

    fn is_heading(&self, chunk: &str) -> bool {
        self.headings.iter().any(|pattern| pattern.is_match(chunk))
            || self.numbered_title.is_match(chunk)
    }

    fn opens_sentence_paragraph(previous: &str, chunk: &str) -> bool {
        ends_sentence(previous, true) && chunk.chars().next().is_some_and(char::is_uppercase)
    }
}

impl ParagraphGrouper for HeuristicGrouper {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn group(&self, chunks: &[String]) -> Result<Vec<Vec<usize>>> {
        let mut groups = Vec::new();
        let mut current: Vec<usize> = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            if self.is_heading(chunk) {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                groups.push(vec![index]);
                continue;
            }

            let opens_paragraph = self.list_item.is_match(chunk)
                || current
                    .last()
                    .is_some_and(|&previous| Self::opens_sentence_paragraph(&chunks[previous], chunk));
            if opens_paragraph && !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.push(index);
        }

        if !current.is_empty() {
            groups.push(current);
        }
        Ok(groups)
    }
}

pub(super) fn build_grouper(mode: MergeMode, llm: &LlmArgs) -> Result<Box<dyn ParagraphGrouper>> {
    Ok(match mode {
        MergeMode::Heuristic => Box::new(HeuristicGrouper::new()?),
        MergeMode::None => Box::new(PassthroughGrouper),
        MergeMode::Llm => {
            let config = LlmConfig::from_args(llm)?;
            let client = HttpCompletionClient::new(&config)?;
            Box::new(LlmGrouper::new(config, client)?)
        }
    })
}
