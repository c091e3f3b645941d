use super::*;

/// Destination for rendered pages. Every page is flushed as soon as it is
/// written so partial output survives an interrupted run.
pub(super) trait PageSink {
    fn write_page(&mut self, page: &PageContent) -> Result<()>;

    fn write_failed_page(&mut self, page_number: usize) -> Result<()>;

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>>;
}

pub(super) struct HtmlDocumentSink<W: Write> {
    writer: W,
    path: PathBuf,
}

impl<W: Write> HtmlDocumentSink<W> {
    pub(super) fn new(mut writer: W, path: PathBuf, title: &str) -> Result<Self> {
        writer
            .write_all(html_document_header(title).as_bytes())
            .with_context(|| format!("failed to write html header: {}", path.display()))?;
        Ok(Self { writer, path })
    }
}

impl<W: Write> PageSink for HtmlDocumentSink<W> {
    fn write_page(&mut self, page: &PageContent) -> Result<()> {
        write_and_flush(&mut self.writer, &render_page_html(page), &self.path)
    }

    fn write_failed_page(&mut self, _page_number: usize) -> Result<()> {
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<PathBuf>> {
        write_and_flush(&mut self.writer, HTML_DOCUMENT_FOOTER, &self.path)?;
        Ok(vec![self.path])
    }
}

pub(super) struct TextSink<W: Write> {
    writer: W,
    path: PathBuf,
}

impl<W: Write> TextSink<W> {
    pub(super) fn new(writer: W, path: PathBuf) -> Self {
        Self { writer, path }
    }
}

impl<W: Write> PageSink for TextSink<W> {
    fn write_page(&mut self, page: &PageContent) -> Result<()> {
        let mut text = render_page_text(page);
        text.push_str(PAGE_BREAK);
        write_and_flush(&mut self.writer, &text, &self.path)
    }

    fn write_failed_page(&mut self, _page_number: usize) -> Result<()> {
        write_and_flush(&mut self.writer, PAGE_BREAK, &self.path)
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<PathBuf>> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(vec![self.path])
    }
}

struct OpenChunk {
    index: usize,
    writer: BufWriter<File>,
    path: PathBuf,
}

/// Splits the document into standalone HTML files of `pages_per_chunk`
/// pages, named `part_{k}_{first}_to_{last}.html`.
pub(super) struct HtmlChunkSink {
    dir: PathBuf,
    pages_per_chunk: usize,
    last_page: usize,
    current: Option<OpenChunk>,
    files: Vec<PathBuf>,
}

impl HtmlChunkSink {
    pub(super) fn new(dir: &Path, pages_per_chunk: usize, last_page: usize) -> Result<Self> {
        ensure_directory(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            pages_per_chunk: pages_per_chunk.max(1),
            last_page,
            current: None,
            files: Vec::new(),
        })
    }

    fn chunk_for(&mut self, page_number: usize) -> Result<&mut OpenChunk> {
        let index = page_number.saturating_sub(1) / self.pages_per_chunk;
        if self.current.as_ref().map(|chunk| chunk.index) != Some(index) {
            self.close_current()?;
            let chunk = self.open_chunk(index)?;
            self.current = Some(chunk);
        }
        self.current.as_mut().context("html chunk file is not open")
    }

    fn open_chunk(&self, index: usize) -> Result<OpenChunk> {
        let (first, last) = chunk_page_range(index, self.pages_per_chunk, self.last_page);
        let path = self
            .dir
            .join(format!("part_{}_{}_to_{}.html", index + 1, first, last));
        info!(chunk = index + 1, first_page = first, last_page = last, path = %path.display(), "opening html chunk");

        let mut writer = create_output_file(&path)?;
        let title = format!("PDF Chunk {}: Pages {}-{}", index + 1, first, last);
        write_and_flush(&mut writer, &html_document_header(&title), &path)?;
        Ok(OpenChunk {
            index,
            writer,
            path,
        })
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(mut chunk) = self.current.take() {
            write_and_flush(&mut chunk.writer, HTML_DOCUMENT_FOOTER, &chunk.path)?;
            self.files.push(chunk.path);
        }
        Ok(())
    }
}

impl PageSink for HtmlChunkSink {
    fn write_page(&mut self, page: &PageContent) -> Result<()> {
        let chunk = self.chunk_for(page.page_number)?;
        write_and_flush(&mut chunk.writer, &render_page_html(page), &chunk.path)
    }

    fn write_failed_page(&mut self, page_number: usize) -> Result<()> {
        self.chunk_for(page_number)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<PathBuf>> {
        self.close_current()?;
        Ok(self.files)
    }
}

pub(super) fn chunk_page_range(
    index: usize,
    pages_per_chunk: usize,
    last_page: usize,
) -> (usize, usize) {
    let first = index * pages_per_chunk + 1;
    let last = (first + pages_per_chunk - 1).min(last_page.max(first));
    (first, last)
}

fn write_and_flush<W: Write>(writer: &mut W, content: &str, path: &Path) -> Result<()> {
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))
}
