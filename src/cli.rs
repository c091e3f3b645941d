use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "bcextract",
    version,
    about = "Building code PDF extraction: paragraph-preserving conversion and section segmentation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a PDF (or layout JSON) to HTML or plain text
    Convert(ConvertArgs),
    /// Dump the decoded page layout as JSON
    Layout(LayoutArgs),
    /// Segment converted HTML into a part/section/subsection/article tree
    Sections(SectionsArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Text,
    HtmlChunks,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::HtmlChunks => "html-chunks",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParagraphArgs {
    #[arg(long, default_value_t = false)]
    pub preserve_paragraphs: bool,

    /// A vertical gap above this many line heights starts a new paragraph
    #[arg(long, default_value_t = 1.5)]
    pub para_gap_factor: f64,

    /// An indent beyond this many pixels starts a new paragraph
    #[arg(long, default_value_t = 10.0)]
    pub para_indent_threshold: f64,

    #[arg(long, default_value_t = false)]
    pub abbreviation_exceptions: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    #[arg(short = 'c', long)]
    pub chunks_dir: Option<PathBuf>,

    #[arg(short = 'p', long, default_value_t = 50)]
    pub pages_per_chunk: usize,

    /// Pages decoded per batch (memory control)
    #[arg(long, default_value_t = 10)]
    pub chunk_size: usize,

    #[arg(long)]
    pub max_pages: Option<usize>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[command(flatten)]
    pub paragraphs: ParagraphArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub chunk_size: usize,

    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum MergeMode {
    Heuristic,
    Llm,
    None,
}

impl MergeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Llm => "llm",
            Self::None => "none",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SectionsArgs {
    #[arg(long = "html", required = true, num_args = 1..)]
    pub html_files: Vec<PathBuf>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..100))]
    pub part: u32,

    /// Start at this page instead of searching for part markers
    #[arg(long)]
    pub start_page: Option<usize>,

    #[arg(long, default_value = "part_content.txt")]
    pub output: PathBuf,

    #[arg(long, default_value = "part_sections.json")]
    pub json: PathBuf,

    #[arg(long, value_enum, default_value_t = MergeMode::Heuristic)]
    pub merge: MergeMode,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub llm_model: String,

    #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
    pub llm_endpoint: String,

    #[arg(long, default_value_t = 15)]
    pub llm_batch_size: usize,

    #[arg(long, default_value_t = 1000)]
    pub llm_delay_ms: u64,

    #[arg(long, default_value_t = 0.3)]
    pub llm_temperature: f64,

    #[arg(long, default_value_t = 60)]
    pub llm_timeout_secs: u64,
}
