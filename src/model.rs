use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdfinfo: Option<String>,
    pub pdfimages: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSettings {
    pub format: String,
    pub preserve_paragraphs: bool,
    pub para_gap_factor: f64,
    pub para_indent_threshold: f64,
    pub abbreviation_exceptions: bool,
    pub chunk_size: usize,
    pub pages_per_chunk: usize,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionCounts {
    pub page_count: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub paragraphs: usize,
    pub image_placeholders: usize,
    pub forced_splits: usize,
    pub output_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub source: SourceEntry,
    pub settings: ConversionSettings,
    pub counts: ConversionCounts,
    pub output_files: Vec<String>,
    pub failed_pages: Vec<usize>,
    pub warnings: Vec<String>,
}
