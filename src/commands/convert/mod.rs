use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{ConvertArgs, OutputFormat};
use crate::decode::{DecodedPages, open_source, poppler_tool_versions};
use crate::layout::PageLayout;
use crate::model::{
    ConversionCounts, ConversionRunManifest, ConversionSettings, SourceEntry,
};
use crate::reconstruct::{
    ContentMode, PageContent, ReconstructConfig, naive_page, reconstruct_page,
};
use crate::render::{
    HTML_DOCUMENT_FOOTER, PAGE_BREAK, html_document_header, render_page_html, render_page_text,
};
use crate::util::{
    create_output_file, ensure_directory, now_utc_string, sha256_file, utc_compact_string,
    write_json_pretty,
};

mod manifest;
mod pipeline;
mod run;
mod sinks;

pub use run::run;

#[cfg(test)]
use run::validate_args;

use manifest::*;
use pipeline::*;
use sinks::*;
