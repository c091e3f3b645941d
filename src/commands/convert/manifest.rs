use super::*;

pub(super) const MANIFEST_VERSION: u32 = 1;

pub(super) fn render_convert_command(args: &ConvertArgs) -> String {
    let mut command = vec![
        "bcextract".to_string(),
        "convert".to_string(),
        args.input.display().to_string(),
        "--format".to_string(),
        args.format.as_str().to_string(),
    ];

    if let Some(path) = &args.output {
        command.push("--output".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.chunks_dir {
        command.push("--chunks-dir".to_string());
        command.push(path.display().to_string());
        command.push("--pages-per-chunk".to_string());
        command.push(args.pages_per_chunk.to_string());
    }
    command.push("--chunk-size".to_string());
    command.push(args.chunk_size.to_string());
    if let Some(max_pages) = args.max_pages {
        command.push("--max-pages".to_string());
        command.push(max_pages.to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }

    let paragraphs = &args.paragraphs;
    if paragraphs.preserve_paragraphs {
        command.push("--preserve-paragraphs".to_string());
        command.push("--para-gap-factor".to_string());
        command.push(paragraphs.para_gap_factor.to_string());
        command.push("--para-indent-threshold".to_string());
        command.push(paragraphs.para_indent_threshold.to_string());
        if paragraphs.abbreviation_exceptions {
            command.push("--abbreviation-exceptions".to_string());
        }
    }

    command.join(" ")
}

pub(super) fn conversion_settings(args: &ConvertArgs) -> ConversionSettings {
    ConversionSettings {
        format: args.format.as_str().to_string(),
        preserve_paragraphs: args.paragraphs.preserve_paragraphs,
        para_gap_factor: args.paragraphs.para_gap_factor,
        para_indent_threshold: args.paragraphs.para_indent_threshold,
        abbreviation_exceptions: args.paragraphs.abbreviation_exceptions,
        chunk_size: args.chunk_size,
        pages_per_chunk: args.pages_per_chunk,
        max_pages: args.max_pages,
    }
}

pub(super) struct ManifestInputs<'a> {
    pub(super) run_id: String,
    pub(super) started_at: String,
    pub(super) args: &'a ConvertArgs,
    pub(super) page_count: usize,
    pub(super) stats: ConversionStats,
    pub(super) output_files: &'a [PathBuf],
    pub(super) source_warnings: Vec<String>,
}

pub(super) fn build_manifest(inputs: ManifestInputs<'_>) -> Result<ConversionRunManifest> {
    let ManifestInputs {
        run_id,
        started_at,
        args,
        page_count,
        stats,
        output_files,
        source_warnings,
    } = inputs;

    let source = SourceEntry {
        path: args.input.display().to_string(),
        sha256: sha256_file(&args.input)?,
        page_count,
    };

    let counts = ConversionCounts {
        page_count,
        processed_pages: stats.processed_pages,
        failed_pages: stats.failed_pages.len(),
        paragraphs: stats.paragraphs,
        image_placeholders: stats.image_placeholders,
        forced_splits: stats.forced_splits,
        output_files: output_files.len(),
    };

    let status = if stats.failed_pages.is_empty() {
        "completed"
    } else {
        "completed_with_page_failures"
    };

    let mut warnings = source_warnings;
    warnings.extend(stats.warnings);

    Ok(ConversionRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_convert_command(args),
        tool_versions: poppler_tool_versions(),
        source,
        settings: conversion_settings(args),
        counts,
        output_files: output_files
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        failed_pages: stats.failed_pages,
        warnings,
    })
}
