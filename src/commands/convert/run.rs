use super::*;

pub fn run(args: ConvertArgs) -> Result<()> {
    validate_args(&args)?;

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let source = open_source(&args.input)?;
    let page_count = source
        .page_count()
        .with_context(|| format!("failed to read page count of {}", source.describe()))?;
    let last_page = args
        .max_pages
        .map(|max_pages| max_pages.min(page_count))
        .unwrap_or(page_count);

    info!(
        run_id = %run_id,
        source = %source.describe(),
        page_count,
        last_page,
        format = args.format.as_str(),
        preserve_paragraphs = args.paragraphs.preserve_paragraphs,
        "starting conversion"
    );

    let source_warnings = source.warnings();
    for warning in &source_warnings {
        warn!(warning = %warning, "decoder warning");
    }

    let strategy = ParagraphStrategy::from_args(&args.paragraphs);
    let mut sink = open_sink(&args, last_page)?;
    let pages = DecodedPages::new(source.as_ref(), last_page, args.chunk_size);
    let stats = convert_pages(pages, &strategy, sink.as_mut(), args.chunk_size)?;
    let output_files = sink.finish()?;

    info!(
        processed_pages = stats.processed_pages,
        failed_pages = stats.failed_pages.len(),
        paragraphs = stats.paragraphs,
        image_placeholders = stats.image_placeholders,
        forced_splits = stats.forced_splits,
        output_files = output_files.len(),
        "conversion complete"
    );

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = build_manifest(ManifestInputs {
            run_id,
            started_at,
            args: &args,
            page_count,
            stats,
            output_files: &output_files,
            source_warnings,
        })?;
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote conversion manifest");
    }

    Ok(())
}

pub(super) fn validate_args(args: &ConvertArgs) -> Result<()> {
    match args.format {
        OutputFormat::Html | OutputFormat::Text if args.output.is_none() => {
            bail!("--output is required for --format {}", args.format.as_str());
        }
        OutputFormat::HtmlChunks if args.chunks_dir.is_none() => {
            bail!("--chunks-dir is required for --format html-chunks");
        }
        _ => {}
    }

    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }
    if args.pages_per_chunk == 0 {
        bail!("--pages-per-chunk must be at least 1");
    }

    let paragraphs = &args.paragraphs;
    if !paragraphs.para_gap_factor.is_finite() || paragraphs.para_gap_factor < 0.0 {
        bail!(
            "--para-gap-factor must be a non-negative number, got {}",
            paragraphs.para_gap_factor
        );
    }
    if !paragraphs.para_indent_threshold.is_finite() || paragraphs.para_indent_threshold < 0.0 {
        bail!(
            "--para-indent-threshold must be a non-negative number, got {}",
            paragraphs.para_indent_threshold
        );
    }

    Ok(())
}

fn open_sink(args: &ConvertArgs, last_page: usize) -> Result<Box<dyn PageSink>> {
    match args.format {
        OutputFormat::Html => {
            let path = required_path(args.output.as_deref(), "--output")?;
            let writer = create_output_file(path)?;
            Ok(Box::new(HtmlDocumentSink::new(
                writer,
                path.to_path_buf(),
                "PDF Conversion",
            )?))
        }
        OutputFormat::Text => {
            let path = required_path(args.output.as_deref(), "--output")?;
            let writer = create_output_file(path)?;
            Ok(Box::new(TextSink::new(writer, path.to_path_buf())))
        }
        OutputFormat::HtmlChunks => {
            let dir = required_path(args.chunks_dir.as_deref(), "--chunks-dir")?;
            Ok(Box::new(HtmlChunkSink::new(
                dir,
                args.pages_per_chunk,
                last_page,
            )?))
        }
    }
}

fn required_path<'a>(path: Option<&'a Path>, flag: &str) -> Result<&'a Path> {
    match path {
        Some(path) => Ok(path),
        None => bail!("{flag} is required for this output format"),
    }
}
