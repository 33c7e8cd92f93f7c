//! Batch command - apply one template to many PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use plx_core::models::Extraction;
use plx_core::{Template, TemplateExtractor};

use super::extract::{format_extraction, OutputFormat};
use super::{load_config, load_template};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input PDFs
    #[arg(required = true)]
    input: String,

    /// Template JSON file
    #[arg(short, long)]
    template: PathBuf,

    /// Scan for repeated records regardless of the template flag
    #[arg(long)]
    repeated: bool,

    /// Output directory
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    extraction: Option<Extraction>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl FileResult {
    fn record_count(&self) -> usize {
        match &self.extraction {
            Some(Extraction { products: Some(products), .. }) => products.len(),
            Some(_) => 1,
            None => 0,
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let template = Arc::new(load_template(&args.template, args.repeated)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(TemplateExtractor::new(config));
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let extractor = Arc::clone(&extractor);
        let template = Arc::clone(&template);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let file_start = Instant::now();
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                process_single_file(&task_path, &extractor, &template)
            })
            .await;

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            let outcome = match outcome {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("worker failed: {}", e)),
            };
            let result = match outcome {
                Ok(extraction) => FileResult {
                    path,
                    extraction: Some(extraction),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileResult {
                    path,
                    extraction: None,
                    error: Some(format!("{:#}", e)),
                    processing_time_ms,
                },
            };
            (index, result)
        });
    }

    let mut results: Vec<(usize, FileResult)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        pb.inc(1);

        if let Some(message) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", result.path.display(), message);
                tasks.abort_all();
                pb.abandon();
                anyhow::bail!("Processing failed: {}", message);
            }
        }
        results.push((index, result));
    }
    pb.finish_and_clear();

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<FileResult> = results.into_iter().map(|(_, r)| r).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Some(extraction) = &result.extraction {
                let stem = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
                fs::write(&output_path, format_extraction(extraction, args.format, true)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    extractor: &TemplateExtractor,
    template: &Template,
) -> anyhow::Result<Extraction> {
    let data = fs::read(path)?;
    Ok(extractor.extract_pdf(&data, template)?)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "records", "processing_time_ms", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let status = if result.extraction.is_some() { "success" } else { "error" };

        wtr.write_record([
            filename,
            status,
            &result.record_count().to_string(),
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
