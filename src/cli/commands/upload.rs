use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use super::load_context;
use crate::cli::output::{UploadFailure, UploadReport, get_formatter};
use crate::models::OutputFormat;
use crate::utils::{collect_pdf_files, elapsed_ms};

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(required = true, help = "PDF files or directories to upload")]
    pub paths: Vec<PathBuf>,

    #[arg(long, short = 'e', help = "Glob patterns to exclude (repeatable)")]
    pub exclude: Vec<String>,
}

pub async fn handle_upload(args: UploadArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    let mut files = Vec::new();
    for path in &args.paths {
        if !path.exists() {
            anyhow::bail!("path does not exist: {}", path.display());
        }
        let found = collect_pdf_files(path, &args.exclude)
            .with_context(|| format!("failed to scan {}", path.display()))?;
        files.extend(found);
    }

    if files.is_empty() {
        eprintln!("{}", formatter.format_message("No PDF files found."));
        return Ok(());
    }

    let ctx = load_context().await?;
    let service = ctx.upload_service();
    let start = Instant::now();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut report = UploadReport::default();
    for file in &files {
        pb.set_message(file.display().to_string());
        match service.upload_path(file).await {
            Ok(receipt) => {
                if verbose {
                    pb.println(format!("Uploaded {}", file.display()));
                }
                report.uploaded.push(receipt);
            }
            Err(e) => report.failed.push(UploadFailure {
                path: file.display().to_string(),
                error: e.to_string(),
            }),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    report.duration_ms = elapsed_ms(start);
    print!("{}", formatter.format_uploads(&report));

    if report.uploaded.is_empty() {
        anyhow::bail!("no files were uploaded");
    }
    Ok(())
}
