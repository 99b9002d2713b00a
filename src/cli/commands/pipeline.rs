//! Stage commands and `update`, all driven through the pipeline.

use crate::book::{polish_dir, ExportFormat};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{PolishSettings, Settings};
use crate::orchestrator::{Pipeline, PipelineOptions, PipelineReport, Stage, StageSelection};
use anyhow::{Context, Result};
use std::path::Path;

/// Preflight checks for the stages about to run.
fn check_stages(options: &PipelineOptions, settings: &Settings) -> Result<()> {
    let stages = &options.stages;
    if stages.runs(Stage::Fetch) {
        preflight::check(Operation::Fetch, settings)?;
    }
    if stages.runs(Stage::Enrich) && preflight::check(Operation::Enrich, settings).is_err() {
        Output::warning("yt-dlp not found; metadata lookups will be skipped.");
    }
    let exports = options
        .formats
        .as_ref()
        .map(|f| !f.is_empty())
        .unwrap_or(!settings.book.export_formats.is_empty());
    if stages.runs(Stage::Export) && exports {
        preflight::check(Operation::Export, settings)?;
    }
    Ok(())
}

/// Run the pipeline for `slug` and print a summary.
pub async fn run_pipeline(slug: &str, options: PipelineOptions, settings: Settings) -> Result<PipelineReport> {
    check_stages(&options, &settings)?;

    let stages: Vec<String> = options.stages.stages().iter().map(Stage::to_string).collect();
    Output::info(&format!("Series '{}': {}", slug, stages.join(" → ")));

    let pipeline = Pipeline::new(settings, slug)?;
    let report = pipeline
        .run(&options)
        .await
        .with_context(|| format!("pipeline failed for series '{slug}'"))?;

    Output::report(&report);
    if report.placeholders > 0 {
        Output::warning(&format!(
            "{} talk(s) have no transcript yet; their chapters are placeholders.",
            report.placeholders
        ));
    }
    Output::success("Done.");
    Ok(report)
}

/// Run one stage.
pub async fn run_stage(slug: &str, stage: Stage, settings: Settings) -> Result<()> {
    let options = PipelineOptions {
        stages: StageSelection::only(stage),
        ..Default::default()
    };
    run_pipeline(slug, options, settings).await.map(|_| ())
}

/// `talkbook fetch`.
pub async fn run_fetch(slug: &str, videos: Vec<String>, limit: Option<usize>, settings: Settings) -> Result<()> {
    let options = PipelineOptions {
        stages: StageSelection::only(Stage::Fetch),
        videos: normalize_video_ids(videos)?,
        limit,
        ..Default::default()
    };
    run_pipeline(slug, options, settings).await.map(|_| ())
}

/// `talkbook ingest`.
pub async fn run_ingest(slug: &str, overwrite: bool, settings: Settings) -> Result<()> {
    let options = PipelineOptions {
        stages: StageSelection::only(Stage::Ingest),
        overwrite,
        ..Default::default()
    };
    run_pipeline(slug, options, settings).await.map(|_| ())
}

/// `talkbook polish`, optionally for a single file.
pub async fn run_polish(slug: &str, file: Option<&Path>, settings: Settings) -> Result<()> {
    let Some(file) = file else {
        return run_stage(slug, Stage::Polish, settings).await;
    };
    if !file.is_file() {
        anyhow::bail!("no such chapter file: {}", file.display());
    }
    let series = settings.series(slug)?;
    let content_dir = settings.series_paths(series).content_dir();
    polish_one(&content_dir, file, &settings.polish)
}

fn polish_one(content_dir: &Path, file: &Path, settings: &PolishSettings) -> Result<()> {
    let report = polish_dir(content_dir, Some(file), settings)?;
    if report.polished > 0 {
        Output::success(&format!("Polished {}", file.display()));
    } else if report.placeholders > 0 {
        Output::info("Placeholder chapter left unchanged.");
    } else {
        Output::info("Already polished.");
    }
    Ok(())
}

/// `talkbook export`.
pub async fn run_export(slug: &str, formats: &[String], settings: Settings) -> Result<()> {
    let formats = if formats.is_empty() {
        None
    } else {
        Some(
            formats
                .iter()
                .map(|f| f.parse::<ExportFormat>())
                .collect::<std::result::Result<Vec<_>, _>>()?,
        )
    };
    let options = PipelineOptions {
        stages: StageSelection::only(Stage::Export),
        formats,
        ..Default::default()
    };
    let report = run_pipeline(slug, options, settings).await?;
    if report.exported.is_empty() {
        Output::info("Nothing exported. Pass --format or set book.export_formats.");
    }
    Ok(())
}

/// Flags of `talkbook update`.
#[derive(Debug, Default)]
pub struct UpdateOptions {
    pub skip: Vec<Stage>,
    pub only: Option<Stage>,
    pub videos: Vec<String>,
    pub limit: Option<usize>,
    pub overwrite: bool,
}

/// `talkbook update`: every stage, honoring skip/only flags.
pub async fn run_update(slug: &str, update: UpdateOptions, settings: Settings) -> Result<()> {
    let stages = match update.only {
        Some(stage) => StageSelection::only(stage),
        None => StageSelection::skipping(update.skip),
    };
    let options = PipelineOptions {
        stages,
        videos: normalize_video_ids(update.videos)?,
        limit: update.limit,
        overwrite: update.overwrite,
        formats: None,
    };
    run_pipeline(slug, options, settings).await.map(|_| ())
}

/// Accept URLs or bare ids for `--video`.
fn normalize_video_ids(videos: Vec<String>) -> Result<Vec<String>> {
    videos
        .into_iter()
        .map(|v| {
            crate::youtube::extract_video_id(&v)
                .ok_or_else(|| anyhow::anyhow!("not a video id or URL: {v}"))
        })
        .collect()
}
