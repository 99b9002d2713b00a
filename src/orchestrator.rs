//! Pipeline orchestrator for Talkbook.
//!
//! Runs the stages discover, fetch, enrich, ingest, polish, build and export
//! for one series. The series record is saved after every stage that changes
//! it, so a failure late in the run never loses earlier work.

use crate::book::{
    assemble, export, ingest, load_metadata_file, polish_dir, BookMetadata, ExportFormat,
};
use crate::config::{SeriesConfig, Settings};
use crate::enrich::{enrich_record, EnrichReport, MetadataSource, YtDlpMetadata};
use crate::error::{Result, TalkbookError};
use crate::fetch::{Fetcher, VideoRef};
use crate::http::HttpClient;
use crate::series::{SeriesPaths, SeriesRecord, Talk, VideoEntry, VideoList};
use crate::youtube::{split_title_and_speaker, watch_url, Discovery};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Speaker used when a video title names nobody.
pub const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Stage {
    Discover,
    Fetch,
    Enrich,
    Ingest,
    Polish,
    Build,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Discover,
        Stage::Fetch,
        Stage::Enrich,
        Stage::Ingest,
        Stage::Polish,
        Stage::Build,
        Stage::Export,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Discover => "discover",
            Stage::Fetch => "fetch",
            Stage::Enrich => "enrich",
            Stage::Ingest => "ingest",
            Stage::Polish => "polish",
            Stage::Build => "build",
            Stage::Export => "export",
        };
        f.write_str(s)
    }
}

/// Which stages a run executes.
#[derive(Debug, Clone, Default)]
pub struct StageSelection {
    only: Option<Stage>,
    skip: HashSet<Stage>,
}

impl StageSelection {
    /// Every stage.
    pub fn all() -> Self {
        Self::default()
    }

    /// Just one stage.
    pub fn only(stage: Stage) -> Self {
        Self {
            only: Some(stage),
            skip: HashSet::new(),
        }
    }

    /// Every stage except the given ones.
    pub fn skipping(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            only: None,
            skip: stages.into_iter().collect(),
        }
    }

    pub fn runs(&self, stage: Stage) -> bool {
        match self.only {
            Some(only) => only == stage,
            None => !self.skip.contains(&stage),
        }
    }

    /// Selected stages in execution order.
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ALL.into_iter().filter(|s| self.runs(*s)).collect()
    }
}

/// Options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub stages: StageSelection,
    /// Restrict fetching to these video ids (fetched even if a transcript exists).
    pub videos: Vec<String>,
    /// Fetch at most this many videos.
    pub limit: Option<usize>,
    /// Regenerate chapter files that already exist.
    pub overwrite: bool,
    /// Export formats; `None` uses `[book].export_formats`.
    pub formats: Option<Vec<ExportFormat>>,
}

/// What a pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub videos_discovered: usize,
    pub videos_fetched: usize,
    pub transcripts_found: usize,
    /// Talks in the record that still have no transcript.
    pub placeholders: usize,
    pub enrich: Option<EnrichReport>,
    pub chapters_written: usize,
    pub chapters_polished: usize,
    pub book_path: Option<PathBuf>,
    pub book_chapters: usize,
    pub exported: Vec<PathBuf>,
}

/// One series' pipeline with its collaborators.
pub struct Pipeline {
    settings: Settings,
    series: SeriesConfig,
    paths: SeriesPaths,
    http: HttpClient,
    fetcher: Fetcher,
    metadata: Box<dyn MetadataSource>,
}

impl Pipeline {
    /// Build the standard pipeline for a configured series.
    pub fn new(settings: Settings, slug: &str) -> Result<Self> {
        let series = settings.series(slug)?.clone();
        let paths = settings.series_paths(&series);
        let http = HttpClient::new(&settings.youtube)?;
        let fetcher = Fetcher::from_settings(&settings, &paths, http.clone())?;
        let metadata = Box::new(YtDlpMetadata::new(&settings));
        Self::with_components(settings, series, http, fetcher, metadata)
    }

    /// Build a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        series: SeriesConfig,
        http: HttpClient,
        fetcher: Fetcher,
        metadata: Box<dyn MetadataSource>,
    ) -> Result<Self> {
        let paths = settings.series_paths(&series);
        paths.ensure()?;
        Ok(Self {
            settings,
            series,
            paths,
            http,
            fetcher,
            metadata,
        })
    }

    pub fn paths(&self) -> &SeriesPaths {
        &self.paths
    }

    pub fn series(&self) -> &SeriesConfig {
        &self.series
    }

    fn load_record(&self) -> Result<SeriesRecord> {
        let mut record = SeriesRecord::load_or_new(&self.paths.talks_path(), &self.series.slug)?;
        if record.series.is_empty() {
            record.series = self.series.slug.clone();
        }
        Ok(record)
    }

    /// Run the selected stages in order.
    #[instrument(skip_all, fields(series = %self.series.slug))]
    pub async fn run(&self, options: &PipelineOptions) -> Result<PipelineReport> {
        let stages = &options.stages;
        let mut report = PipelineReport::default();
        let mut record = self.load_record()?;
        let mut videos: Option<Vec<VideoEntry>> = None;

        if stages.runs(Stage::Discover) {
            let list = self.discover(&mut record).await?;
            report.videos_discovered = list.videos.len();
            videos = Some(list.videos);
        }

        if stages.runs(Stage::Fetch) {
            let candidates = match videos.take() {
                Some(v) => v,
                None => self.known_videos(&record),
            };
            let (fetched, found) = self
                .fetch(&mut record, candidates, &options.videos, options.limit)
                .await?;
            report.videos_fetched = fetched;
            report.transcripts_found = found;
            record.save(&self.paths.talks_path())?;
        }

        if stages.runs(Stage::Enrich) {
            let enriched = enrich_record(&mut record, self.metadata.as_ref(), self.http.base_url()).await;
            if enriched.changes() > 0 {
                record.save(&self.paths.talks_path())?;
            }
            report.enrich = Some(enriched);
        }

        if stages.runs(Stage::Ingest) {
            let ingested = ingest(
                &mut record,
                &self.paths.content_dir(),
                &self.settings.book,
                options.overwrite,
                self.http.base_url(),
            )?;
            record.save(&self.paths.talks_path())?;
            report.chapters_written = ingested.written.len();
        }

        if stages.runs(Stage::Polish) {
            let polished = polish_dir(&self.paths.content_dir(), None, &self.settings.polish)?;
            report.chapters_polished = polished.polished;
        }

        if stages.runs(Stage::Build) {
            let meta = self.book_metadata(&record)?;
            let built = assemble(&self.paths.content_dir(), &self.paths.book_path(), &meta)?;
            report.book_chapters = built.chapters;
            report.book_path = Some(built.path);
        }

        if stages.runs(Stage::Export) {
            let formats = match &options.formats {
                Some(formats) => formats.clone(),
                None => self.configured_formats()?,
            };
            if formats.is_empty() {
                info!("no export formats configured");
            } else {
                let meta = self.book_metadata(&record)?;
                report.exported = export(
                    &self.settings.tools.pandoc,
                    &self.paths.book_path(),
                    &formats,
                    &meta,
                )
                .await?;
            }
        }

        report.placeholders = record.talks.iter().filter(|t| t.needs_placeholder()).count();
        Ok(report)
    }

    /// Resolve and list the playlist, falling back to the saved `videos.json`.
    #[instrument(skip_all)]
    pub async fn discover(&self, record: &mut SeriesRecord) -> Result<VideoList> {
        let discovery = Discovery::new(self.http.clone(), &self.settings.tools);
        let listed = async {
            let playlist_id = discovery.resolve_playlist(&self.series).await?;
            let videos = discovery.playlist_videos(&playlist_id).await?;
            Ok::<_, TalkbookError>(VideoList {
                playlist_id,
                videos,
            })
        }
        .await;

        let videos_path = self.paths.videos_path();
        match listed {
            Ok(list) => {
                list.save(&videos_path)?;
                if record.playlist_id.as_deref() != Some(list.playlist_id.as_str()) {
                    record.playlist_id = Some(list.playlist_id.clone());
                    record.save(&self.paths.talks_path())?;
                }
                info!(count = list.videos.len(), playlist = %list.playlist_id, "discovered videos");
                Ok(list)
            }
            Err(e) if videos_path.exists() => {
                warn!(error = %e, "discovery failed, using saved video list");
                VideoList::load(&videos_path)
            }
            Err(e) => Err(e),
        }
    }

    /// Videos from `videos.json`, else the talks already in the record.
    fn known_videos(&self, record: &SeriesRecord) -> Vec<VideoEntry> {
        match VideoList::load(&self.paths.videos_path()) {
            Ok(list) => list.videos,
            Err(_) => record
                .talks
                .iter()
                .filter_map(|t| {
                    let id = t.video_id.clone()?;
                    Some(VideoEntry {
                        url: t
                            .watch_url(self.http.base_url())
                            .unwrap_or_else(|| watch_url(self.http.base_url(), &id)),
                        title: format!("{} by {}", t.title, t.speaker),
                        video_id: id,
                    })
                })
                .collect(),
        }
    }

    fn talk_for(&self, entry: &VideoEntry) -> Talk {
        let (title, speaker) = split_title_and_speaker(&entry.title, Some(&self.series.title));
        let title = if title.is_empty() {
            entry.video_id.clone()
        } else {
            title
        };
        let mut talk = Talk::new(speaker.unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()), title);
        talk.video_id = Some(entry.video_id.clone());
        talk.source_url = Some(entry.url.clone()).filter(|u| !u.is_empty());
        talk
    }

    /// Fetch transcripts, one video at a time, and merge them into `record`.
    ///
    /// Without `only`, videos whose talk already has a transcript are skipped.
    /// `limit` caps how many videos are tried; ids named in `only` are always tried.
    /// Returns `(videos fetched, transcripts found)`.
    #[instrument(skip_all)]
    pub async fn fetch(
        &self,
        record: &mut SeriesRecord,
        candidates: Vec<VideoEntry>,
        only: &[String],
        limit: Option<usize>,
    ) -> Result<(usize, usize)> {
        let have_transcript: HashSet<String> = record
            .talks
            .iter()
            .filter(|t| !t.needs_placeholder())
            .filter_map(|t| t.video_id.clone())
            .collect();

        let mut queue: Vec<VideoEntry> = if only.is_empty() {
            candidates
                .into_iter()
                .filter(|v| !have_transcript.contains(&v.video_id))
                .collect()
        } else {
            let mut by_id: BTreeMap<String, VideoEntry> = candidates
                .into_iter()
                .map(|v| (v.video_id.clone(), v))
                .collect();
            only.iter()
                .map(|id| {
                    by_id.remove(id).unwrap_or_else(|| VideoEntry {
                        video_id: id.clone(),
                        title: String::new(),
                        url: watch_url(self.http.base_url(), id),
                    })
                })
                .collect()
        };

        if let Some(limit) = limit.filter(|_| only.is_empty()) {
            queue.truncate(limit);
        }
        if queue.is_empty() {
            info!("nothing to fetch");
            return Ok((0, 0));
        }
        info!(videos = queue.len(), strategies = ?self.fetcher.strategy_names(), "fetching transcripts");

        let pb = ProgressBar::new(queue.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Fetching  [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| TalkbookError::Config(e.to_string()))?
                .progress_chars("█▓░"),
        );

        let sleep = Duration::from_millis(self.settings.fetch.sleep_ms);
        let mut found = 0;
        let mut fetched_talks = Vec::with_capacity(queue.len());

        for (i, entry) in queue.iter().enumerate() {
            if i > 0 && !sleep.is_zero() {
                tokio::time::sleep(sleep).await;
            }
            pb.set_message(entry.video_id.clone());

            let result = self.fetcher.fetch(&VideoRef::new(&entry.video_id, &entry.url)).await;
            let mut talk = self.talk_for(entry);
            if !result.is_empty() {
                found += 1;
                talk.transcript = result.transcript;
            }

            let explicit = only.contains(&entry.video_id);
            let existing = record
                .talks
                .iter_mut()
                .find(|t| t.video_id.as_deref() == Some(entry.video_id.as_str()));
            match existing {
                Some(existing) if explicit && !talk.needs_placeholder() => {
                    existing.transcript = talk.transcript;
                }
                _ => fetched_talks.push(talk),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let merged = record.merge_fetched(fetched_talks);
        info!(
            fetched = queue.len(),
            found,
            added = merged.added,
            updated = merged.updated,
            "fetch finished"
        );
        Ok((queue.len(), found))
    }

    /// Title-page metadata: record, then series config, then metadata file.
    fn book_metadata(&self, record: &SeriesRecord) -> Result<BookMetadata> {
        let file = match self.paths.metadata_path() {
            Some(path) if path.exists() => load_metadata_file(path)?,
            Some(path) => {
                warn!(path = %path.display(), "metadata file not found");
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };
        Ok(BookMetadata::resolve(&record.metadata, &self.series, &file))
    }

    fn configured_formats(&self) -> Result<Vec<ExportFormat>> {
        self.settings
            .book
            .export_formats
            .iter()
            .map(|f| f.parse())
            .collect()
    }
}
