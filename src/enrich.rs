//! Metadata enrichment: fill in missing dates and source URLs, clean transcripts.
//!
//! Enrichment only fills gaps. A field that already has a value is never
//! overwritten, so running the stage twice changes nothing the second time.

use crate::config::Settings;
use crate::error::{Result, TalkbookError};
use crate::series::SeriesRecord;
use crate::tools;
use crate::transcript::clean_text;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// What a metadata lookup found for one video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub webpage_url: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
}

/// Source of per-video metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<VideoMetadata>;
}

/// `yt-dlp --skip-download -J <url>`.
pub struct YtDlpMetadata {
    program: String,
    cookies_file: Option<PathBuf>,
    cookies_from_browser: Option<String>,
}

impl YtDlpMetadata {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: tools::yt_dlp_program(&settings.tools),
            cookies_file: settings.fetch.cookies_path(),
            cookies_from_browser: settings
                .fetch
                .cookies_from_browser
                .clone()
                .filter(|b| !b.trim().is_empty()),
        }
    }
}

#[async_trait]
impl MetadataSource for YtDlpMetadata {
    #[instrument(skip(self))]
    async fn lookup(&self, url: &str) -> Result<VideoMetadata> {
        let mut args = vec![
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "-J".to_string(),
        ];
        if let Some(file) = &self.cookies_file {
            args.push("--cookies".to_string());
            args.push(file.to_string_lossy().into_owned());
        } else if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }
        args.push(url.to_string());

        let output = tools::run(&self.program, tools::command(&self.program, &args)).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_yt_dlp_json(&stdout)
    }
}

/// Read the fields we need from `yt-dlp -J` output. Playlists use the first entry.
pub fn parse_yt_dlp_json(stdout: &str) -> Result<VideoMetadata> {
    let json: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| TalkbookError::Metadata(format!("invalid yt-dlp JSON: {e}")))?;
    let data = match json["entries"].as_array().and_then(|e| e.first()) {
        Some(first) => first,
        None => &json,
    };

    let text = |key: &str| {
        data[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(VideoMetadata {
        date: text("upload_date")
            .or_else(|| text("release_date"))
            .and_then(|d| normalize_date(&d)),
        webpage_url: text("webpage_url"),
        title: text("title"),
        uploader: text("uploader").or_else(|| text("channel")),
    })
}

/// Normalize `YYYYMMDD`, `YYYY-MM-DD` or an RFC 3339 timestamp to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = compact_date(raw)
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// `YYYYMMDD` as printed by yt-dlp.
fn compact_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = raw[0..4].parse().ok()?;
    let month = raw[4..6].parse().ok()?;
    let day = raw[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Counts of what an enrichment pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub dates_filled: usize,
    pub urls_filled: usize,
    pub transcripts_cleaned: usize,
    pub lookups_failed: usize,
}

impl EnrichReport {
    /// Total number of field changes.
    pub fn changes(&self) -> usize {
        self.dates_filled + self.urls_filled + self.transcripts_cleaned
    }
}

/// Fill missing dates and URLs and clean every transcript, in place.
///
/// Each talk missing a date or URL costs at most one lookup. A failed lookup
/// is logged and leaves the fields blank.
#[instrument(skip_all, fields(series = %record.series))]
pub async fn enrich_record(
    record: &mut SeriesRecord,
    source: &dyn MetadataSource,
    base_url: &str,
) -> EnrichReport {
    let mut report = EnrichReport::default();

    for talk in &mut record.talks {
        if talk.date.is_none() || talk.source_url.is_none() {
            if let Some(url) = talk.watch_url(base_url) {
                match source.lookup(&url).await {
                    Ok(meta) => {
                        if talk.date.is_none() {
                            if let Some(date) = meta.date {
                                talk.date = Some(date);
                                report.dates_filled += 1;
                            }
                        }
                        if talk.source_url.is_none() {
                            talk.source_url = meta.webpage_url.or(Some(url));
                            report.urls_filled += 1;
                        }
                    }
                    Err(e) => {
                        warn!(title = %talk.title, error = %e, "metadata lookup failed");
                        report.lookups_failed += 1;
                    }
                }
            } else {
                debug!(title = %talk.title, "no URL or video id; nothing to look up");
            }
        }

        if !talk.transcript.is_empty() {
            let cleaned = clean_text(&talk.transcript);
            if cleaned != talk.transcript {
                talk.transcript = cleaned;
                report.transcripts_cleaned += 1;
            }
        }
    }

    info!(
        dates = report.dates_filled,
        urls = report.urls_filled,
        cleaned = report.transcripts_cleaned,
        failed = report.lookups_failed,
        "enrichment finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Talk;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        meta: VideoMetadata,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSource for Fixed {
        async fn lookup(&self, _url: &str) -> Result<VideoMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.meta.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl MetadataSource for Failing {
        async fn lookup(&self, url: &str) -> Result<VideoMetadata> {
            Err(TalkbookError::Metadata(format!("offline: {url}")))
        }
    }

    const BASE: &str = "https://www.youtube.com";

    fn record() -> SeriesRecord {
        let mut dated = Talk::new("Jane Doe", "Agents");
        dated.video_id = Some("aaaaaaaaaaa".to_string());
        dated.date = Some("2025-09-12".to_string());
        dated.transcript = "So [Music] we began ,slowly.\n".to_string();

        let mut undated = Talk::new("John Roe", "Scaling");
        undated.video_id = Some("bbbbbbbbbbb".to_string());

        let mut record = SeriesRecord::new("demo");
        record.talks = vec![dated, undated];
        record
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("20250912").as_deref(), Some("2025-09-12"));
        assert_eq!(normalize_date("2025-09-12").as_deref(), Some("2025-09-12"));
        assert_eq!(
            normalize_date("2025-09-12T10:00:00-07:00").as_deref(),
            Some("2025-09-12")
        );
        assert_eq!(normalize_date("2025-9-1x"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_parse_yt_dlp_json_uses_first_entry() {
        let json = r#"{"_type":"playlist","entries":[{"upload_date":"20240102","webpage_url":"https://www.youtube.com/watch?v=x","uploader":"YC"}]}"#;
        let meta = parse_yt_dlp_json(json).unwrap();
        assert_eq!(meta.date.as_deref(), Some("2024-01-02"));
        assert_eq!(meta.uploader.as_deref(), Some("YC"));
        assert!(parse_yt_dlp_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_enrich_is_idempotent_and_keeps_existing_date() {
        let source = Fixed {
            meta: VideoMetadata {
                date: Some("2030-01-01".to_string()),
                webpage_url: Some("https://www.youtube.com/watch?v=canonical".to_string()),
                ..Default::default()
            },
            calls: AtomicUsize::new(0),
        };
        let mut record = record();

        let first = enrich_record(&mut record, &source, BASE).await;
        assert_eq!(first.dates_filled, 1);
        assert_eq!(first.urls_filled, 2);
        assert_eq!(first.transcripts_cleaned, 1);
        assert_eq!(record.talks[0].date.as_deref(), Some("2025-09-12"));
        assert_eq!(record.talks[1].date.as_deref(), Some("2030-01-01"));
        assert_eq!(record.talks[0].transcript, "So we began, slowly.\n");

        let snapshot = serde_json::to_string(&record).unwrap();
        let calls_before = source.calls.load(Ordering::SeqCst);
        let second = enrich_record(&mut record, &source, BASE).await;
        assert_eq!(second.changes(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), calls_before);
        assert_eq!(serde_json::to_string(&record).unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_fatal() {
        let mut record = record();
        let report = enrich_record(&mut record, &Failing, BASE).await;
        assert_eq!(report.lookups_failed, 2);
        assert!(record.talks[1].date.is_none());
        assert_eq!(report.transcripts_cleaned, 1);
    }
}
