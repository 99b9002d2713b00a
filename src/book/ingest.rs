//! Talk records to chapter files.

use super::{chapter_number, is_placeholder, CHAPTER_MARKER_PREFIX, PLACEHOLDER_MARKER};
use crate::config::BookSettings;
use crate::error::{Result, TalkbookError};
use crate::series::{write_atomic, SeriesRecord, Talk};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid regex"));

const MAX_SLUG_CHARS: usize = 80;

/// What an ingest pass did.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub written: Vec<PathBuf>,
    pub skipped: usize,
    pub placeholders: usize,
    /// Stale files replaced by a renamed chapter.
    pub removed: Vec<PathBuf>,
}

/// Lowercase ASCII slug, at most `max_len` characters.
pub fn slugify(text: &str, max_len: usize) -> String {
    let lower = text.to_lowercase();
    let kept = NON_SLUG_RE.replace_all(&lower, "");
    let dashed = SEPARATOR_RE.replace_all(&kept, "-");
    let slug = dashed.trim_matches('-');
    let truncated: String = slug.chars().take(max_len).collect();
    truncated.trim_end_matches('-').to_string()
}

fn padded(index: u32, digits: usize) -> String {
    format!("{index:0digits$}")
}

/// `<NNN>-<slug(speaker-title)>.md`
pub fn chapter_file_name(index: u32, digits: usize, talk: &Talk) -> String {
    let number = padded(index, digits);
    let slug = slugify(&format!("{}-{}", talk.speaker, talk.title), MAX_SLUG_CHARS);
    if slug.is_empty() {
        format!("{number}-chapter-{number}.md")
    } else {
        format!("{number}-{slug}.md")
    }
}

/// Full Markdown for one chapter.
pub fn format_chapter(index: u32, digits: usize, talk: &Talk, base_url: &str) -> String {
    let source = talk.watch_url(base_url);
    let mut out = format!(
        "{CHAPTER_MARKER_PREFIX} {} -->\n# {}: {}\n\n",
        padded(index, digits),
        talk.speaker.trim(),
        talk.title.trim()
    );

    let mut meta = Vec::new();
    if let Some(date) = &talk.date {
        meta.push(format!("- Date: {date}"));
    }
    if let Some(url) = &source {
        meta.push(format!("- Source: {url}"));
    }
    if !meta.is_empty() {
        out.push_str(&meta.join("\n"));
        out.push_str("\n\n");
    }

    if talk.needs_placeholder() {
        out.push_str(PLACEHOLDER_MARKER);
        out.push('\n');
        out.push_str("This chapter is a placeholder for the full transcript.\n\n");
        if let Some(url) = &source {
            out.push_str(&format!("Source video: {url}\n\n"));
        }
        out.push_str("Once subtitles are fetched, this will be replaced by the full talk text.\n");
    } else {
        out.push_str(talk.transcript.trim());
        out.push('\n');
    }
    out
}

/// Existing chapter files keyed by their leading number.
fn existing_chapters(dir: &Path) -> Result<BTreeMap<u32, Vec<PathBuf>>> {
    let mut map: BTreeMap<u32, Vec<PathBuf>> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".md") {
            continue;
        }
        if let Some(n) = chapter_number(name) {
            map.entry(n).or_default().push(path);
        }
    }
    Ok(map)
}

/// Write one chapter file per talk into `content_dir`.
///
/// Talks without a chapter number are numbered first. Without `overwrite`,
/// an index that already has a file is left alone, except that a placeholder
/// is replaced once a transcript exists. With `overwrite` every file is
/// regenerated and files with the same index but a stale name are removed.
#[instrument(skip_all, fields(series = %record.series, overwrite))]
pub fn ingest(
    record: &mut SeriesRecord,
    content_dir: &Path,
    settings: &BookSettings,
    overwrite: bool,
    base_url: &str,
) -> Result<IngestReport> {
    if record.talks.is_empty() {
        return Err(TalkbookError::InvalidInput(format!(
            "series '{}' has no talks to ingest",
            record.series
        )));
    }

    let assigned = record.assign_chapter_indices(settings.start_index);
    if assigned > 0 {
        debug!(assigned, "numbered new talks");
    }

    std::fs::create_dir_all(content_dir)?;
    let existing = existing_chapters(content_dir)?;
    let digits = settings.chapter_digits.max(1);
    let mut report = IngestReport::default();

    for talk in &record.talks {
        let Some(index) = talk.chapter else {
            continue;
        };
        let target = content_dir.join(chapter_file_name(index, digits, talk));
        let others = existing.get(&index).map(Vec::as_slice).unwrap_or_default();

        let refresh_placeholder = !talk.needs_placeholder()
            && others.iter().any(|p| {
                std::fs::read_to_string(p)
                    .map(|c| is_placeholder(&c))
                    .unwrap_or(false)
            });

        if !others.is_empty() && !overwrite && !refresh_placeholder {
            report.skipped += 1;
            continue;
        }

        let content = format_chapter(index, digits, talk, base_url);
        let unchanged = std::fs::read(&target).is_ok_and(|old| old == content.as_bytes());
        if !unchanged {
            write_atomic(&target, content.as_bytes())?;
            report.written.push(target.clone());
        }
        if talk.needs_placeholder() {
            report.placeholders += 1;
        }

        for stale in others.iter().filter(|p| **p != target) {
            std::fs::remove_file(stale)?;
            info!(path = %stale.display(), "removed stale chapter file");
            report.removed.push(stale.clone());
        }
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped,
        placeholders = report.placeholders,
        "ingest finished"
    );
    Ok(report)
}
