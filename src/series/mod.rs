//! Series data model: talk records, the series record and its on-disk layout.
//!
//! The series record (`talks.json`) is the hand-off point between pipeline
//! stages. Every stage loads it, mutates it in place and writes it back whole.

mod paths;

pub use paths::SeriesPaths;

use crate::error::{Result, TalkbookError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// One talk, later one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talk {
    pub speaker: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub source_url: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub date: Option<String>,
    #[serde(default)]
    pub transcript: String,
    /// Sequence number of the chapter; stable once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
}

impl Talk {
    pub fn new(speaker: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            title: title.into(),
            video_id: None,
            source_url: None,
            date: None,
            transcript: String::new(),
            chapter: None,
        }
    }

    /// True when no transcript could be acquired for this talk.
    pub fn needs_placeholder(&self) -> bool {
        self.transcript.trim().is_empty()
    }

    /// Best URL for the talk: explicit source URL, else one built from the video id.
    pub fn watch_url(&self, base_url: &str) -> Option<String> {
        self.source_url.clone().or_else(|| {
            self.video_id
                .as_ref()
                .map(|id| format!("{}/watch?v={}", base_url.trim_end_matches('/'), id))
        })
    }
}

/// Treat `""` the same as a missing value.
fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// A playlist-to-book project: metadata plus the ordered talk list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub series: String,
    /// Front-matter values (title, subtitle, author, language, date).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub talks: Vec<Talk>,
}

/// Outcome of merging freshly fetched talks into an existing record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
}

impl SeriesRecord {
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            ..Default::default()
        }
    }

    /// Load a record; the file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TalkbookError::MissingFile(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a record, or start an empty one named `series`.
    pub fn load_or_new(path: &Path, series: &str) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(series))
        }
    }

    /// Write the record as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        debug!(path = %path.display(), talks = self.talks.len(), "saved series record");
        Ok(())
    }

    /// Give every talk without a chapter number the next free one, in list order.
    ///
    /// Existing numbers are kept; a number repeated later in the list is
    /// treated as missing. Returns how many talks were numbered.
    pub fn assign_chapter_indices(&mut self, start_index: u32) -> usize {
        let mut seen = HashSet::new();
        for talk in &mut self.talks {
            if let Some(idx) = talk.chapter {
                if !seen.insert(idx) {
                    talk.chapter = None;
                }
            }
        }

        let mut next = seen
            .iter()
            .max()
            .map(|max| max + 1)
            .unwrap_or(start_index)
            .max(start_index);
        let mut assigned = 0;
        for talk in self.talks.iter_mut().filter(|t| t.chapter.is_none()) {
            talk.chapter = Some(next);
            next += 1;
            assigned += 1;
        }
        assigned
    }

    /// Merge fetched talks by video id.
    ///
    /// Existing talks keep their chapter number and every non-empty field; an
    /// empty transcript is replaced by a fetched non-empty one. Unknown talks
    /// are appended in fetch order.
    pub fn merge_fetched(&mut self, fetched: Vec<Talk>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let by_id: HashMap<String, usize> = self
            .talks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.video_id.clone().map(|id| (id, i)))
            .collect();

        for incoming in fetched {
            let existing = incoming
                .video_id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .copied();

            match existing {
                Some(i) => {
                    let talk = &mut self.talks[i];
                    let mut changed = false;
                    if talk.needs_placeholder() && !incoming.needs_placeholder() {
                        talk.transcript = incoming.transcript;
                        changed = true;
                    }
                    if talk.source_url.is_none() && incoming.source_url.is_some() {
                        talk.source_url = incoming.source_url;
                        changed = true;
                    }
                    if talk.date.is_none() && incoming.date.is_some() {
                        talk.date = incoming.date;
                        changed = true;
                    }
                    if changed {
                        summary.updated += 1;
                    }
                }
                None => {
                    self.talks.push(incoming);
                    summary.added += 1;
                }
            }
        }
        summary
    }
}

/// A discovered playlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub video_id: String,
    pub title: String,
    pub url: String,
}

/// The exported playlist listing (`videos.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub playlist_id: String,
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
}

impl VideoList {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TalkbookError::MissingFile(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Readers never see a half-written file and a failed write leaves the old
/// contents in place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talk(id: &str, title: &str) -> Talk {
        let mut t = Talk::new("Speaker", title);
        t.video_id = Some(id.to_string());
        t
    }

    #[test]
    fn test_assign_indices_is_deterministic() {
        let build = || {
            let mut record = SeriesRecord::new("demo");
            record.talks = vec![talk("a", "A"), talk("b", "B"), talk("c", "C")];
            record.assign_chapter_indices(1);
            record
        };
        let first = build();
        let second = build();
        let idx: Vec<_> = first.talks.iter().map(|t| t.chapter).collect();
        assert_eq!(idx, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(idx, second.talks.iter().map(|t| t.chapter).collect::<Vec<_>>());
    }

    #[test]
    fn test_assign_indices_keeps_existing_and_fixes_duplicates() {
        let mut record = SeriesRecord::new("demo");
        let mut a = talk("a", "A");
        a.chapter = Some(4);
        let mut b = talk("b", "B");
        b.chapter = Some(4);
        record.talks = vec![talk("x", "X"), a, b];
        let assigned = record.assign_chapter_indices(1);
        assert_eq!(assigned, 2);
        assert_eq!(record.talks[1].chapter, Some(4));
        assert_eq!(record.talks[0].chapter, Some(5));
        assert_eq!(record.talks[2].chapter, Some(6));
    }

    #[test]
    fn test_merge_keeps_present_fields() {
        let mut record = SeriesRecord::new("demo");
        let mut existing = talk("a", "A");
        existing.chapter = Some(1);
        existing.date = Some("2025-09-12".to_string());
        record.talks.push(existing);

        let mut refetched = talk("a", "A renamed");
        refetched.transcript = "Hello there.".to_string();
        refetched.date = Some("2024-01-01".to_string());
        let summary = record.merge_fetched(vec![refetched, talk("b", "B")]);

        assert_eq!(summary, MergeSummary { added: 1, updated: 1 });
        assert_eq!(record.talks[0].title, "A");
        assert_eq!(record.talks[0].date.as_deref(), Some("2025-09-12"));
        assert_eq!(record.talks[0].transcript, "Hello there.");
        assert_eq!(record.talks[0].chapter, Some(1));
        assert_eq!(record.talks[1].video_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_empty_strings_deserialize_as_none() {
        let json = r#"{"series":"S","talks":[{"speaker":"A","title":"T","date":"","source_url":"","transcript":"x"}]}"#;
        let record: SeriesRecord = serde_json::from_str(json).unwrap();
        assert!(record.talks[0].date.is_none());
        assert!(record.talks[0].source_url.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("talks.json");
        let mut record = SeriesRecord::new("demo");
        record.metadata.insert("author".to_string(), "Various".to_string());
        record.talks.push(talk("a", "A"));
        record.save(&path).unwrap();

        let loaded = SeriesRecord::load(&path).unwrap();
        assert_eq!(loaded.talks, record.talks);
        assert_eq!(loaded.metadata.get("author").map(String::as_str), Some("Various"));
        assert!(SeriesRecord::load(&tmp.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_watch_url_prefers_source() {
        let mut t = talk("abcdefghijk", "A");
        assert_eq!(
            t.watch_url("https://www.youtube.com/").as_deref(),
            Some("https://www.youtube.com/watch?v=abcdefghijk")
        );
        t.source_url = Some("https://youtu.be/abcdefghijk".to_string());
        assert_eq!(t.watch_url("x").as_deref(), Some("https://youtu.be/abcdefghijk"));
    }
}
