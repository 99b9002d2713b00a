//! Chapter files to a single manuscript.

use super::list_chapters;
use crate::config::SeriesConfig;
use crate::error::{Result, TalkbookError};
use crate::series::write_atomic;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Title-page values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    /// Defaults to today.
    pub date: String,
    pub language: Option<String>,
}

impl BookMetadata {
    /// Resolve from the record's metadata map, then the series config, then
    /// the metadata file. Later sources win.
    pub fn resolve(
        record: &BTreeMap<String, String>,
        series: &SeriesConfig,
        file: &BTreeMap<String, String>,
    ) -> Self {
        let mut merged: BTreeMap<String, String> = record
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();

        let from_config = [
            ("title", Some(series.title.clone())),
            ("subtitle", series.subtitle.clone()),
            ("author", series.author.clone()),
            ("language", series.language.clone()),
        ];
        for (key, value) in from_config {
            if let Some(v) = value {
                merged.insert(key.to_string(), v);
            }
        }
        merged.extend(file.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.retain(|_, v| !v.trim().is_empty());

        let get = |key: &str| merged.get(key).map(|v| v.trim().to_string());
        Self {
            title: get("title").unwrap_or_else(|| series.slug.clone()),
            subtitle: get("subtitle"),
            author: get("author"),
            date: get("date")
                .unwrap_or_else(|| chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()),
            language: get("language"),
        }
    }
}

/// Parse a `key: value` metadata file. Blank lines and `#` comments are skipped.
pub fn load_metadata_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Err(TalkbookError::MissingFile(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect())
}

/// Markdown title page, ending with a horizontal rule.
pub fn title_page(meta: &BookMetadata) -> String {
    let mut parts = vec![format!("# {}", meta.title)];
    if let Some(subtitle) = &meta.subtitle {
        parts.push(format!("_{subtitle}_"));
    }
    if let Some(author) = &meta.author {
        parts.push(author.clone());
    }
    parts.push(meta.date.clone());
    if let Some(language) = &meta.language {
        parts.push(format!("Language: {language}"));
    }
    parts.push("---".to_string());
    parts.join("\n\n")
}

#[derive(Debug, Clone)]
pub struct AssembleReport {
    pub path: PathBuf,
    pub chapters: usize,
}

/// Concatenate every chapter in `content_dir` into `book_path`.
#[instrument(skip(meta))]
pub fn assemble(content_dir: &Path, book_path: &Path, meta: &BookMetadata) -> Result<AssembleReport> {
    let chapters = list_chapters(content_dir).map_err(|_| {
        TalkbookError::Build(format!(
            "content directory {} does not exist; run ingest first",
            content_dir.display()
        ))
    })?;
    if chapters.is_empty() {
        return Err(TalkbookError::Build(format!(
            "no chapters in {}",
            content_dir.display()
        )));
    }

    let mut book = title_page(meta);
    for path in &chapters {
        let content = std::fs::read_to_string(path)?;
        book.push_str("\n\n");
        book.push_str(content.trim());
    }
    book.push('\n');

    write_atomic(book_path, book.as_bytes())?;
    info!(chapters = chapters.len(), path = %book_path.display(), "manuscript written");
    Ok(AssembleReport {
        path: book_path.to_path_buf(),
        chapters: chapters.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> BookMetadata {
        BookMetadata {
            title: "AI Startup School".to_string(),
            subtitle: Some("Collected talks".to_string()),
            author: None,
            date: "2025-09-12".to_string(),
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn test_title_page() {
        assert_eq!(
            title_page(&meta()),
            "# AI Startup School\n\n_Collected talks_\n\n2025-09-12\n\nLanguage: en\n\n---"
        );
    }

    #[test]
    fn test_sparse_chapters_in_numeric_order() {
        let tmp = tempfile::tempdir().unwrap();
        let content = tmp.path().join("content");
        std::fs::create_dir_all(&content).unwrap();
        std::fs::write(content.join("003-c.md"), "# C: Three\n\nThird.\n").unwrap();
        std::fs::write(content.join("000-a.md"), "# A: Zero\n\nZeroth.\n").unwrap();
        std::fs::write(content.join("001-b.md"), "# B: One\n\nFirst.\n\n").unwrap();

        let book = tmp.path().join("build").join("book.md");
        let report = assemble(&content, &book, &meta()).unwrap();
        assert_eq!(report.chapters, 3);

        let text = std::fs::read_to_string(&book).unwrap();
        assert_eq!(text.matches("# AI Startup School").count(), 1);
        let zero = text.find("# A: Zero").unwrap();
        let one = text.find("# B: One").unwrap();
        let three = text.find("# C: Three").unwrap();
        assert!(text.find("---").unwrap() < zero);
        assert!(zero < one && one < three);
        assert!(text.ends_with("Third.\n"));

        let again = assemble(&content, &book, &meta()).unwrap();
        assert_eq!(again.chapters, 3);
        assert_eq!(std::fs::read_to_string(&book).unwrap(), text);
    }

    #[test]
    fn test_missing_or_empty_content_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let book = tmp.path().join("book.md");
        let missing = assemble(&tmp.path().join("nope"), &book, &meta());
        assert!(matches!(missing, Err(TalkbookError::Build(_))));
        let empty = assemble(tmp.path(), &book, &meta());
        assert!(matches!(empty, Err(TalkbookError::Build(_))));
        assert!(!book.exists());
    }

    #[test]
    fn test_metadata_file_overrides_config_and_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("metadata.txt");
        std::fs::write(&path, "# book metadata\nTitle: From File\nauthor:  Y Combinator \n\nbroken line\n")
            .unwrap();
        let file = load_metadata_file(&path).unwrap();
        assert_eq!(file.get("title").map(String::as_str), Some("From File"));
        assert_eq!(file.get("author").map(String::as_str), Some("Y Combinator"));
        assert_eq!(file.len(), 2);

        let mut record = BTreeMap::new();
        record.insert("subtitle".to_string(), "From Record".to_string());
        record.insert("language".to_string(), "de".to_string());
        record.insert("date".to_string(), "2025-06-17".to_string());
        let mut series = SeriesConfig::new("ai-startup-school");
        series.language = Some("en".to_string());

        let meta = BookMetadata::resolve(&record, &series, &file);
        assert_eq!(meta.title, "From File");
        assert_eq!(meta.subtitle.as_deref(), Some("From Record"));
        assert_eq!(meta.author.as_deref(), Some("Y Combinator"));
        assert_eq!(meta.language.as_deref(), Some("en"));
        assert_eq!(meta.date, "2025-06-17");

        assert!(load_metadata_file(&tmp.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_date_defaults_to_today() {
        let meta = BookMetadata::resolve(&BTreeMap::new(), &SeriesConfig::new("x"), &BTreeMap::new());
        assert_eq!(meta.date, chrono::Local::now().date_naive().format("%Y-%m-%d").to_string());
        assert_eq!(meta.title, "X");
    }
}
