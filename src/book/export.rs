//! Document export through pandoc.

use super::BookMetadata;
use crate::error::{Result, TalkbookError};
use crate::tools;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, instrument};

/// Output formats pandoc is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Epub,
    Pdf,
    Docx,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Epub => "epub",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = TalkbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "epub" => Ok(ExportFormat::Epub),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            "html" => Ok(ExportFormat::Html),
            other => Err(TalkbookError::InvalidInput(format!(
                "unsupported export format '{other}' (expected epub, pdf, docx or html)"
            ))),
        }
    }
}

fn pandoc_args(book: &Path, out: &Path, meta: &BookMetadata) -> Vec<String> {
    let mut args = vec![
        book.to_string_lossy().into_owned(),
        "-o".to_string(),
        out.to_string_lossy().into_owned(),
        "--toc".to_string(),
        "--metadata".to_string(),
        format!("title={}", meta.title),
    ];
    if let Some(author) = &meta.author {
        args.push("--metadata".to_string());
        args.push(format!("author={author}"));
    }
    if let Some(lang) = &meta.language {
        args.push("--metadata".to_string());
        args.push(format!("lang={lang}"));
    }
    args
}

/// Convert `book` next to itself (`book.<fmt>`) for each format.
///
/// A missing pandoc binary is reported as `ToolNotFound`; the manuscript is
/// never modified.
#[instrument(skip(meta))]
pub async fn export(
    pandoc: &str,
    book: &Path,
    formats: &[ExportFormat],
    meta: &BookMetadata,
) -> Result<Vec<PathBuf>> {
    if !book.exists() {
        return Err(TalkbookError::MissingFile(book.display().to_string()));
    }

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let out = book.with_extension(format.extension());
        let cmd = tools::command(pandoc, pandoc_args(book, &out, meta));
        tools::run(pandoc, cmd).await?;
        info!(format = %format, path = %out.display(), "exported");
        written.push(out);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> BookMetadata {
        BookMetadata {
            title: "Talks".to_string(),
            subtitle: None,
            author: Some("Various".to_string()),
            date: "2025-09-12".to_string(),
            language: None,
        }
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!("EPUB".parse::<ExportFormat>().unwrap(), ExportFormat::Epub);
        assert_eq!(" docx ".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("mobi".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_pandoc_args() {
        let args = pandoc_args(Path::new("build/book.md"), Path::new("build/book.epub"), &meta());
        assert_eq!(
            args,
            vec![
                "build/book.md",
                "-o",
                "build/book.epub",
                "--toc",
                "--metadata",
                "title=Talks",
                "--metadata",
                "author=Various"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_pandoc_leaves_book_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let book = tmp.path().join("book.md");
        std::fs::write(&book, "# Talks\n").unwrap();

        let result = export("talkbook-missing-pandoc", &book, &[ExportFormat::Epub], &meta()).await;
        assert!(matches!(result, Err(TalkbookError::ToolNotFound(_))));
        assert_eq!(std::fs::read_to_string(&book).unwrap(), "# Talks\n");
        assert!(!tmp.path().join("book.epub").exists());
    }
}
