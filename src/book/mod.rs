//! Chapter files and the assembled manuscript.
//!
//! Chapters live in `content/<slug>/` as `<NNN>-<slug>.md`. Each file starts
//! with a header block (chapter marker, `# Speaker: Title`, `- Key: value`
//! metadata lines) followed by the prose body.

mod assemble;
mod export;
mod ingest;
mod polish;

pub use assemble::{assemble, load_metadata_file, title_page, AssembleReport, BookMetadata};
pub use export::{export, ExportFormat};
pub use ingest::{chapter_file_name, format_chapter, ingest, slugify, IngestReport};
pub use polish::{polish_content, polish_dir, PolishReport};

use crate::error::{Result, TalkbookError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// First line of every generated chapter.
pub(crate) const CHAPTER_MARKER_PREFIX: &str = "<!-- chapter:";

/// First body line of a placeholder chapter.
pub(crate) const PLACEHOLDER_MARKER: &str = "<!-- placeholder -->";

static META_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- [A-Za-z][A-Za-z ]*: ").expect("valid regex"));

/// Leading sequence number of a chapter file name (`007-foo.md` -> 7).
pub fn chapter_number(file_name: &str) -> Option<u32> {
    let digits: String = file_name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Markdown files in `dir`, ordered by leading number, then by name.
///
/// Files without a number sort after numbered ones.
pub fn list_chapters(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TalkbookError::MissingFile(dir.display().to_string()));
    }
    let mut files: Vec<(Option<u32>, String, PathBuf)> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("md"))
        })
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            Some((chapter_number(&name), name, p))
        })
        .collect();

    files.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    Ok(files.into_iter().map(|(_, _, p)| p).collect())
}

/// Split a chapter into its header block and body.
///
/// The header is the chapter marker, the first `#` heading, and any
/// `- Key: value` lines, with blank lines between them. The header is
/// returned without trailing blank lines; the body without surrounding ones.
pub fn split_chapter(content: &str) -> (String, String) {
    let lines: Vec<&str> = content.lines().collect();
    let mut header_end = 0;
    let mut seen_heading = false;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let is_header = trimmed.is_empty()
            || trimmed.starts_with(CHAPTER_MARKER_PREFIX)
            || (!seen_heading && trimmed.starts_with("# "))
            || (seen_heading && META_LINE_RE.is_match(trimmed));
        if !is_header {
            break;
        }
        if trimmed.starts_with("# ") {
            seen_heading = true;
        }
        header_end = i + 1;
    }

    let header = lines[..header_end].join("\n").trim_end().to_string();
    let body = lines[header_end..].join("\n").trim().to_string();
    (header, body)
}

/// True when a chapter holds the placeholder rather than a transcript.
pub fn is_placeholder(content: &str) -> bool {
    let (_, body) = split_chapter(content);
    body.starts_with(PLACEHOLDER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_number() {
        assert_eq!(chapter_number("007-jane-doe-agents.md"), Some(7));
        assert_eq!(chapter_number("120-x.md"), Some(120));
        assert_eq!(chapter_number("intro.md"), None);
    }

    #[test]
    fn test_list_chapters_numeric_order() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["010-c.md", "002-b.md", "1-a.md", "notes.md", "003-x.txt"] {
            std::fs::write(tmp.path().join(name), "x").unwrap();
        }
        let names: Vec<String> = list_chapters(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1-a.md", "002-b.md", "010-c.md", "notes.md"]);
        assert!(list_chapters(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_split_chapter() {
        let content = "<!-- chapter: 001 -->\n# Jane: Agents\n\n- Date: 2025-09-12\n- Source: https://x\n\nFirst para.\n\nSecond para.\n";
        let (header, body) = split_chapter(content);
        assert_eq!(
            header,
            "<!-- chapter: 001 -->\n# Jane: Agents\n\n- Date: 2025-09-12\n- Source: https://x"
        );
        assert_eq!(body, "First para.\n\nSecond para.");
    }

    #[test]
    fn test_split_chapter_keeps_body_headings() {
        let content = "# Jane: Agents\n\n## Introduction\n\nText.\n";
        let (header, body) = split_chapter(content);
        assert_eq!(header, "# Jane: Agents");
        assert_eq!(body, "## Introduction\n\nText.");
    }
}
