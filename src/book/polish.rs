//! Light copy-editing of chapter prose.

use super::{is_placeholder, list_chapters, split_chapter};
use crate::config::PolishSettings;
use crate::error::{Result, TalkbookError};
use crate::series::write_atomic;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

/// Headings inserted by `add_subheadings`, stripped again before each pass.
const GENERIC_HEADINGS: [&str; 5] = [
    "Introduction",
    "Key Ideas",
    "Technical Insights",
    "Applications",
    "Conclusion",
];

/// Hand-written opening chapter; never rewritten by a directory pass.
const INTRODUCTION_PREFIX: &str = "000-introduction";

/// Dotted abbreviations that do not end a sentence.
const ABBREVIATIONS: [&str; 4] = ["i.e.", "e.g.", "vs.", "cf."];

static LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blike\b(\s*[,.\-])").expect("valid regex"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("valid regex"));
static DOUBLE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;:]\s*([,.;:!?])").expect("valid regex"));
static LEADING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,.;:!?\-]+").expect("valid regex"));
static STRAY_TERMINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])(?:\s+[.!?])+").expect("valid regex"));
static STANDALONE_I_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:\bi\.e\.)|\bi\b").expect("valid regex"));

/// What a polish pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolishReport {
    pub polished: usize,
    pub unchanged: usize,
    pub placeholders: usize,
}

/// Compiled filler and acronym patterns.
struct Polisher {
    fillers: Option<Regex>,
    acronyms: Vec<(Regex, String)>,
    add_subheadings: bool,
}

impl Polisher {
    fn new(settings: &PolishSettings) -> Result<Self> {
        let alternatives: Vec<String> = settings
            .filler_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(|w| {
                let words: Vec<String> = w.split_whitespace().map(regex::escape).collect();
                match words.as_slice() {
                    // "um" also covers "umm", "uh" covers "uhh".
                    [single] if single.len() <= 2 => format!("{single}+"),
                    _ => words.join(r"\s+"),
                }
            })
            .collect();

        let fillers = if alternatives.is_empty() {
            None
        } else {
            // A trailing comma goes with the filler; sentence punctuation stays.
            let pattern = format!(r"(?i)\b(?:{})\b,?", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                TalkbookError::Config(format!("invalid filler word: {e}"))
            })?)
        };

        let acronyms = settings
            .acronyms
            .iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(a.trim()))).map_err(
                    |e| TalkbookError::Config(format!("invalid acronym: {e}")),
                )?;
                Ok((re, a.trim().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fillers,
            acronyms,
            add_subheadings: settings.add_subheadings,
        })
    }

    fn remove_fillers(&self, text: &str) -> String {
        let mut out = match &self.fillers {
            Some(re) => re.replace_all(text, "").into_owned(),
            None => text.to_string(),
        };
        out = LIKE_RE.replace_all(&out, "$1").into_owned();
        out = SPACES_RE.replace_all(&out, " ").into_owned();
        out = STRAY_TERMINAL_RE.replace_all(&out, "$1").into_owned();
        out = SPACE_BEFORE_PUNCT_RE.replace_all(&out, "$1").into_owned();
        out = DOUBLE_PUNCT_RE.replace_all(&out, "$1").into_owned();
        LEADING_PUNCT_RE.replace(&out, "").trim().to_string()
    }

    fn paragraph(&self, text: &str) -> String {
        let text = self.remove_fillers(text);
        let mut text = sentence_case(&text);
        text = STANDALONE_I_RE
            .replace_all(&text, |caps: &regex::Captures| match &caps[0] {
                "i" => "I".to_string(),
                other => other.to_string(),
            })
            .into_owned();
        for (re, acronym) in &self.acronyms {
            text = re.replace_all(&text, acronym.as_str()).into_owned();
        }
        text
    }

    fn chapter(&self, content: &str) -> String {
        if is_placeholder(content) {
            return content.to_string();
        }
        let (header, body) = split_chapter(content);

        let mut paragraphs: Vec<String> = body
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty() && !is_generic_heading(p))
            .map(|p| {
                if p.starts_with('#') || p.starts_with("<!--") {
                    p.to_string()
                } else {
                    self.paragraph(&p.split_whitespace().collect::<Vec<_>>().join(" "))
                }
            })
            .filter(|p| !p.is_empty())
            .collect();

        if self.add_subheadings {
            paragraphs = add_subheadings(paragraphs);
        }

        let body = paragraphs.join("\n\n");
        match (header.is_empty(), body.is_empty()) {
            (true, _) => format!("{body}\n"),
            (false, true) => format!("{header}\n"),
            (false, false) => format!("{header}\n\n{body}\n"),
        }
    }
}

/// Upper-case the first letter of the text and of every sentence.
fn sentence_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut capitalize = true;
    let mut word = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            if ends_sentence(&word) {
                capitalize = true;
            }
            word.clear();
            out.push(c);
            continue;
        }
        word.push(c);
        if capitalize && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            capitalize = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn ends_sentence(word: &str) -> bool {
    let word = word.trim_end_matches(['"', '\'', ')', '\u{201d}', '\u{2019}']);
    word.ends_with(['.', '!', '?'])
        && !ABBREVIATIONS.iter().any(|a| word.eq_ignore_ascii_case(a))
}

fn is_generic_heading(paragraph: &str) -> bool {
    paragraph
        .strip_prefix("## ")
        .is_some_and(|h| GENERIC_HEADINGS.contains(&h.trim()))
}

/// Spread generic `##` headings over the paragraphs of a long chapter.
fn add_subheadings(paragraphs: Vec<String>) -> Vec<String> {
    let n = paragraphs.len();
    if n < 6 {
        return paragraphs;
    }
    let sections = (n / 6).clamp(2, GENERIC_HEADINGS.len());
    let per_section = n.div_ceil(sections);

    let mut out = Vec::with_capacity(n + sections);
    for (i, para) in paragraphs.into_iter().enumerate() {
        if i % per_section == 0 {
            let heading = match i / per_section {
                0 => GENERIC_HEADINGS[0],
                s if s + 1 == sections => GENERIC_HEADINGS[GENERIC_HEADINGS.len() - 1],
                s => GENERIC_HEADINGS[s.min(GENERIC_HEADINGS.len() - 2)],
            };
            out.push(format!("## {heading}"));
        }
        out.push(para);
    }
    out
}

/// Polish one chapter. The header block and placeholders pass through as-is.
pub fn polish_content(content: &str, settings: &PolishSettings) -> Result<String> {
    Polisher::new(settings).map(|p| p.chapter(content))
}

/// Polish every chapter in `content_dir`, or just `only` when given.
///
/// Files are rewritten only when their content changes.
#[instrument(skip(settings))]
pub fn polish_dir(
    content_dir: &Path,
    only: Option<&Path>,
    settings: &PolishSettings,
) -> Result<PolishReport> {
    let polisher = Polisher::new(settings)?;
    let files = match only {
        Some(file) => vec![file.to_path_buf()],
        None => list_chapters(content_dir)?
            .into_iter()
            .filter(|path| {
                !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(INTRODUCTION_PREFIX))
            })
            .collect(),
    };

    let mut report = PolishReport::default();
    for path in files {
        let content = std::fs::read_to_string(&path)?;
        if is_placeholder(&content) {
            report.placeholders += 1;
            continue;
        }
        let polished = polisher.chapter(&content);
        if polished == content {
            report.unchanged += 1;
        } else {
            write_atomic(&path, polished.as_bytes())?;
            debug!(path = %path.display(), "polished chapter");
            report.polished += 1;
        }
    }

    info!(
        polished = report.polished,
        unchanged = report.unchanged,
        placeholders = report.placeholders,
        "polish finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str = "<!-- chapter: 001 -->\n# Jane Doe: Agents\n\n- Date: 2025-09-12\n\n\
        um so i think ai is, like, changing things. you know the yc batch is huge.\n\n\
        uh, i'm sure we will sort of see more.\n";

    #[test]
    fn test_polish_paragraphs() {
        let out = polish_content(CHAPTER, &PolishSettings::default()).unwrap();
        assert_eq!(
            out,
            "<!-- chapter: 001 -->\n# Jane Doe: Agents\n\n- Date: 2025-09-12\n\n\
             So I think AI is, changing things. The YC batch is huge.\n\n\
             I'm sure we will see more.\n"
        );
    }

    #[test]
    fn test_polish_is_idempotent() {
        let settings = PolishSettings {
            add_subheadings: true,
            ..Default::default()
        };
        let long: String = (1..=12)
            .map(|i| format!("paragraph number {i} is here."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chapter = format!("# Jane: Talk\n\n{long}\n");

        let once = polish_content(&chapter, &settings).unwrap();
        let twice = polish_content(&once, &settings).unwrap();
        assert_eq!(once, twice);
        assert!(once.contains("## Introduction"));
        assert!(once.contains("## Conclusion"));
        assert_eq!(once.matches("## ").count(), 2);
    }

    #[test]
    fn test_inserted_headings_are_removed_when_disabled() {
        let chapter = "# Jane: Talk\n\n## Introduction\n\nHello.\n\n## Q&A\n\nBye.\n";
        let out = polish_content(chapter, &PolishSettings::default()).unwrap();
        assert_eq!(out, "# Jane: Talk\n\nHello.\n\n## Q&A\n\nBye.\n");
    }

    #[test]
    fn test_placeholder_is_left_alone() {
        let chapter = "# Jane: Talk\n\n<!-- placeholder -->\nthis is a placeholder, um.\n";
        assert_eq!(polish_content(chapter, &PolishSettings::default()).unwrap(), chapter);
    }

    #[test]
    fn test_sentence_case() {
        assert_eq!(sentence_case("hello. world! ok? yes"), "Hello. World! Ok? Yes");
        assert_eq!(sentence_case("version 2.0 is out"), "Version 2.0 is out");
        assert_eq!(sentence_case("fast, i.e. weekly. done"), "Fast, i.e. weekly. Done");
        assert_eq!(sentence_case("he said \"go.\" then"), "He said \"go.\" Then");
    }

    #[test]
    fn test_fillers_keep_sentence_punctuation() {
        let chapter = "# A: B\n\nwe ship fast, i.e. weekly. it worked um. next, uh, we grew.\n";
        let out = polish_content(chapter, &PolishSettings::default()).unwrap();
        assert_eq!(
            out,
            "# A: B\n\nWe ship fast, i.e. weekly. It worked. Next, we grew.\n"
        );
    }

    #[test]
    fn test_standalone_filler_sentence_is_dropped() {
        let chapter = "# A: B\n\nit worked. um. then i left.\n";
        let out = polish_content(chapter, &PolishSettings::default()).unwrap();
        assert_eq!(out, "# A: B\n\nIt worked. Then I left.\n");
    }

    #[test]
    fn test_polish_dir_skips_introduction() {
        let tmp = tempfile::tempdir().unwrap();
        let intro = "# Introduction\n\num, welcome to this book.\n";
        std::fs::write(tmp.path().join("000-introduction.md"), intro).unwrap();
        std::fs::write(tmp.path().join("001-a.md"), "# A: B\n\num hello.\n").unwrap();

        let report = polish_dir(tmp.path(), None, &PolishSettings::default()).unwrap();
        assert_eq!(report.polished, 1);
        assert_eq!(report.unchanged, 0);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("000-introduction.md")).unwrap(),
            intro
        );
    }

    #[test]
    fn test_polish_dir_counts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("001-a.md"), "# A: B\n\num hello.\n").unwrap();
        std::fs::write(tmp.path().join("002-b.md"), "# C: D\n\nAlready clean.\n").unwrap();
        std::fs::write(
            tmp.path().join("003-c.md"),
            "# E: F\n\n<!-- placeholder -->\nPending.\n",
        )
        .unwrap();

        let report = polish_dir(tmp.path(), None, &PolishSettings::default()).unwrap();
        assert_eq!(
            report,
            PolishReport {
                polished: 1,
                unchanged: 1,
                placeholders: 1
            }
        );
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("001-a.md")).unwrap(),
            "# A: B\n\nHello.\n"
        );
    }
}
