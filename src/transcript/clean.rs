//! Text cleanup passes shared by the normalizer and the enrich stage.

use super::timedtext::decode_entities;
use super::Cue;
use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

static PAREN_ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((?:music|applause|laughter|laughs|inaudible|cheering|silence)[^)]*\)")
        .expect("valid regex")
});

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").expect("valid regex"));

static PARAGRAPH_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Strip markup, entities and non-speech annotations from one caption line.
pub fn clean_line(line: &str) -> String {
    let text = TAG_RE.replace_all(line, "");
    let text = decode_entities(&text);
    let text = BRACKET_RE.replace_all(&text, "");
    let text = PAREN_ANNOTATION_RE.replace_all(&text, "");
    let text = text.trim().trim_start_matches(">>").trim_start_matches('-');
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Collapse roll-up repetition and duplicate lines into one word stream.
///
/// Lines identical to the previously kept line are dropped, both inside a
/// cue and across cue boundaries. A cue that starts with a trailing part of
/// the previous cue only contributes the words after the overlap.
pub fn collapse_cues(cues: &[Cue]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut prev_cue: Vec<String> = Vec::new();
    let mut last_line: Option<String> = None;

    for cue in cues {
        let mut kept_lines = Vec::new();
        for raw in cue.text.lines() {
            let line = clean_line(raw);
            if line.is_empty() {
                continue;
            }
            if last_line.as_deref() == Some(line.as_str()) {
                continue;
            }
            last_line = Some(line.clone());
            kept_lines.push(line);
        }
        if kept_lines.is_empty() {
            continue;
        }

        let cue_words: Vec<String> = kept_lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .map(str::to_string)
            .collect();
        let skip = rollup_overlap(&prev_cue, &cue_words);
        words.extend(cue_words[skip..].iter().cloned());
        prev_cue = cue_words;
    }

    words
}

/// Length of the longest suffix of `prev` that is also a prefix of `next`.
///
/// A one-word overlap only counts when it is the whole previous cue; shorter
/// coincidences ("the" ... "the") are ordinary speech.
fn rollup_overlap(prev: &[String], next: &[String]) -> usize {
    let max = prev.len().min(next.len());
    for k in (1..=max).rev() {
        let tail = &prev[prev.len() - k..];
        let head = &next[..k];
        if tail.iter().zip(head).all(|(a, b)| same_word(a, b)) && (k >= 2 || k == prev.len()) {
            return k;
        }
    }
    0
}

fn same_word(a: &str, b: &str) -> bool {
    let strip = |w: &str| {
        w.trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase()
    };
    strip(a) == strip(b)
}

/// Split a word stream into sentences at `.`, `!` or `?` (closing quotes allowed).
fn sentences(words: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in words {
        current.push(word);
        let core = word.trim_end_matches(['"', '\'', ')', '\u{201d}']);
        if core.ends_with(['.', '!', '?']) {
            out.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

/// Break an unpunctuated run into word-aligned pieces of about `target` chars.
fn split_long_run(run: &str, target: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();
    for word in run.split_whitespace() {
        if !buf.is_empty() && buf.len() + 1 + word.len() > target {
            pieces.push(std::mem::take(&mut buf));
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(word);
    }
    if !buf.is_empty() {
        pieces.push(buf);
    }
    pieces
}

/// Re-flow words into paragraphs of roughly `target` characters.
///
/// Paragraphs only end at sentence boundaries, except inside a run without
/// any terminator longer than `max_unpunctuated`.
pub fn reflow(words: &[String], target: usize, max_unpunctuated: usize) -> Vec<String> {
    let target = target.max(1);
    let mut paragraphs = Vec::new();
    let mut buf = String::new();

    for sentence in sentences(words) {
        if sentence.len() > max_unpunctuated {
            if !buf.is_empty() {
                paragraphs.push(std::mem::take(&mut buf));
            }
            paragraphs.extend(split_long_run(&sentence, target));
            continue;
        }
        if !buf.is_empty() {
            buf.push(' ');
        }
        buf.push_str(&sentence);
        if buf.len() >= target {
            paragraphs.push(std::mem::take(&mut buf));
        }
    }
    if !buf.is_empty() {
        paragraphs.push(buf);
    }
    paragraphs
}

/// Clean already-paragraphed transcript text.
///
/// Removes annotations and stray tags, collapses whitespace, drops spaces
/// before punctuation and adds a missing space after punctuation between two
/// letters. Applying it twice changes nothing.
pub fn clean_text(text: &str) -> String {
    let cleaned: Vec<String> = PARAGRAPH_SPLIT_RE
        .split(text.trim())
        .map(|p| {
            let p = BRACKET_RE.replace_all(p, "");
            let p = PAREN_ANNOTATION_RE.replace_all(&p, "");
            let p = TAG_RE.replace_all(&p, "");
            let p = SPACE_RE.replace_all(&p, " ");
            let p = SPACE_BEFORE_PUNCT_RE.replace_all(&p, "$1");
            space_after_punctuation(p.trim())
        })
        .filter(|p| !p.is_empty())
        .collect();

    if cleaned.is_empty() {
        String::new()
    } else {
        cleaned.join("\n\n") + "\n"
    }
}

/// "one,two" -> "one, two"; "end.Next" -> "end. Next"; leaves "3.5" and "a.m." alone.
fn space_after_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        let prev = i.checked_sub(1).map(|j| chars[j]);
        let next = chars.get(i + 1).copied();
        let (Some(prev), Some(next)) = (prev, next) else {
            continue;
        };
        let needs_space = match c {
            ',' | ';' | '!' | '?' => prev.is_alphabetic() && next.is_alphabetic(),
            '.' => prev.is_lowercase() && next.is_uppercase(),
            _ => false,
        };
        if needs_space {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_clean_line_strips_markup_and_annotations() {
        assert_eq!(
            clean_line("<00:00:01.000><c> so</c><c> today</c> [Music] we &amp; you"),
            "so today we & you"
        );
        assert_eq!(clean_line(">> (laughter) right"), "right");
        assert_eq!(clean_line("[Applause]"), "");
    }

    #[test]
    fn test_rollup_prefix_extension() {
        let cues = vec![
            Cue::new(0.0, 1.0, "the".into()),
            Cue::new(1.0, 2.0, "the quick".into()),
            Cue::new(2.0, 3.0, "the quick brown fox".into()),
        ];
        assert_eq!(collapse_cues(&cues).join(" "), "the quick brown fox");
    }

    #[test]
    fn test_rollup_two_line_window() {
        let cues = vec![
            Cue::new(0.0, 1.0, "hello world".into()),
            Cue::new(1.0, 1.01, "hello world\n ".into()),
            Cue::new(1.01, 3.0, "hello world\nhow are you".into()),
            Cue::new(3.0, 5.0, "how are you\nfine thanks".into()),
        ];
        assert_eq!(
            collapse_cues(&cues).join(" "),
            "hello world how are you fine thanks"
        );
    }

    #[test]
    fn test_single_word_coincidence_is_kept() {
        let cues = vec![
            Cue::new(0.0, 1.0, "we went to the".into()),
            Cue::new(1.0, 2.0, "the store".into()),
        ];
        assert_eq!(collapse_cues(&cues).join(" "), "we went to the the store");
    }

    #[test]
    fn test_reflow_breaks_at_sentences() {
        let text = "One two three. Four five six. Seven eight nine.";
        let paras = reflow(&words(text), 20, 1000);
        assert_eq!(paras, vec!["One two three. Four five six.", "Seven eight nine."]);
        for p in &paras {
            assert!(p.ends_with('.'));
        }
    }

    #[test]
    fn test_reflow_splits_unpunctuated_runs() {
        let text = "word ".repeat(100);
        let paras = reflow(&words(&text), 50, 200);
        assert!(paras.len() > 1);
        assert!(paras.iter().all(|p| p.len() <= 50));
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let raw = "so [Music] we started ,and then(applause) it worked.Next we   shipped 3.5 versions\n\n\n<i>second</i> para";
        let once = clean_text(raw);
        assert_eq!(
            once,
            "so we started, and then it worked. Next we shipped 3.5 versions\n\nsecond para\n"
        );
        assert_eq!(clean_text(&once), once);
        assert_eq!(clean_text("  \n "), "");
    }
}
