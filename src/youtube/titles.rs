//! Splitting raw video titles into talk title and speaker.

use regex::Regex;
use std::sync::LazyLock;

static BY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+by\s+(.+)$").expect("valid regex"));

static WITH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+with\s+(.+)$").expect("valid regex"));

static COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):\s*(.+)$").expect("valid regex"));

static DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\-|–—]+)\s[\-–—]\s*(.+)$").expect("valid regex"));

/// Remove a trailing series marker such as `| Startup School` or `(Startup School 2025)`.
pub fn strip_series_suffix(title: &str, series_title: &str) -> String {
    let series_title = series_title.trim();
    if series_title.is_empty() {
        return title.trim().to_string();
    }
    let escaped = regex::escape(series_title);
    let patterns = [
        format!(r"(?i)\s*[|\-–—]\s*{escaped}.*$"),
        format!(r"(?i)\s*\({escaped}[^)]*\)\s*$"),
    ];
    let mut out = title.to_string();
    for pattern in &patterns {
        if let Ok(re) = Regex::new(pattern) {
            out = re.replace(&out, "").into_owned();
        }
    }
    out.trim().to_string()
}

fn is_capitalised(token: &str) -> bool {
    token
        .split('-')
        .filter(|p| !p.is_empty())
        .all(|p| p.chars().next().is_some_and(char::is_uppercase))
}

/// Heuristic: one to six capitalised tokens, allowing one lower-case particle.
pub fn looks_like_person(name: &str) -> bool {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 6 {
        return false;
    }
    let capitalised = tokens.iter().filter(|tok| is_capitalised(tok)).count();
    capitalised >= tokens.len().saturating_sub(1).max(1)
}

/// Split a raw video title into `(talk title, speaker)`.
///
/// Recognised shapes, in order: `Talk by Speaker`, `Talk with Speaker`,
/// `Speaker: Talk`, `Speaker - Talk`, and `Talk | Role Speaker Name`.
pub fn split_title_and_speaker(raw: &str, series_title: Option<&str>) -> (String, Option<String>) {
    let title = match series_title {
        Some(series) => strip_series_suffix(raw, series),
        None => raw.trim().to_string(),
    };

    for re in [&*BY_RE, &*WITH_RE] {
        if let Some(caps) = re.captures(&title) {
            let (talk, speaker) = (caps[1].trim(), caps[2].trim());
            if looks_like_person(speaker) {
                return (talk.to_string(), Some(speaker.to_string()));
            }
        }
    }

    for re in [&*COLON_RE, &*DASH_RE] {
        if let Some(caps) = re.captures(&title) {
            let (left, right) = (caps[1].trim(), caps[2].trim());
            if looks_like_person(left) {
                return (right.to_string(), Some(left.to_string()));
            }
        }
    }

    // The tail after a pipe often carries a role before the name.
    if let Some((left, right)) = title.rsplit_once('|') {
        let tokens: Vec<&str> = right.split_whitespace().collect();
        for take in [4, 3, 2] {
            if tokens.len() >= take {
                let tail = &tokens[tokens.len() - take..];
                if tail.iter().all(|t| is_capitalised(t)) {
                    return (left.trim().to_string(), Some(tail.join(" ")));
                }
            }
        }
    }

    (title, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_series_suffix() {
        assert_eq!(
            strip_series_suffix("Building Agents | AI Startup School", "AI Startup School"),
            "Building Agents"
        );
        assert_eq!(
            strip_series_suffix("Building Agents (AI Startup School 2025)", "ai startup school"),
            "Building Agents"
        );
        assert_eq!(strip_series_suffix("Untouched", ""), "Untouched");
    }

    #[test]
    fn test_looks_like_person() {
        assert!(looks_like_person("Andrej Karpathy"));
        assert!(looks_like_person("Jean-Luc Picard"));
        assert!(looks_like_person("Ludwig van Beethoven"));
        assert!(!looks_like_person("the future of software"));
        assert!(!looks_like_person(""));
    }

    #[test]
    fn test_split_shapes() {
        let series = Some("AI Startup School");
        assert_eq!(
            split_title_and_speaker("The Future of Agents by Jane Doe", series),
            ("The Future of Agents".to_string(), Some("Jane Doe".to_string()))
        );
        assert_eq!(
            split_title_and_speaker("Jane Doe: Scaling Laws | AI Startup School", series),
            ("Scaling Laws".to_string(), Some("Jane Doe".to_string()))
        );
        assert_eq!(
            split_title_and_speaker("John Smith - Building Products", series),
            ("Building Products".to_string(), Some("John Smith".to_string()))
        );
        assert_eq!(
            split_title_and_speaker("Why Compute Matters | Anthropic Co-founder Jared Kaplan", None),
            ("Why Compute Matters".to_string(), Some("Jared Kaplan".to_string()))
        );
    }

    #[test]
    fn test_unrecognised_title_keeps_everything() {
        assert_eq!(
            split_title_and_speaker("what we learned shipping fast", None),
            ("what we learned shipping fast".to_string(), None)
        );
    }
}
