//! YouTube timed-text payloads: `srv1`/`srv3` XML and `json3`.

use super::Cue;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static SRV1_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<text\b([^>]*)>(.*?)</text>").expect("valid regex")
});

static SRV3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b([^>]*)>(.*?)</p>").expect("valid regex"));

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Parse timed-text XML. Handles `<text start dur>` (srv1) and `<p t d>` (srv3).
pub fn parse_xml(payload: &str) -> Vec<Cue> {
    let mut cues: Vec<Cue> = SRV1_RE
        .captures_iter(payload)
        .map(|caps| {
            let attrs = attributes(&caps[1]);
            let start = attr_f64(&attrs, "start").unwrap_or(0.0);
            let dur = attr_f64(&attrs, "dur").unwrap_or(2.0);
            Cue::new(start, start + dur, decode_twice(&caps[2]))
        })
        .collect();

    if cues.is_empty() {
        cues = SRV3_RE
            .captures_iter(payload)
            .map(|caps| {
                let attrs = attributes(&caps[1]);
                let start = attr_f64(&attrs, "t").unwrap_or(0.0) / 1000.0;
                let dur = attr_f64(&attrs, "d").unwrap_or(2000.0) / 1000.0;
                let inner = TAG_RE.replace_all(&caps[2], "");
                Cue::new(start, start + dur, decode_twice(&inner))
            })
            .collect();
    }

    cues
}

/// Parse a `json3` payload (`{"events":[{"tStartMs":..,"segs":[{"utf8":..}]}]}`).
///
/// Malformed JSON yields no cues.
pub fn parse_json3(payload: &str) -> Vec<Cue> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(payload) else {
        return Vec::new();
    };
    let Some(events) = json["events"].as_array() else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            let segs = event["segs"].as_array()?;
            let text: String = segs.iter().filter_map(|s| s["utf8"].as_str()).collect();
            if text.trim().is_empty() {
                return None;
            }
            let start = event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0;
            let dur = event["dDurationMs"].as_f64().unwrap_or(0.0) / 1000.0;
            Some(Cue::new(start, start + dur, text))
        })
        .collect()
}

fn attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

fn attr_f64(attrs: &[(String, String)], name: &str) -> Option<f64> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.parse().ok())
}

/// Timed-text XML is frequently double-escaped (`&amp;#39;`).
fn decode_twice(text: &str) -> String {
    decode_entities(&decode_entities(text))
}

/// Decode HTML entities (named and numeric) by parsing the text as an HTML fragment.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srv1() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="1.5">it&amp;#39;s here</text><text start="2" dur="2">second &amp;amp; last</text></transcript>"#;
        let cues = parse_xml(xml);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "it's here");
        assert_eq!(cues[0].end, 2.0);
        assert_eq!(cues[1].text, "second & last");
    }

    #[test]
    fn test_parse_srv3() {
        let xml = r#"<timedtext format="3"><body><p t="1000" d="2000"><s>hello</s><s> world</s></p></body></timedtext>"#;
        let cues = parse_xml(xml);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "hello world");
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].end, 3.0);
    }

    #[test]
    fn test_parse_json3() {
        let json = r#"{"events":[{"tStartMs":0,"dDurationMs":1500,"segs":[{"utf8":"good"},{"utf8":" morning"}]},{"tStartMs":1500,"segs":[{"utf8":"\n"}]},{"tStartMs":2000}]}"#;
        let cues = parse_json3(json);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "good morning");
        assert!(parse_json3("{not json").is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#39;c&#x27; &unknown;"), "a <b> 'c' &unknown;");
        assert_eq!(
            decode_entities("we&rsquo;re &ldquo;done&rdquo; &hellip; &mdash; x&nbsp;y"),
            "we\u{2019}re \u{201c}done\u{201d} \u{2026} \u{2014} x y"
        );
        assert_eq!(decode_entities("plain text"), "plain text");
    }
}
