//! Transcript normalization.
//!
//! Turns raw caption payloads (WebVTT, YouTube timed-text XML, `json3`) into
//! clean paragraph text. Normalization never fails: a payload that is empty
//! or cannot be parsed produces an empty string, and callers treat that as
//! "no transcript here".

mod clean;
mod timedtext;
mod vtt;

pub use clean::{clean_line, clean_text, collapse_cues, reflow};
pub use timedtext::{decode_entities, parse_json3, parse_xml};
pub use vtt::{parse_timestamp, parse_vtt};

use crate::config::NormalizeSettings;
use serde::{Deserialize, Serialize};

/// A single timed caption fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Raw text; may hold several lines.
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: String) -> Self {
        Self { start, end, text }
    }
}

/// Caption payload formats understood by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Vtt,
    TimedTextXml,
    Json3,
    /// Markup that is not timed text, e.g. an HTML error or consent page.
    Unknown,
}

impl PayloadFormat {
    /// Guess the format from the first non-blank characters.
    pub fn sniff(payload: &str) -> Self {
        let head = payload.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            PayloadFormat::Vtt
        } else if head.starts_with("<?xml")
            || head.starts_with("<transcript")
            || head.starts_with("<timedtext")
        {
            PayloadFormat::TimedTextXml
        } else if head.starts_with('<') {
            PayloadFormat::Unknown
        } else if head.starts_with('{') {
            PayloadFormat::Json3
        } else {
            PayloadFormat::Vtt
        }
    }
}

/// Parse a payload into cues using the sniffed format.
pub fn parse_payload(payload: &str) -> Vec<Cue> {
    match PayloadFormat::sniff(payload) {
        PayloadFormat::Vtt => parse_vtt(payload),
        PayloadFormat::TimedTextXml => parse_xml(payload),
        PayloadFormat::Json3 => parse_json3(payload),
        PayloadFormat::Unknown => Vec::new(),
    }
}

/// Normalize a raw caption payload into paragraph text.
pub fn normalize(payload: &str, settings: &NormalizeSettings) -> String {
    if payload.trim().is_empty() {
        return String::new();
    }
    normalize_cues(&parse_payload(payload), settings)
}

/// Normalize already-parsed cues into paragraph text.
pub fn normalize_cues(cues: &[Cue], settings: &NormalizeSettings) -> String {
    let words = collapse_cues(cues);
    if words.is_empty() {
        return String::new();
    }
    let paragraphs = reflow(
        &words,
        settings.paragraph_chars,
        settings.max_unpunctuated_chars,
    );
    paragraphs.join("\n\n") + "\n"
}
