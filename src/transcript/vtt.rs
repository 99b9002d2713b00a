//! WebVTT (and SRT-style) caption parsing.

use super::Cue;

/// Parse a subtitle payload into cues.
///
/// Header blocks (`WEBVTT`, `Kind:`, `Language:`), `NOTE`/`STYLE`/`REGION`
/// blocks and cue identifiers are dropped. Only lines that follow a timing
/// line count as cue text, so stray metadata can never leak into the output.
pub fn parse_vtt(payload: &str) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut current: Option<Cue> = None;
    let mut skipping_block = false;

    for raw in payload.lines() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        // Only a truly empty line ends a block; auto-generated captions use
        // single-space lines inside cues.
        if line.is_empty() {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            skipping_block = false;
            continue;
        }

        if skipping_block {
            continue;
        }

        if current.is_none() && is_block_marker(trimmed) {
            skipping_block = true;
            continue;
        }

        if let Some((start, end)) = parse_timing_line(trimmed) {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            current = Some(Cue::new(start, end, String::new()));
            continue;
        }

        match current.as_mut() {
            Some(cue) => {
                if !cue.text.is_empty() {
                    cue.text.push('\n');
                }
                cue.text.push_str(trimmed);
            }
            // Cue identifiers, header declarations and anything else outside a cue.
            None => continue,
        }
    }

    if let Some(cue) = current.take() {
        cues.push(cue);
    }

    cues
}

fn is_block_marker(line: &str) -> bool {
    line.starts_with("WEBVTT")
        || line.starts_with("NOTE")
        || line.starts_with("STYLE")
        || line.starts_with("REGION")
}

/// `00:00:01.000 --> 00:00:03.500 align:start position:0%`
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_timestamp(left.trim())?;
    let end_token = right.split_whitespace().next()?;
    let end = parse_timestamp(end_token)?;
    Some((start, end))
}

/// Parse `HH:MM:SS.mmm`, `MM:SS.mmm` or the SRT comma variant into seconds.
pub fn parse_timestamp(ts: &str) -> Option<f64> {
    let ts = ts.replace(',', ".");
    let parts: Vec<&str> = ts.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };
    Some(h * 3600.0 + m * 60.0 + s)
}
