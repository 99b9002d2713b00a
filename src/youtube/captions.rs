//! Caption track metadata and language selection.

use super::page::text_from_runs;
use serde_json::Value;

/// One entry of `captions.playerCaptionsTracklistRenderer.captionTracks`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    pub name: String,
    /// True for automatic speech recognition tracks (`kind: "asr"`).
    pub auto_generated: bool,
    pub translatable: bool,
}

/// A track picked for download, with the URL to request.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackChoice {
    pub track: CaptionTrack,
    pub url: String,
    pub translated: bool,
}

/// Read the caption tracks out of a player response.
pub fn caption_tracks(player_response: &Value) -> Vec<CaptionTrack> {
    player_response["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .map(|tracks| {
            tracks
                .iter()
                .filter_map(|t| {
                    let base_url = t.get("baseUrl")?.as_str()?.to_string();
                    Some(CaptionTrack {
                        base_url,
                        language_code: t["languageCode"].as_str().unwrap_or_default().to_string(),
                        name: text_from_runs(&t["name"]),
                        auto_generated: t["kind"].as_str() == Some("asr"),
                        translatable: t["isTranslatable"].as_bool().unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn language_matches(code: &str, preferred: &str) -> bool {
    let code = code.to_ascii_lowercase();
    let preferred = preferred.to_ascii_lowercase();
    code == preferred
        || (!preferred.contains('-') && code.split('-').next() == Some(preferred.as_str()))
}

/// Pick the best track.
///
/// Order: a manual track in a preferred language, an auto-generated track in a
/// preferred language, the auto-generated track (spoken language), English
/// translation of a translatable track, and finally whatever track comes first.
pub fn select_track(tracks: &[CaptionTrack], preferred: &[String]) -> Option<TrackChoice> {
    let choose = |track: &CaptionTrack| TrackChoice {
        track: track.clone(),
        url: with_format(&track.base_url, "srv1"),
        translated: false,
    };

    for auto in [false, true] {
        for lang in preferred {
            if let Some(track) = tracks
                .iter()
                .find(|t| t.auto_generated == auto && language_matches(&t.language_code, lang))
            {
                return Some(choose(track));
            }
        }
    }

    if let Some(track) = tracks.iter().find(|t| t.auto_generated) {
        return Some(choose(track));
    }

    if let Some(track) = tracks.iter().find(|t| t.translatable) {
        let url = with_param(&with_format(&track.base_url, "srv1"), "tlang", "en");
        return Some(TrackChoice {
            track: track.clone(),
            url,
            translated: true,
        });
    }

    tracks.first().map(choose)
}

/// Force a caption `fmt` on a track URL, replacing any existing one.
pub fn with_format(url: &str, fmt: &str) -> String {
    with_param(url, "fmt", fmt)
}

fn with_param(url: &str, key: &str, value: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k != key)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            parsed
                .query_pairs_mut()
                .clear()
                .extend_pairs(pairs)
                .append_pair(key, value);
            parsed.to_string()
        }
        // Relative URLs from the page; append naively.
        Err(_) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}{key}={value}")
        }
    }
}
