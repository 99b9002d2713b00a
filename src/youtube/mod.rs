//! YouTube page plumbing: ids, embedded JSON, caption tracks, playlists, titles.

mod captions;
mod discovery;
mod page;
mod titles;

pub use captions::{caption_tracks, select_track, with_format, CaptionTrack, TrackChoice};
pub use discovery::{best_playlist, parse_flat_playlist, playlist_entries, Discovery};
pub use page::{balanced_object, find_key, initial_data, player_response, text_from_runs};
pub use titles::{looks_like_person, split_title_and_speaker, strip_series_suffix};

use regex::Regex;
use std::sync::LazyLock;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:
            # Full YouTube URLs
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:\S*?&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        # Bare video ID
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("valid regex")
});

static PLAYLIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=([a-zA-Z0-9_-]+)").expect("valid regex"));

static BARE_PLAYLIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{12,}$").expect("valid regex"));

/// Extract an 11-character video id from a URL or a bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = VIDEO_ID_RE.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Extract a playlist id from a URL (`list=`) or accept a bare id.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(caps) = PLAYLIST_ID_RE.captures(input) {
        return Some(caps[1].to_string());
    }
    BARE_PLAYLIST_RE
        .is_match(input)
        .then(|| input.to_string())
}

/// Watch page URL for a video id under `base_url`.
pub fn watch_url(base_url: &str, video_id: &str) -> String {
    format!("{}/watch?v={}", base_url.trim_end_matches('/'), video_id)
}
