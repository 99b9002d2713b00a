//! Path B: caption files via yt-dlp, optionally authenticated with cookies.
//!
//! yt-dlp writes `<video_id>.<lang>.vtt` files into the series caption cache.
//! The best file for the preferred languages is normalized. When that yields
//! nothing and a cookie file is configured, the watch page is requested
//! directly with the session cookies and its caption tracks are read.

use super::cookies::load_cookie_header;
use super::watch_page::WatchPageCaptions;
use super::{Capability, FetchOutcome, TranscriptStrategy, VideoRef};
use crate::config::{NormalizeSettings, Settings};
use crate::error::{Result, TalkbookError};
use crate::http::HttpClient;
use crate::tools;
use crate::transcript::normalize;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Fetches caption files with yt-dlp.
pub struct DownloaderStrategy {
    program: String,
    subs_dir: PathBuf,
    languages: Vec<String>,
    cookies_file: Option<PathBuf>,
    cookies_from_browser: Option<String>,
    normalize: NormalizeSettings,
    direct: WatchPageCaptions,
    host: String,
}

impl DownloaderStrategy {
    pub fn new(http: HttpClient, settings: &Settings, subs_dir: PathBuf) -> Result<Self> {
        let host = url::Url::parse(http.base_url())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                TalkbookError::Config(format!("invalid youtube.base_url: {}", http.base_url()))
            })?;

        Ok(Self {
            program: tools::yt_dlp_program(&settings.tools),
            subs_dir,
            languages: settings.youtube.languages.clone(),
            cookies_file: settings.fetch.cookies_path(),
            cookies_from_browser: settings
                .fetch
                .cookies_from_browser
                .clone()
                .filter(|b| !b.trim().is_empty()),
            normalize: settings.normalize.clone(),
            direct: WatchPageCaptions::new(http, settings),
            host,
        })
    }

    fn args(&self, url: &str) -> Vec<String> {
        let template = self.subs_dir.join("%(id)s.%(ext)s");
        let mut args = vec![
            "--skip-download".to_string(),
            "--write-auto-sub".to_string(),
            "--write-sub".to_string(),
            "--sub-lang".to_string(),
            self.languages.join(","),
            "--sub-format".to_string(),
            "vtt".to_string(),
            "--extractor-args".to_string(),
            "youtube:player_client=web,web_creator,ios|njsig".to_string(),
            "--ignore-no-formats-error".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ];

        if let Some(file) = &self.cookies_file {
            args.push("--cookies".to_string());
            args.push(file.to_string_lossy().into_owned());
        } else if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }
        args.push(url.to_string());
        args
    }

    /// Run yt-dlp and normalize the best caption file it left behind.
    async fn via_yt_dlp(&self, video: &VideoRef) -> Result<String> {
        std::fs::create_dir_all(&self.subs_dir)?;

        if find_caption_file(&self.subs_dir, &video.video_id, &self.languages).is_none() {
            let cmd = tools::command(&self.program, self.args(&video.url));
            tools::run(&self.program, cmd).await?;
        } else {
            info!("Using cached caption file");
        }

        match find_caption_file(&self.subs_dir, &video.video_id, &self.languages) {
            Some(path) => {
                debug!(path = %path.display(), "parsing caption file");
                let payload = std::fs::read_to_string(&path)?;
                Ok(normalize(&payload, &self.normalize))
            }
            None => Ok(String::new()),
        }
    }

    /// Watch page request carrying the exported session cookies.
    async fn via_cookies(&self, video: &VideoRef, cookies: &Path) -> Result<FetchOutcome> {
        let Some(header) = load_cookie_header(cookies, &self.host)? else {
            return Ok(FetchOutcome::Unavailable(
                "cookie file has no cookies for this site".to_string(),
            ));
        };
        self.direct.fetch(video, Some(&header)).await
    }
}

#[async_trait]
impl TranscriptStrategy for DownloaderStrategy {
    fn name(&self) -> &str {
        "downloader"
    }

    fn capability(&self) -> Capability {
        Capability::AuthenticatedDownloader
    }

    #[instrument(skip_all, fields(video_id = %video.video_id))]
    async fn fetch(&self, video: &VideoRef) -> FetchOutcome {
        let mut reason = match self.via_yt_dlp(video).await {
            Ok(text) if !text.is_empty() => return FetchOutcome::Available(text),
            Ok(_) => "no caption file".to_string(),
            Err(e) => {
                warn!(error = %e, "yt-dlp caption download failed");
                e.to_string()
            }
        };

        if let Some(cookies) = &self.cookies_file {
            debug!("retrying with cookie header");
            match self.via_cookies(video, cookies).await {
                Ok(FetchOutcome::Available(text)) => return FetchOutcome::Available(text),
                Ok(FetchOutcome::Unavailable(r)) => reason = format!("{reason}; {r}"),
                Err(e) => reason = format!("{reason}; cookies: {e}"),
            }
        }

        FetchOutcome::Unavailable(reason)
    }
}

/// Pick the caption file for `video_id` that best matches the language list.
///
/// Files are named `<id>.<lang>.vtt` (or `<id>.vtt`). Earlier languages in the
/// list score higher; unknown languages are a last resort.
pub fn find_caption_file(dir: &Path, video_id: &str, languages: &[String]) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .flatten()
        .map(|e| e.path())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            let rest = name.strip_prefix(video_id)?;
            let lang = if rest.eq_ignore_ascii_case(".vtt") {
                ""
            } else {
                rest.strip_prefix('.')?.strip_suffix(".vtt")?
            };
            let rank = if lang.is_empty() {
                languages.len()
            } else {
                languages
                    .iter()
                    .position(|l| l.eq_ignore_ascii_case(lang))
                    .unwrap_or(languages.len() + 1)
            };
            Some((rank, name, path))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, _, path)| path)
}
