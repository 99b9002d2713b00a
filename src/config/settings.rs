//! Configuration settings for Talkbook.

use crate::error::{Result, TalkbookError};
use crate::series::SeriesPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tools: ToolSettings,
    pub youtube: YoutubeSettings,
    pub fetch: FetchSettings,
    pub normalize: NormalizeSettings,
    pub polish: PolishSettings,
    pub book: BookSettings,
    /// Configured series, one per playlist-to-book project.
    pub series: Vec<SeriesConfig>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory holding `data/`, `content/` and `build/`.
    pub project_root: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            project_root: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Locations of external tools. `None` means "look it up on PATH".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// yt-dlp binary. Falls back to `YTDLP`/`YT_DLP` and PATH.
    pub yt_dlp: Option<String>,
    /// Browser driver command for the browser fallback.
    pub browser: String,
    /// Extra arguments for the browser driver (the URL is appended last).
    pub browser_args: Vec<String>,
    /// pandoc binary for document export.
    pub pandoc: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            yt_dlp: None,
            browser: "chromium".to_string(),
            browser_args: vec![
                "--headless=new".to_string(),
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-renderer-backgrounding".to_string(),
                "--virtual-time-budget=15000".to_string(),
                "--dump-dom".to_string(),
            ],
            pandoc: "pandoc".to_string(),
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    /// Base URL for watch, playlist and caption requests.
    pub base_url: String,
    /// User agent sent with page requests.
    pub user_agent: String,
    /// HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Attempts per HTTP request.
    pub retries: u32,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            base_url: "https://www.youtube.com".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            request_timeout_seconds: 20,
            retries: 3,
        }
    }
}

/// Transcript acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Try the transcript API path.
    pub use_api: bool,
    /// Try the authenticated yt-dlp path.
    pub use_downloader: bool,
    /// Try the browser automation path.
    pub use_browser: bool,
    /// Netscape cookie export file (used by yt-dlp and direct requests).
    pub cookies_file: Option<String>,
    /// Browser name for `yt-dlp --cookies-from-browser`.
    pub cookies_from_browser: Option<String>,
    /// Hard per-video limit for the browser path.
    pub browser_timeout_seconds: u64,
    /// Delay between videos, in milliseconds.
    pub sleep_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            use_api: true,
            use_downloader: true,
            use_browser: true,
            cookies_file: None,
            cookies_from_browser: None,
            browser_timeout_seconds: 90,
            sleep_ms: 300,
        }
    }
}

impl FetchSettings {
    /// Expanded cookie file path, if configured.
    pub fn cookies_path(&self) -> Option<PathBuf> {
        self.cookies_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Settings::expand_path)
    }
}

/// Transcript normalization thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Target paragraph length in characters.
    pub paragraph_chars: usize,
    /// Runs without sentence punctuation longer than this are split at a word boundary.
    pub max_unpunctuated_chars: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            paragraph_chars: 800,
            max_unpunctuated_chars: 2400,
        }
    }
}

/// Chapter polishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolishSettings {
    /// Filler words and phrases removed from prose.
    pub filler_words: Vec<String>,
    /// Terms forced to upper case.
    pub acronyms: Vec<String>,
    /// Insert generic section headings into long chapters.
    pub add_subheadings: bool,
}

impl Default for PolishSettings {
    fn default() -> Self {
        Self {
            filler_words: ["um", "uh", "er", "ah", "you know", "i mean", "kind of", "sort of"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            acronyms: vec!["AI".to_string(), "YC".to_string()],
            add_subheadings: false,
        }
    }
}

/// Chapter and manuscript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookSettings {
    /// Zero-padding width of chapter sequence numbers.
    pub chapter_digits: usize,
    /// First chapter index assigned to a new series.
    pub start_index: u32,
    /// Formats passed to pandoc after the manuscript is built (epub, pdf, docx).
    pub export_formats: Vec<String>,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            chapter_digits: 3,
            start_index: 1,
            export_formats: Vec::new(),
        }
    }
}

/// One configured series.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SeriesConfig {
    /// Identifier used for directory names.
    pub slug: String,
    /// Human readable title; also the default book title.
    pub title: String,
    pub description: String,
    /// Playlist id or URL.
    pub playlist_id: Option<String>,
    /// Search query used when no playlist id is configured.
    pub playlist_query: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    /// Optional `key: value` metadata file, relative to the project root.
    pub metadata_file: Option<String>,
}

impl SeriesConfig {
    /// Create a series entry with a title derived from the slug.
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title_from_slug(slug),
            ..Default::default()
        }
    }
}

/// "ai-startup-school" -> "Ai Startup School".
fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TalkbookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("talkbook")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded project root.
    pub fn project_root(&self) -> PathBuf {
        Self::expand_path(&self.general.project_root)
    }

    /// Look up a series by slug.
    pub fn series(&self, slug: &str) -> Result<&SeriesConfig> {
        self.series
            .iter()
            .find(|s| s.slug == slug)
            .ok_or_else(|| TalkbookError::SeriesNotFound(slug.to_string()))
    }

    /// Resolve the directory layout for a series.
    pub fn series_paths(&self, series: &SeriesConfig) -> SeriesPaths {
        let metadata = series
            .metadata_file
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| {
                let p = Self::expand_path(f);
                if p.is_absolute() {
                    p
                } else {
                    self.project_root().join(p)
                }
            });
        SeriesPaths::new(self.project_root(), &series.slug, metadata)
    }

    /// Insert or replace a series entry, keeping slug order.
    pub fn upsert_series(&mut self, series: SeriesConfig) {
        match self.series.iter_mut().find(|s| s.slug == series.slug) {
            Some(existing) => *existing = series,
            None => self.series.push(series),
        }
        self.series.sort_by(|a, b| a.slug.cmp(&b.slug));
    }
}
