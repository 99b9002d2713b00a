//! Talkbook - turn a YouTube playlist of talks into a Markdown book
//!
//! # Overview
//!
//! Talkbook works on a *series*: one playlist that becomes one book. For each
//! series it can:
//! - Resolve the playlist (by id, URL or search) and list its videos
//! - Fetch a transcript per video, falling back from the public caption
//!   endpoints to yt-dlp (optionally with cookies) to a headless browser
//! - Fill in missing dates and source links
//! - Write one numbered Markdown chapter per talk, polish the prose, and
//!   assemble everything into `book.md` (optionally converted with pandoc)
//!
//! # Architecture
//!
//! - `config` - Settings and series configuration
//! - `series` - Talk records and on-disk layout
//! - `transcript` - Caption payload parsing and normalization
//! - `youtube` - Page scraping, caption tracks, playlists, title splitting
//! - `fetch` - Transcript strategies with ordered fallback
//! - `enrich` - Metadata backfill
//! - `book` - Chapters, polishing, assembly and export
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use talkbook::config::Settings;
//! use talkbook::orchestrator::{Pipeline, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings, "ai-startup-school")?;
//!     let report = pipeline.run(&PipelineOptions::default()).await?;
//!     println!("{} chapters in the book", report.book_chapters);
//!     Ok(())
//! }
//! ```

pub mod book;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod http;
pub mod orchestrator;
pub mod series;
pub mod tools;
pub mod transcript;
pub mod youtube;

pub use error::{Result, TalkbookError};
