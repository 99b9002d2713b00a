//! Configuration module for Talkbook.
//!
//! Handles loading and saving application settings and the series list.

mod settings;

pub use settings::{
    BookSettings, FetchSettings, GeneralSettings, NormalizeSettings, PolishSettings,
    SeriesConfig, Settings, ToolSettings, YoutubeSettings,
};
