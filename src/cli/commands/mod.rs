//! CLI command implementations.

mod config;
mod doctor;
mod init;
mod list;
mod pipeline;
mod transcript;

pub use config::run_config;
pub use doctor::run_doctor;
pub use init::{run_init, InitOptions};
pub use list::run_list;
pub use pipeline::{
    run_export, run_fetch, run_ingest, run_pipeline, run_polish, run_stage, run_update,
    UpdateOptions,
};
pub use transcript::run_transcript;
