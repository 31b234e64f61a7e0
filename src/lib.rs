pub mod clean_cmd;
pub mod cli;
pub mod columns;
pub mod config;
pub mod ddl;
pub mod error;
pub mod events;
pub mod inference;
pub mod io_utils;
pub mod outliers;
pub mod parser;
pub mod pipeline;
pub mod preview;
pub mod source;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

pub use crate::{
    config::{CleanConfig, ConfigFile},
    error::CleanError,
    pipeline::{CleanResult, CleaningStats, clean},
};
use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_scrub", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => clean_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}
