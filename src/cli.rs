use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigFile, LineEnding, ModeKind};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean delimited files and generate table definitions",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a CSV/TSV file and write the cleaned copy plus SQL artifacts
    Clean(CleanArgs),
    /// Clean a file in memory and display the first rows with inferred types
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Input delimited file to clean
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination for the cleaned file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// YAML (or JSON) configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Write the CREATE TABLE and LOAD DATA statements here
    #[arg(long)]
    pub sql: Option<PathBuf>,
    /// Write a JSON summary (stats, headers, types, outliers) here
    #[arg(long)]
    pub summary: Option<PathBuf>,
    /// Write the human-readable log transcript here
    #[arg(long)]
    pub transcript: Option<PathBuf>,
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input delimited file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of cleaned rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// YAML (or JSON) configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Command-line settings that take precedence over the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Cleaning mode (advanced enables the extra cell transforms)
    #[arg(long, value_enum)]
    pub mode: Option<ModeKind>,
    /// Table name used in the generated SQL
    #[arg(long = "table")]
    pub table: Option<String>,
    /// Line terminator of the cleaned file
    #[arg(long = "line-ending", value_enum)]
    pub line_ending: Option<LineEnding>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Prepend a sequential id column, replacing any existing one
    #[arg(long = "generate-id")]
    pub generate_id: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, file: &mut ConfigFile) {
        if let Some(mode) = self.mode {
            file.mode = mode;
        }
        if let Some(table) = &self.table {
            file.table_name.clone_from(table);
        }
        if let Some(line_ending) = self.line_ending {
            file.line_ending = line_ending;
        }
        if let Some(encoding) = &self.input_encoding {
            file.encoding.clone_from(encoding);
        }
        if self.generate_id {
            file.generate_id = true;
        }
    }
}
