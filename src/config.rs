//! Run configuration.
//!
//! [`ConfigFile`] is the loose, fully-defaulted document read from YAML (or
//! assembled from CLI flags). It is validated exactly once into a
//! [`CleanConfig`], which the pipeline only ever borrows.
//!
//! Advanced transforms live inside [`Mode::Advanced`], so a standard-mode run
//! has no advanced flags to consult at all.

use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use clap::ValueEnum;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CleanError, Result},
    io_utils,
};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_TABLE_NAME: &str = "cleaned_data";
pub const DEFAULT_PRIMARY_KEY: &str = "id";
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "cleaned_data.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Escaped form for use inside SQL string literals.
    pub fn escaped(self) -> &'static str {
        match self {
            LineEnding::Lf => "\\n",
            LineEnding::Crlf => "\\r\\n",
        }
    }

    pub(crate) fn terminator(self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::Crlf => csv::Terminator::CRLF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Standard,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardOptions {
    pub fix_encoding: bool,
    pub trim_whitespace: bool,
    pub normalize_nulls: bool,
    pub sanitize_headers: bool,
    pub remove_empty_rows: bool,
    pub remove_rows_with_empty: bool,
    pub remove_duplicates: bool,
    pub fuzzy_dedup: bool,
    pub generate_id: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvancedOptions {
    pub strip_html: bool,
    pub fix_emails: bool,
    pub format_phones: bool,
    pub normalize_dates: bool,
    pub normalize_case: bool,
    pub strip_control_chars: bool,
    pub fix_number_formats: bool,
    pub detect_outliers: bool,
    /// Accepted but reserved; no transform is attached.
    pub cross_field_validation: bool,
    /// Accepted but reserved; no transform is attached.
    pub fill_missing: bool,
    /// Accepted but reserved; no transform is attached.
    pub standardize_address: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Standard,
    Advanced(AdvancedOptions),
}

#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub table_name: String,
    pub primary_key: String,
    pub output_file_name: String,
    pub line_ending: LineEnding,
    pub encoding: &'static Encoding,
    pub chunk_size: usize,
    pub standard: StandardOptions,
    pub mode: Mode,
}

impl CleanConfig {
    pub fn advanced(&self) -> Option<&AdvancedOptions> {
        match &self.mode {
            Mode::Advanced(options) => Some(options),
            Mode::Standard => None,
        }
    }

    pub fn detect_outliers(&self) -> bool {
        self.advanced().is_some_and(|options| options.detect_outliers)
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        // The default document is valid by construction.
        match CleanConfig::try_from(ConfigFile::default()) {
            Ok(config) => config,
            Err(err) => unreachable!("default configuration rejected: {err}"),
        }
    }
}

/// Serialized configuration document. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub mode: ModeKind,
    pub table_name: String,
    pub primary_key: String,
    pub output_file_name: String,
    pub line_ending: LineEnding,
    pub encoding: String,
    pub chunk_size: usize,

    pub fix_encoding: bool,
    pub trim_whitespace: bool,
    pub normalize_nulls: bool,
    pub sanitize_headers: bool,
    pub remove_empty_rows: bool,
    pub remove_rows_with_empty: bool,
    pub remove_duplicates: bool,
    pub fuzzy_dedup: bool,
    pub generate_id: bool,

    pub strip_html: bool,
    pub fix_emails: bool,
    pub format_phones: bool,
    pub normalize_dates: bool,
    pub normalize_case: bool,
    pub strip_control_chars: bool,
    pub fix_number_formats: bool,
    pub detect_outliers: bool,
    pub cross_field_validation: bool,
    pub fill_missing: bool,
    pub standardize_address: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            mode: ModeKind::Standard,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            line_ending: LineEnding::Lf,
            encoding: "utf-8".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            fix_encoding: true,
            trim_whitespace: true,
            normalize_nulls: true,
            sanitize_headers: false,
            remove_empty_rows: true,
            remove_rows_with_empty: false,
            remove_duplicates: true,
            fuzzy_dedup: false,
            generate_id: false,
            strip_html: true,
            fix_emails: true,
            format_phones: true,
            normalize_dates: true,
            normalize_case: true,
            strip_control_chars: true,
            fix_number_formats: true,
            detect_outliers: true,
            cross_field_validation: false,
            fill_missing: false,
            standardize_address: false,
        }
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> AnyResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }
}

impl TryFrom<ConfigFile> for CleanConfig {
    type Error = CleanError;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let table_name = file.table_name.trim().to_string();
        if table_name.is_empty() {
            return Err(CleanError::Config("table_name cannot be empty".into()));
        }
        let primary_key = file.primary_key.trim().to_string();
        if primary_key.is_empty() {
            return Err(CleanError::Config("primary_key cannot be empty".into()));
        }
        if file.chunk_size == 0 {
            return Err(CleanError::Config("chunk_size must be greater than zero".into()));
        }
        let output_file_name = file.output_file_name.trim().to_string();
        if output_file_name.is_empty() {
            return Err(CleanError::Config(
                "output_file_name cannot be empty".into(),
            ));
        }
        let encoding = io_utils::resolve_encoding(Some(&file.encoding))?;

        let standard = StandardOptions {
            fix_encoding: file.fix_encoding,
            trim_whitespace: file.trim_whitespace,
            normalize_nulls: file.normalize_nulls,
            sanitize_headers: file.sanitize_headers,
            remove_empty_rows: file.remove_empty_rows,
            remove_rows_with_empty: file.remove_rows_with_empty,
            remove_duplicates: file.remove_duplicates,
            fuzzy_dedup: file.fuzzy_dedup,
            generate_id: file.generate_id,
        };
        let mode = match file.mode {
            ModeKind::Standard => Mode::Standard,
            ModeKind::Advanced => Mode::Advanced(AdvancedOptions {
                strip_html: file.strip_html,
                fix_emails: file.fix_emails,
                format_phones: file.format_phones,
                normalize_dates: file.normalize_dates,
                normalize_case: file.normalize_case,
                strip_control_chars: file.strip_control_chars,
                fix_number_formats: file.fix_number_formats,
                detect_outliers: file.detect_outliers,
                cross_field_validation: file.cross_field_validation,
                fill_missing: file.fill_missing,
                standardize_address: file.standardize_address,
            }),
        };

        Ok(CleanConfig {
            table_name,
            primary_key,
            output_file_name,
            line_ending: file.line_ending,
            encoding,
            chunk_size: file.chunk_size,
            standard,
            mode,
        })
    }
}
