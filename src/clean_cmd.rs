use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{CleanArgs, ConfigOverrides},
    config::{CleanConfig, ConfigFile, DEFAULT_OUTPUT_FILE_NAME},
    events::{LogSink, Tee, Transcript},
    io_utils,
    pipeline,
    source::FileSource,
};

/// Loads the optional config file, applies CLI overrides and validates.
///
/// `output` names the cleaned file; it replaces the default file name used by
/// the bulk-load statement.
pub(crate) fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
    output: Option<&Path>,
) -> Result<CleanConfig> {
    let mut file = match path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    overrides.apply(&mut file);
    if file.output_file_name == DEFAULT_OUTPUT_FILE_NAME
        && let Some(name) = output.and_then(Path::file_name)
    {
        file.output_file_name = name.to_string_lossy().into_owned();
    }
    let config = CleanConfig::try_from(file).context("Validating configuration")?;
    Ok(config)
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let config = load_config(
        args.config.as_deref(),
        &args.overrides,
        Some(args.output.as_path()),
    )?;
    info!(
        "Cleaning '{}' into '{}' ({} encoding)",
        args.input.display(),
        args.output.display(),
        config.encoding.name()
    );

    let source = FileSource::open(&args.input)
        .with_context(|| format!("Opening input file {:?}", args.input))?;
    let mut sink = io_utils::create_output_file(&args.output)?;
    let mut log_sink = LogSink;
    let mut transcript = args.transcript.as_ref().map(|_| Transcript::new());
    let result = match transcript.as_mut() {
        Some(transcript) => {
            let mut events = Tee {
                first: &mut log_sink,
                second: transcript,
            };
            pipeline::clean(source, &config, &mut sink, &mut events)
        }
        None => pipeline::clean(source, &config, &mut sink, &mut log_sink),
    }
    .with_context(|| format!("Cleaning {:?}", args.input))?;

    if let Some(path) = &args.sql {
        let sql = format!("{}\n{}", result.create_table_sql, result.bulk_load_sql);
        io_utils::write_text_file(path, &sql)?;
        info!("SQL statements written to {path:?}");
    }
    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&result).context("Serializing run summary")?;
        io_utils::write_text_file(path, &json)?;
        info!("Run summary written to {path:?}");
    }
    if let (Some(path), Some(transcript)) = (&args.transcript, &transcript) {
        io_utils::write_text_file(path, &transcript.render())?;
    }

    info!(
        "Wrote {} of {} row(s) across {} column(s) to {:?}",
        result.stats.cleaned_rows,
        result.stats.original_rows,
        result.stats.columns,
        args.output
    );
    Ok(())
}
