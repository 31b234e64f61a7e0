//! Error taxonomy for the cleaning engine.
//!
//! Only failures that make a run impossible surface as [`CleanError`]:
//! the source cannot be read, the output sink rejects a chunk, or the
//! configuration is invalid. Problems with individual rows are absorbed by
//! the pipeline and reported through the event sink instead.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("Reading source bytes {offset}..{end}: {source}")]
    SourceRead {
        offset: u64,
        end: u64,
        #[source]
        source: io::Error,
    },
    #[error("Writing output chunk {index}: {source}")]
    Output {
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("Serializing output row: {0}")]
    Serialize(#[from] csv::Error),
    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CleanError>;
