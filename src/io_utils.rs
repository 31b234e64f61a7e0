//! I/O utilities shared by the pipeline and the command-line host.
//!
//! - **Separator detection**: guesses the field delimiter from the header line.
//! - **Encoding**: resolves declared encoding labels via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **Chunk sinks**: destinations for the produced output chunks, either an
//!   in-memory `Vec<String>` or any [`Write`] implementation.
//! - **Row writer**: the `csv` writer configuration used to serialize rows.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result as AnyResult};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    config::LineEnding,
    error::{CleanError, Result},
};

pub const DEFAULT_DELIMITER: u8 = b',';

/// Candidate delimiters in tie-break priority order.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Encoding::for_label(value.as_bytes())
            .ok_or_else(|| CleanError::UnknownEncoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

/// Picks the candidate delimiter occurring most often in `header_line`.
///
/// Ties go to the earlier candidate; a line with none of them yields a comma.
pub fn detect_separator(header_line: &str) -> u8 {
    let mut best = DEFAULT_DELIMITER;
    let mut best_count = 0usize;
    for candidate in CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

/// Builds the writer used to serialize output rows into an in-memory buffer.
pub(crate) fn row_writer(delimiter: u8, line_ending: LineEnding) -> csv::Writer<Vec<u8>> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .flexible(true)
        .terminator(line_ending.terminator());
    builder.from_writer(Vec::new())
}

/// Receives output chunks in production order. Chunk zero is the header.
pub trait ChunkSink {
    fn write_chunk(&mut self, chunk: &str) -> io::Result<()>;

    /// Called once after the last chunk.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ChunkSink for Vec<String> {
    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.push(chunk.to_string());
        Ok(())
    }
}

/// Streams chunks straight into a writer.
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ChunkSink for WriteSink<W> {
    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.inner.write_all(chunk.as_bytes())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub fn create_output_file(path: &Path) -> AnyResult<WriteSink<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    Ok(WriteSink::new(BufWriter::new(file)))
}

pub fn write_text_file(path: &Path, contents: &str) -> AnyResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Creating directory {parent:?}"))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Writing {path:?}"))
}
