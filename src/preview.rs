use std::io;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    clean_cmd,
    events::LogSink,
    io_utils::ChunkSink,
    pipeline::{self, FLUSH_ROWS},
    source::FileSource,
    table,
};

/// Keeps only the chunks needed to show the first `rows` cleaned rows.
struct PreviewSink {
    text: String,
    chunks_needed: usize,
    seen: usize,
}

impl PreviewSink {
    fn new(rows: usize) -> Self {
        Self {
            text: String::new(),
            chunks_needed: 1 + rows.div_ceil(FLUSH_ROWS).max(1),
            seen: 0,
        }
    }

    fn rows(&self, delimiter: u8, limit: usize) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(self.text.as_bytes());
        let mut rows = Vec::new();
        for (idx, record) in reader.records().take(limit).enumerate() {
            let record = record.with_context(|| format!("Reading cleaned row {}", idx + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

impl ChunkSink for PreviewSink {
    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        if self.seen < self.chunks_needed {
            self.text.push_str(chunk);
        }
        self.seen += 1;
        Ok(())
    }
}

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = clean_cmd::load_config(args.config.as_deref(), &args.overrides, None)?;
    let source = FileSource::open(&args.input)
        .with_context(|| format!("Opening input file {:?}", args.input))?;
    let mut sink = PreviewSink::new(args.rows);
    let result = pipeline::clean(source, &config, &mut sink, &mut LogSink)
        .with_context(|| format!("Cleaning {:?}", args.input))?;
    let rows = sink.rows(result.separator, args.rows)?;

    table::print_table(&result.file_headers, &rows);
    println!();
    print!("{}", table::render_column_types(&result.column_types));
    info!(
        "Displayed {} of {} cleaned row(s) from {:?}",
        rows.len(),
        result.stats.cleaned_rows,
        args.input
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_keeps_header_and_enough_chunks() {
        let mut sink = PreviewSink::new(5);
        sink.write_chunk("a,b\n").unwrap();
        sink.write_chunk("1,2\n3,4\n").unwrap();
        sink.write_chunk("5,6\n").unwrap();
        assert_eq!(sink.text, "a,b\n1,2\n3,4\n");
        let rows = sink.rows(b',', 1).unwrap();
        assert_eq!(rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }
}
