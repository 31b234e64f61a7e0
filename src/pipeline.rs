//! The cleaning pass.
//!
//! [`clean`] drives a single sequential pass over the source: reconstruct a
//! logical record, parse it, reconcile its width with the header, run the
//! cell transforms, filter and de-duplicate, then serialize it into the
//! current output chunk. Chunks of [`FLUSH_ROWS`] rows go to the caller's
//! [`ChunkSink`] as soon as they fill up, so neither the input nor the output
//! is ever held in full.
//!
//! Per-row problems never abort a run. Only a failure to read the source or
//! to hand a chunk to the sink does.

use std::{borrow::Cow, collections::HashSet, io};

use itertools::Itertools;
use log::debug;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{
    columns::{self, ColumnProfile, HeaderLayout},
    config::{AdvancedOptions, CleanConfig},
    ddl,
    error::{CleanError, Result},
    events::{EventSink, Monotonic, Severity},
    inference::{self, ColumnTypes, InferredType},
    io_utils::{self, ChunkSink},
    outliers::{self, NumericSamples, OutlierReport},
    parser,
    source::{ByteSource, ChunkReader, LineCursor},
    transform::{date, email, encoding, nulls, number, phone, string_ops},
};

/// Output rows per chunk.
pub const FLUSH_ROWS: usize = 1000;
/// Physical lines appended to close an open quoted field.
pub const MAX_QUOTE_MERGES: usize = 50;
/// Following lines tried when a record has too few cells.
pub const MAX_RECONCILE_MERGES: usize = 10;
/// Records between cooperative yields, in addition to the per-flush yield.
pub const YIELD_EVERY_ROWS: usize = 5000;
/// Individually logged occurrences per problem kind.
const VERBOSE_LOG_LIMIT: usize = 5;
/// Joins cells inside dedup keys. Unit separator: not expected in data.
const KEY_SEPARATOR: char = '\u{1f}';

const PROGRESS_END_OF_PASS: u8 = 80;
const PROGRESS_TYPES: u8 = 85;
const PROGRESS_DONE: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    /// Data records seen, after multi-line reconstruction. Blank lines are
    /// not records.
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub removed_rows: usize,
    /// Output column count.
    pub columns: usize,
    /// Cells whose value was changed by at least one transform.
    pub fixed: usize,
    pub exact_duplicates: usize,
    pub fuzzy_duplicates: usize,
    pub empty_rows_removed: usize,
    pub rows_with_empty_removed: usize,
    pub column_mismatches: usize,
    pub merged_records: usize,
    pub skipped_malformed: usize,
    pub decode_replacements: usize,
}

/// Everything a run produces besides the output chunks themselves.
#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub stats: CleaningStats,
    pub raw_headers: Vec<String>,
    pub file_headers: Vec<String>,
    pub column_types: ColumnTypes,
    #[serde(serialize_with = "serialize_delimiter")]
    pub separator: u8,
    pub outliers: Vec<OutlierReport>,
    pub create_table_sql: String,
    pub bulk_load_sql: String,
}

fn serialize_delimiter<S: Serializer>(
    delimiter: &u8,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&io_utils::printable_delimiter(*delimiter))
}

enum RowOutcome {
    Kept(Vec<String>),
    Dropped,
}

/// Runs the whole cleaning pass over `source`.
///
/// Output chunks are written to `output` in order, the header first. The
/// sink's `finish` is called once after the last chunk.
pub fn clean<S, O, E>(
    source: S,
    config: &CleanConfig,
    output: &mut O,
    events: &mut E,
) -> Result<CleanResult>
where
    S: ByteSource,
    O: ChunkSink + ?Sized,
    E: EventSink + ?Sized,
{
    let mut events = Monotonic::new(events);
    let total_bytes = source.len();
    events.progress(0, "Reading");
    events.log(
        "📂",
        &format!(
            "Cleaning {total_bytes} byte(s) in {} mode",
            if config.advanced().is_some() { "advanced" } else { "standard" }
        ),
        Severity::Plain,
    );

    let reader = ChunkReader::new(source, config.chunk_size, config.encoding);
    let mut cursor = LineCursor::new(reader);

    let header_line = loop {
        match cursor.next_line(&mut events)? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break Some(line),
            None => break None,
        }
    };
    let Some(header_line) = header_line else {
        return empty_result(config, cursor, output, &mut events);
    };

    let separator = io_utils::detect_separator(&header_line);
    let layout = build_layout(&header_line, separator, config);
    events.log(
        "🔎",
        &format!(
            "Detected separator '{}' and {} column(s)",
            io_utils::printable_delimiter(separator),
            layout.raw().len()
        ),
        Severity::Plain,
    );
    debug!("Raw headers: {:?}", layout.raw());
    if let Some(idx) = layout.source_id() {
        let action = if layout.generates_id() { "replaced" } else { "kept" };
        events.log(
            "🆔",
            &format!("Existing id column at position {} will be {action}", idx + 1),
            Severity::Plain,
        );
    }

    let mut pass = RowPass::new(config, &layout, separator);
    pass.write_header(output)?;

    while let Some(line) = cursor.next_line(&mut events)? {
        if line.trim().is_empty() {
            continue;
        }
        pass.stats.original_rows += 1;
        let cells = pass.read_record(line, &mut cursor, &mut events)?;
        if let RowOutcome::Kept(row) = pass.process(cells, &mut events) {
            pass.push_row(&row, &mut events);
        }
        if pass.buffered >= FLUSH_ROWS {
            pass.flush(output)?;
            events.progress(cursor.process_percent(), "Processing");
            events.yield_now();
        }
        if pass.stats.original_rows % YIELD_EVERY_ROWS == 0 {
            events.yield_now();
        }
    }
    if pass.buffered > 0 {
        pass.flush(output)?;
        events.yield_now();
    }
    output.finish().map_err(|source| CleanError::Output {
        index: pass.chunk_index,
        source,
    })?;
    events.progress(PROGRESS_END_OF_PASS, "Processing");

    pass.stats.decode_replacements = cursor.reader().replacements();
    let result = pass.finish(&mut events);
    events.progress(PROGRESS_DONE, "Complete");
    Ok(result)
}

fn build_layout(header_line: &str, separator: u8, config: &CleanConfig) -> HeaderLayout {
    let names = parser::parse_row(header_line, separator)
        .iter()
        .map(|name| {
            if config.standard.sanitize_headers {
                columns::sanitize_column_name(name)
            } else {
                columns::tidy_column_name(name)
            }
        })
        .collect();
    HeaderLayout::new(columns::dedupe_headers(names), config.standard.generate_id)
}

fn empty_result<S, O, E>(
    config: &CleanConfig,
    cursor: LineCursor<S>,
    output: &mut O,
    events: &mut E,
) -> Result<CleanResult>
where
    S: ByteSource,
    O: ChunkSink + ?Sized,
    E: EventSink + ?Sized,
{
    events.log("⚠️", "Input contains no header line", Severity::Warn);
    output
        .finish()
        .map_err(|source| CleanError::Output { index: 0, source })?;
    let column_types = ColumnTypes::default();
    let result = CleanResult {
        stats: CleaningStats {
            decode_replacements: cursor.reader().replacements(),
            ..CleaningStats::default()
        },
        raw_headers: Vec::new(),
        file_headers: Vec::new(),
        create_table_sql: ddl::create_table_statement(
            &config.table_name,
            &[],
            &column_types,
            &config.primary_key,
        ),
        bulk_load_sql: ddl::bulk_load_statement(
            &config.output_file_name,
            &config.table_name,
            &[],
            io_utils::DEFAULT_DELIMITER,
            config.line_ending,
        ),
        column_types,
        separator: io_utils::DEFAULT_DELIMITER,
        outliers: Vec::new(),
    };
    events.progress(PROGRESS_DONE, "Complete");
    Ok(result)
}

/// Mutable state of one pass. Owned by a single thread of control.
struct RowPass<'a> {
    config: &'a CleanConfig,
    advanced: Option<&'a AdvancedOptions>,
    layout: &'a HeaderLayout,
    profiles: Vec<ColumnProfile>,
    separator: u8,
    writer: csv::Writer<Vec<u8>>,
    buffered: usize,
    chunk_index: usize,
    next_id: u64,
    exact_keys: HashSet<[u8; 32]>,
    fuzzy_keys: HashSet<[u8; 32]>,
    samples: NumericSamples,
    type_sample: Vec<Vec<String>>,
    stats: CleaningStats,
}

impl<'a> RowPass<'a> {
    fn new(config: &'a CleanConfig, layout: &'a HeaderLayout, separator: u8) -> Self {
        Self {
            config,
            advanced: config.advanced(),
            layout,
            profiles: layout.profiles(),
            separator,
            writer: io_utils::row_writer(separator, config.line_ending),
            buffered: 0,
            chunk_index: 0,
            next_id: 1,
            exact_keys: HashSet::new(),
            fuzzy_keys: HashSet::new(),
            samples: NumericSamples::new(),
            type_sample: Vec::new(),
            stats: CleaningStats {
                columns: layout.file().len(),
                ..CleaningStats::default()
            },
        }
    }

    fn width(&self) -> usize {
        self.layout.raw().len()
    }

    fn write_header<O: ChunkSink + ?Sized>(&mut self, output: &mut O) -> Result<()> {
        self.writer.write_record(self.layout.file())?;
        self.flush(output)
    }

    /// Turns the next physical line (and any continuation lines it needs)
    /// into exactly `width` cells.
    fn read_record<S, E>(
        &mut self,
        first: String,
        cursor: &mut LineCursor<S>,
        events: &mut E,
    ) -> Result<Vec<String>>
    where
        S: ByteSource,
        E: EventSink + ?Sized,
    {
        let mut logical = first;
        let mut merges = 0;
        while parser::has_unbalanced_quotes(&logical) && merges < MAX_QUOTE_MERGES {
            let Some(next) = cursor.next_line(events)? else {
                break;
            };
            logical.push('\n');
            logical.push_str(&next);
            merges += 1;
        }
        if merges > 0 {
            self.stats.merged_records += 1;
        }

        let mut cells = parser::parse_row(&logical, self.separator);
        let width = self.width();
        if cells.len() < width
            && let Some((merged, consumed)) = self.try_reconcile(&logical, cursor, events)?
        {
            cursor.discard(consumed);
            if merges == 0 {
                self.stats.merged_records += 1;
            }
            cells = merged;
        }

        if cells.len() != width {
            self.stats.column_mismatches += 1;
            if self.stats.column_mismatches <= VERBOSE_LOG_LIMIT {
                let action = if cells.len() < width { "padded" } else { "truncated" };
                events.log(
                    "⚠️",
                    &format!(
                        "Row {}: expected {width} column(s), found {}; {action}",
                        self.stats.original_rows,
                        cells.len()
                    ),
                    Severity::Warn,
                );
            }
            cells.resize(width, String::new());
        }
        Ok(cells)
    }

    /// Appends up to [`MAX_RECONCILE_MERGES`] following lines one at a time
    /// and returns the first merge whose width matches, with the number of
    /// lines it used. Merging only ever adds cells, so it stops early once a
    /// merge is already too wide.
    fn try_reconcile<S, E>(
        &self,
        logical: &str,
        cursor: &mut LineCursor<S>,
        events: &mut E,
    ) -> Result<Option<(Vec<String>, usize)>>
    where
        S: ByteSource,
        E: EventSink + ?Sized,
    {
        let width = self.width();
        let mut candidate = logical.to_string();
        for ahead in 0..MAX_RECONCILE_MERGES {
            let Some(next) = cursor.peek(ahead, events)? else {
                return Ok(None);
            };
            candidate.push('\n');
            candidate.push_str(next);
            let cells = parser::parse_row(&candidate, self.separator);
            if cells.len() == width {
                return Ok(Some((cells, ahead + 1)));
            }
            if cells.len() > width {
                return Ok(None);
            }
        }
        Ok(None)
    }

    fn process<E: EventSink + ?Sized>(
        &mut self,
        mut cells: Vec<String>,
        events: &mut E,
    ) -> RowOutcome {
        for (idx, cell) in cells.iter_mut().enumerate() {
            let original = cell.clone();
            self.transform_cell(idx, cell);
            if *cell != original {
                self.stats.fixed += 1;
            }
        }

        let standard = self.config.standard;
        if standard.remove_empty_rows && cells.iter().all(|cell| cell.trim().is_empty()) {
            self.stats.empty_rows_removed += 1;
            return RowOutcome::Dropped;
        }
        if standard.remove_rows_with_empty && cells.iter().any(|cell| cell.trim().is_empty()) {
            self.stats.rows_with_empty_removed += 1;
            return RowOutcome::Dropped;
        }

        if standard.remove_duplicates {
            let key = digest(&self.exact_key(&cells));
            if !self.exact_keys.insert(key) {
                self.stats.exact_duplicates += 1;
                return RowOutcome::Dropped;
            }
        }
        if standard.fuzzy_dedup {
            let folded = self.fuzzy_key(&cells);
            if !self.fuzzy_keys.insert(digest(&folded)) {
                self.stats.fuzzy_duplicates += 1;
                if self.stats.fuzzy_duplicates <= VERBOSE_LOG_LIMIT {
                    events.log(
                        "♻️",
                        &format!("Row {}: near-duplicate removed", self.stats.original_rows),
                        Severity::Plain,
                    );
                }
                return RowOutcome::Dropped;
            }
        }

        let mut row = self.layout.assemble(&cells, self.next_id);
        if self.layout.generates_id() {
            self.next_id += 1;
        }
        row.resize(self.layout.file().len(), String::new());
        RowOutcome::Kept(row)
    }

    fn transform_cell(&mut self, idx: usize, cell: &mut String) {
        let standard = self.config.standard;
        if standard.fix_encoding {
            apply(cell, encoding::repair_encoding);
        }
        if standard.trim_whitespace {
            apply(cell, string_ops::collapse_whitespace);
        }
        if standard.normalize_nulls {
            apply(cell, nulls::normalize_null);
        }

        let Some(advanced) = self.advanced else {
            return;
        };
        let Some(profile) = self.profiles.get(idx).copied() else {
            return;
        };
        if profile.source_id || cell.is_empty() {
            return;
        }
        if advanced.strip_html && string_ops::looks_like_html(cell) {
            apply(cell, string_ops::strip_html);
        }
        if advanced.fix_emails && email::is_email_candidate(cell) {
            apply(cell, email::repair_email);
        }
        if advanced.format_phones && profile.phone && phone::looks_like_phone(cell) {
            apply(cell, phone::format_phone);
        }
        if advanced.normalize_dates && date::looks_like_date(cell) {
            apply(cell, date::normalize_date);
        }
        if advanced.normalize_case {
            apply(cell, |value| string_ops::normalize_case(value, profile.case));
        }
        if advanced.strip_control_chars {
            apply(cell, string_ops::strip_control_chars);
        }
        if advanced.fix_number_formats {
            apply(cell, number::repair_number);
        }
        if advanced.detect_outliers
            && let Some(value) = number::parse_numeric(cell)
        {
            self.samples.entry(idx).or_default().push(value);
        }
    }

    fn exact_key(&self, cells: &[String]) -> String {
        self.layout
            .data_indices()
            .filter_map(|idx| cells.get(idx))
            .join(&KEY_SEPARATOR.to_string())
    }

    fn fuzzy_key(&self, cells: &[String]) -> String {
        self.layout
            .data_indices()
            .filter_map(|idx| cells.get(idx))
            .map(|cell| {
                cell.chars()
                    .filter(|ch| ch.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect::<String>()
            })
            .join(&KEY_SEPARATOR.to_string())
    }

    fn push_row<E: EventSink + ?Sized>(&mut self, row: &[String], events: &mut E) {
        match self.writer.write_record(row) {
            Ok(()) => {
                self.buffered += 1;
                self.stats.cleaned_rows += 1;
                if self.type_sample.len() < inference::SAMPLE_ROWS {
                    self.type_sample.push(row.to_vec());
                }
            }
            Err(err) => {
                self.stats.skipped_malformed += 1;
                events.log(
                    "⚠️",
                    &format!("Row {} skipped: {err}", self.stats.original_rows),
                    Severity::Warn,
                );
            }
        }
    }

    fn flush<O: ChunkSink + ?Sized>(&mut self, output: &mut O) -> Result<()> {
        let index = self.chunk_index;
        let fresh = io_utils::row_writer(self.separator, self.config.line_ending);
        let bytes = std::mem::replace(&mut self.writer, fresh)
            .into_inner()
            .map_err(|err| CleanError::Output {
                index,
                source: io::Error::other(err.to_string()),
            })?;
        let chunk = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        output
            .write_chunk(&chunk)
            .map_err(|source| CleanError::Output { index, source })?;
        self.chunk_index += 1;
        self.buffered = 0;
        Ok(())
    }

    fn finish<E: EventSink + ?Sized>(mut self, events: &mut E) -> CleanResult {
        let stats = &mut self.stats;
        stats.removed_rows = stats.original_rows.saturating_sub(stats.cleaned_rows);

        if stats.column_mismatches > VERBOSE_LOG_LIMIT {
            events.log(
                "⚠️",
                &format!(
                    "{} more row(s) had a column count mismatch",
                    stats.column_mismatches - VERBOSE_LOG_LIMIT
                ),
                Severity::Warn,
            );
        }
        if stats.fuzzy_duplicates > VERBOSE_LOG_LIMIT {
            events.log(
                "♻️",
                &format!(
                    "{} more near-duplicate row(s) removed",
                    stats.fuzzy_duplicates - VERBOSE_LOG_LIMIT
                ),
                Severity::Plain,
            );
        }
        if stats.exact_duplicates > 0 {
            events.log(
                "♻️",
                &format!("Removed {} duplicate row(s)", stats.exact_duplicates),
                Severity::Plain,
            );
        }
        if stats.decode_replacements > 0 {
            events.log(
                "⚠️",
                &format!(
                    "{} undecodable byte sequence(s) replaced",
                    stats.decode_replacements
                ),
                Severity::Warn,
            );
        }

        events.progress(PROGRESS_TYPES, "Detecting column types");
        let mut column_types =
            inference::infer_column_types(self.layout.file(), &self.type_sample);
        if self.layout.generates_id() {
            // The sample only sees the first ids; size the key for the last one.
            let last_id = self.next_id.saturating_sub(1);
            column_types.set(
                columns::ID_COLUMN,
                InferredType::integer_tier(u128::from(last_id)),
            );
        }

        let outliers = if self.config.detect_outliers() {
            outliers::detect_outliers(&self.samples, self.layout.raw())
        } else {
            Vec::new()
        };
        for report in &outliers {
            events.log(
                "📈",
                &format!(
                    "Column '{}': {} outlier(s) outside [{}, {}]",
                    report.column, report.count, report.lower_bound, report.upper_bound
                ),
                Severity::Warn,
            );
        }

        let create_table_sql = ddl::create_table_statement(
            &self.config.table_name,
            self.layout.file(),
            &column_types,
            &self.config.primary_key,
        );
        let bulk_load_sql = ddl::bulk_load_statement(
            &self.config.output_file_name,
            &self.config.table_name,
            self.layout.file(),
            self.separator,
            self.config.line_ending,
        );

        events.log(
            "✅",
            &format!(
                "Kept {} of {} row(s), removed {}, fixed {} cell(s)",
                self.stats.cleaned_rows,
                self.stats.original_rows,
                self.stats.removed_rows,
                self.stats.fixed
            ),
            Severity::Success,
        );

        CleanResult {
            stats: self.stats,
            raw_headers: self.layout.raw().to_vec(),
            file_headers: self.layout.file().to_vec(),
            column_types,
            separator: self.separator,
            outliers,
            create_table_sql,
            bulk_load_sql,
        }
    }
}

/// Replaces `cell` with the transform's output when it differs.
fn apply<F>(cell: &mut String, transform: F)
where
    F: for<'v> Fn(&'v str) -> Cow<'v, str>,
{
    let next = match transform(cell.as_str()) {
        Cow::Borrowed(unchanged) if unchanged == cell.as_str() => return,
        other => other.into_owned(),
    };
    *cell = next;
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}
