//! Windowed reading of the input and line reconstruction.
//!
//! The source is read in fixed-size byte windows that ignore line boundaries.
//! Each window is decoded with a streaming `encoding_rs` decoder, so a
//! multi-byte sequence split across two windows decodes correctly. The text
//! after the last newline of a window is held back and prefixed to the next
//! one. Memory stays bounded by one window plus that leftover.

use std::{
    collections::VecDeque,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::{
    error::{CleanError, Result},
    events::EventSink,
};

const REPLACEMENT: char = '\u{fffd}';

/// A byte-addressable input with a known size.
pub trait ByteSource {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `[offset, offset + len)`, clamped to the end of the source.
    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;
}

#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::with_capacity(len);
        (&mut self.file)
            .take(len as u64)
            .read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// In-memory source, mostly for tests and previews of small inputs.
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl ByteSource for SliceSource<'_> {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_range(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.bytes.len());
        let end = start.saturating_add(len).min(self.bytes.len());
        Ok(self.bytes[start..end].to_vec())
    }
}

pub struct ChunkReader<S: ByteSource> {
    source: S,
    window: usize,
    encoding: &'static Encoding,
    decoder: Decoder,
    offset: u64,
    leftover: String,
    finished: bool,
    replacements: usize,
}

impl<S: ByteSource> ChunkReader<S> {
    pub fn new(source: S, window: usize, encoding: &'static Encoding) -> Self {
        Self {
            source,
            window: window.max(1),
            encoding,
            decoder: encoding.new_decoder(),
            offset: 0,
            leftover: String::new(),
            finished: false,
            replacements: 0,
        }
    }

    pub fn total_len(&self) -> u64 {
        self.source.len()
    }

    /// Bytes read so far.
    pub fn consumed(&self) -> u64 {
        self.offset
    }

    /// Malformed input sequences replaced with U+FFFD while decoding.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Starts over from the first byte with a fresh decoder.
    pub fn rewind(&mut self) {
        self.decoder = self.encoding.new_decoder();
        self.offset = 0;
        self.leftover.clear();
        self.finished = false;
        self.replacements = 0;
    }

    /// Reads and decodes the next window, returning the complete lines in it.
    ///
    /// A window without a newline yields an empty vector; `None` marks the end
    /// of input. Line terminators (`\n` or `\r\n`) are not included.
    pub fn next_window(&mut self) -> Result<Option<Vec<String>>> {
        if self.finished {
            return Ok(None);
        }
        let total = self.source.len();
        if self.offset >= total {
            self.finished = true;
            let tail = std::mem::take(&mut self.leftover);
            let tail = strip_cr(tail);
            return Ok((!tail.is_empty()).then(|| vec![tail]));
        }

        let end = self.offset.saturating_add(self.window as u64).min(total);
        let bytes = self
            .source
            .read_range(self.offset, self.window)
            .map_err(|source| CleanError::SourceRead {
                offset: self.offset,
                end,
                source,
            })?;
        if bytes.is_empty() {
            return Err(CleanError::SourceRead {
                offset: self.offset,
                end,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "source ended early"),
            });
        }
        self.offset += bytes.len() as u64;
        let last = self.offset >= total;

        let mut text = std::mem::take(&mut self.leftover);
        self.decode_into(&bytes, &mut text, last);

        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        // `split` always yields at least one piece: the unterminated tail.
        self.leftover = lines.pop().unwrap_or_default();
        Ok(Some(lines.into_iter().map(strip_cr).collect()))
    }

    fn decode_into(&mut self, bytes: &[u8], out: &mut String, last: bool) {
        let start = out.len();
        let mut input = bytes;
        let mut replaced = false;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len().saturating_mul(3));
            out.reserve(needed.max(4));
            let (result, read, had_replacements) = self.decoder.decode_to_string(input, out, last);
            replaced |= had_replacements;
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        if replaced {
            self.replacements += out[start..].matches(REPLACEMENT).count();
        }
    }
}

fn strip_cr(mut line: String) -> String {
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Line-at-a-time view over a [`ChunkReader`] with look-ahead.
///
/// Windows are only pulled when the buffered lines run out, or when a caller
/// peeks past them. Each pull reports read progress on a 0-50 scale.
pub struct LineCursor<S: ByteSource> {
    reader: ChunkReader<S>,
    pending: VecDeque<String>,
    exhausted: bool,
}

impl<S: ByteSource> LineCursor<S> {
    pub fn new(reader: ChunkReader<S>) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn reader(&self) -> &ChunkReader<S> {
        &self.reader
    }

    /// Read progress on the 0-50 scale.
    pub fn read_percent(&self) -> u8 {
        self.scaled(0, 50)
    }

    /// Processing progress on the 50-80 scale.
    pub fn process_percent(&self) -> u8 {
        self.scaled(50, 30)
    }

    fn scaled(&self, base: u64, span: u64) -> u8 {
        let total = self.reader.total_len();
        let fraction = if total == 0 {
            span
        } else {
            (self.reader.consumed().saturating_mul(span) / total).min(span)
        };
        u8::try_from(base + fraction).unwrap_or(u8::MAX)
    }

    fn pull<E: EventSink + ?Sized>(&mut self, events: &mut E) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        match self.reader.next_window()? {
            Some(lines) => {
                self.pending.extend(lines);
                events.progress(self.read_percent(), "Reading");
                Ok(true)
            }
            None => {
                self.exhausted = true;
                Ok(false)
            }
        }
    }

    pub fn next_line<E: EventSink + ?Sized>(&mut self, events: &mut E) -> Result<Option<String>> {
        while self.pending.is_empty() {
            if !self.pull(events)? {
                return Ok(None);
            }
        }
        Ok(self.pending.pop_front())
    }

    /// Looks `ahead` lines past the current position without consuming.
    pub fn peek<E: EventSink + ?Sized>(
        &mut self,
        ahead: usize,
        events: &mut E,
    ) -> Result<Option<&str>> {
        while self.pending.len() <= ahead {
            if !self.pull(events)? {
                break;
            }
        }
        Ok(self.pending.get(ahead).map(String::as_str))
    }

    /// Drops the next `count` buffered lines. Only lines already peeked at
    /// are ever discarded.
    pub fn discard(&mut self, count: usize) {
        let count = count.min(self.pending.len());
        self.pending.drain(..count);
    }
}
