//! Dual-stream CSV encoder.
//!
//! Turns a sequence of [`GenerationUnit`]s into two independent byte streams:
//! one with a `(id, name)` row per parent, one with a `(parent_id, value)` row
//! per child. Both streams are lazy and chunked, and each one pulls from its
//! own private pass over the source, so a slow consumer on one side never
//! stalls the other.

pub mod decode;

pub use decode::decode_rows;

use crate::error::{EncodeError, SeedError};
use crate::generator::{GenerationUnit, Generator, Units};
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::Write as _;
use uuid::Uuid;

/// Default target size of an emitted chunk
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Row separator of the bulk-import format
pub const ROW_SEPARATOR: u8 = b'\n';

/// An encoded byte stream. Ends after the first error it yields.
pub type RowStream = BoxStream<'static, Result<Bytes, EncodeError>>;

/// Field delimiter and quote character of the CSV row format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    delimiter: u8,
    quote: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvFormat {
    pub fn new(delimiter: u8, quote: u8) -> Result<Self, SeedError> {
        for (what, byte) in [("delimiter", delimiter), ("quote", quote)] {
            if !byte.is_ascii() || byte == b'\n' || byte == b'\r' || byte == 0 {
                return Err(SeedError::Config(format!(
                    "CSV {} must be an ASCII character other than CR, LF or NUL, got {:?}",
                    what, byte as char
                )));
            }
        }
        if delimiter == quote {
            return Err(SeedError::Config(format!(
                "CSV delimiter and quote must differ (both {:?})",
                delimiter as char
            )));
        }
        Ok(Self { delimiter, quote })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Whether a field must be wrapped in quotes to survive a round trip
    fn needs_quoting(&self, field: &[u8]) -> bool {
        // An empty unquoted field reads back as NULL, and a lone `\.` line ends COPY data.
        field.is_empty()
            || field == b"\\."
            || memchr::memchr3(self.delimiter, self.quote, b'\n', field).is_some()
            || memchr::memchr(b'\r', field).is_some()
    }

    fn write_field(&self, buf: &mut BytesMut, field: &[u8]) {
        if !self.needs_quoting(field) {
            buf.put_slice(field);
            return;
        }

        buf.put_u8(self.quote);
        let mut start = 0;
        for pos in memchr::memchr_iter(self.quote, field) {
            buf.put_slice(&field[start..=pos]);
            buf.put_u8(self.quote);
            start = pos + 1;
        }
        buf.put_slice(&field[start..]);
        buf.put_u8(self.quote);
    }
}

/// Accumulates encoded rows, keeping the separator discipline across chunks.
///
/// The first row ever written has no leading separator; every later row is
/// prefixed with one, so the stream never starts or ends with a blank record.
/// Every field, uuid and float included, is quoted when it contains the
/// delimiter or the quote character.
pub struct RowBuffer {
    format: CsvFormat,
    buf: BytesMut,
    scratch: String,
    rows: u64,
    row_start: usize,
    fields_in_row: usize,
}

impl RowBuffer {
    pub fn new(format: CsvFormat) -> Self {
        Self {
            format,
            buf: BytesMut::new(),
            scratch: String::new(),
            rows: 0,
            row_start: 0,
            fields_in_row: 0,
        }
    }

    /// Encode one row. On error the partially written row is discarded.
    pub fn row<F>(&mut self, fields: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        self.row_start = self.buf.len();
        self.fields_in_row = 0;
        if self.rows > 0 {
            self.buf.put_u8(ROW_SEPARATOR);
        }

        match fields(self) {
            Ok(()) => {
                self.rows += 1;
                Ok(())
            }
            Err(e) => {
                self.buf.truncate(self.row_start);
                Err(e)
            }
        }
    }

    fn next_field(&mut self) {
        if self.fields_in_row > 0 {
            self.buf.put_u8(self.format.delimiter);
        }
        self.fields_in_row += 1;
    }

    pub fn uuid(&mut self, value: &Uuid) {
        self.next_field();
        let mut scratch = Uuid::encode_buffer();
        let text = value.hyphenated().encode_lower(&mut scratch);
        self.format.write_field(&mut self.buf, text.as_bytes());
    }

    pub fn text(&mut self, column: &'static str, value: &str) -> Result<(), EncodeError> {
        if memchr::memchr(0, value.as_bytes()).is_some() {
            return Err(EncodeError::NulByte { column });
        }
        self.next_field();
        self.format.write_field(&mut self.buf, value.as_bytes());
        Ok(())
    }

    pub fn float(&mut self, column: &'static str, value: f64) -> Result<(), EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NonFinite { column, value });
        }
        self.next_field();
        // Display emits the shortest representation that parses back to the same f64.
        // Writing into a String cannot fail.
        self.scratch.clear();
        let _ = write!(self.scratch, "{}", value);
        self.format.write_field(&mut self.buf, self.scratch.as_bytes());
        Ok(())
    }

    /// Total rows encoded so far, including rows already taken as chunks
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Hand off everything buffered so far
    pub fn take_chunk(&mut self) -> Bytes {
        self.row_start = 0;
        self.buf.split().freeze()
    }
}

/// Which side of a generation unit a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// `(id, name)` per parent
    Parents,
    /// `(parent_id, value)` per child
    Children,
}

impl Projection {
    pub fn encode(&self, unit: GenerationUnit, rows: &mut RowBuffer) -> Result<(), EncodeError> {
        let (parent, children) = unit.into_parts();
        match self {
            Projection::Parents => rows.row(|r| {
                r.uuid(&parent.id);
                r.text("name", &parent.name)
            }),
            Projection::Children => {
                for child in children {
                    rows.row(|r| {
                        r.uuid(&child.parent_id);
                        r.float("value", child.value)
                    })?;
                }
                Ok(())
            }
        }
    }
}

/// Pulls units and yields chunks of at least `chunk_size` bytes (the last one may be smaller).
pub struct ChunkEncoder<I> {
    units: I,
    projection: Projection,
    rows: RowBuffer,
    chunk_size: usize,
    finished: bool,
}

impl<I> ChunkEncoder<I>
where
    I: Iterator<Item = GenerationUnit>,
{
    pub fn new(units: I, projection: Projection, format: CsvFormat, chunk_size: usize) -> Self {
        Self {
            units,
            projection,
            rows: RowBuffer::new(format),
            chunk_size: chunk_size.max(1),
            finished: false,
        }
    }
}

impl<I> Iterator for ChunkEncoder<I>
where
    I: Iterator<Item = GenerationUnit>,
{
    type Item = Result<Bytes, EncodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while self.rows.len() < self.chunk_size {
            match self.units.next() {
                Some(unit) => {
                    if let Err(e) = self.projection.encode(unit, &mut self.rows) {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if self.rows.is_empty() {
            None
        } else {
            Some(Ok(self.rows.take_chunk()))
        }
    }
}

/// A source that can hand out any number of identical passes over its units
pub trait UnitSource {
    type Units: Iterator<Item = GenerationUnit> + Send + 'static;

    fn units(&self) -> Self::Units;
}

impl UnitSource for Generator {
    type Units = Units;

    fn units(&self) -> Units {
        Generator::units(self)
    }
}

/// The two encoded outputs of one dataset
pub struct EncodedStreams {
    pub parents: RowStream,
    pub children: RowStream,
}

/// Encoder configuration shared by both output streams
#[derive(Debug, Clone, Copy)]
pub struct DualStreamEncoder {
    format: CsvFormat,
    chunk_size: usize,
}

impl Default for DualStreamEncoder {
    fn default() -> Self {
        Self::new(CsvFormat::default())
    }
}

impl DualStreamEncoder {
    pub fn new(format: CsvFormat) -> Self {
        Self {
            format,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn format(&self) -> CsvFormat {
        self.format
    }

    /// Fan a source out into its parent and child streams.
    ///
    /// Each stream owns a separate pass over `source`, so neither shares
    /// buffers or progress with the other.
    pub fn encode<S: UnitSource>(&self, source: &S) -> EncodedStreams {
        EncodedStreams {
            parents: self.stream(source.units(), Projection::Parents),
            children: self.stream(source.units(), Projection::Children),
        }
    }

    pub fn stream<I>(&self, units: I, projection: Projection) -> RowStream
    where
        I: Iterator<Item = GenerationUnit> + Send + 'static,
    {
        stream::iter(ChunkEncoder::new(
            units,
            projection,
            self.format,
            self.chunk_size,
        ))
        .boxed()
    }
}

/// Read `stream` ahead of its consumer into a bounded buffer of `depth` chunks.
///
/// The producer runs on a spawned task, so this must be called inside a tokio
/// runtime. When the returned stream is dropped the producer stops at its next
/// send. A depth of zero returns the stream unchanged.
pub fn prefetch(stream: RowStream, depth: usize) -> RowStream {
    if depth == 0 {
        return stream;
    }

    let (tx, rx) = tokio::sync::mpsc::channel(depth);
    tokio::spawn(async move {
        let mut stream = stream;
        while let Some(item) = stream.next().await {
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                break;
            }
        }
    });

    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
}
