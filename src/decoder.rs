//! Record decoder for `JpnIHDS.dat`.
//!
//! [`read_file_header`] reads the fixed header at offset 0, then
//! [`decode_records`] walks the record chain lazily: each record starts at
//! the previous one plus its `record_size`, beginning at the header's
//! `header_size`. The walk stops once the cursor reaches the declared
//! `file_size`; there is no end marker.
//!
//! Per record, the bodies' texts are folded into the report fields as
//! follows:
//! - `input`: every body's input, joined with a single space
//! - `converted`: only bodies with `conv_length > 0`, joined with a space
//! - `merged`: converted text if present else input, concatenated without separator
//! - `unknown4`: decimal values joined with a space
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};
use time::OffsetDateTime;
use tracing::{debug, warn};
use widestring::U16Str;

use crate::error::DecodeError;
use crate::layout::{FileHeader, RecordBody, RecordHeader};
use crate::timestamp::filetime_to_utc;

/// How invalid UTF-16 inside a text span is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextPolicy {
    /// Fail with [`DecodeError::TextDecode`].
    #[default]
    Strict,
    /// Substitute U+FFFD for invalid code units.
    Lenient,
}

/// One body of a record with its decoded texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub body: RecordBody,
    pub input: String,
    /// `None` when `conv_length == 0`.
    pub converted: Option<String>,
}

impl Conversion {
    /// Converted text if present, otherwise the input text.
    pub fn merged(&self) -> &str {
        self.converted.as_deref().unwrap_or(&self.input)
    }
}

/// A raw structure handed to an inspector as soon as it is read.
#[derive(Debug, Clone, Copy)]
pub enum Structure<'a> {
    RecordHeader(&'a RecordHeader),
    RecordBody(&'a RecordBody),
}

/// A decoded record, one report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Byte offset of the record header.
    pub offset: u64,
    /// Zero-based sequence number.
    pub index: u64,
    pub conv_time: OffsetDateTime,
    pub input: String,
    pub converted: String,
    pub merged: String,
    pub unknown2: i8,
    pub unknown3: u16,
    pub unknown4: String,
    pub header: RecordHeader,
    pub conversions: Vec<Conversion>,
}

impl Record {
    fn assemble(offset: u64, index: u64, conv_time: OffsetDateTime, header: RecordHeader, conversions: Vec<Conversion>) -> Self {
        let input = conversions.iter().map(|c| c.input.as_str()).collect::<Vec<_>>().join(" ");
        let converted = conversions.iter().filter_map(|c| c.converted.as_deref()).collect::<Vec<_>>().join(" ");
        let merged = conversions.iter().map(Conversion::merged).collect::<String>();
        let unknown4 = conversions.iter().map(|c| c.body.unknown4.to_string()).collect::<Vec<_>>().join(" ");
        Self {
            offset,
            index,
            conv_time,
            input,
            converted,
            merged,
            unknown2: header.unknown2,
            unknown3: header.unknown3,
            unknown4,
            header,
            conversions,
        }
    }

    pub fn is_learn(&self) -> bool {
        self.header.is_learn()
    }
}

/// Read the 32-byte file header at offset 0.
pub fn read_file_header<R: Read + Seek>(source: &mut R) -> Result<FileHeader, DecodeError> {
    source.seek(SeekFrom::Start(0))?;
    FileHeader::read_from(source).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::TruncatedHeader,
        _ => DecodeError::Io(e),
    })
}

/// Start the lazy record walk described by `header`.
///
/// Logs a warning when the real stream length disagrees with the declared
/// `file_size`; the walk still follows `file_size`.
pub fn decode_records<R: Read + Seek>(mut source: R, header: &FileHeader, policy: TextPolicy) -> Result<Records<R>, DecodeError> {
    let actual = source.seek(SeekFrom::End(0))?;
    let declared = u64::from(header.file_size);
    if actual != declared {
        warn!(declared, actual, "file_size field does not match stream length");
    }
    Ok(Records {
        source,
        file_size: declared,
        cursor: u64::from(header.header_size),
        index: 0,
        policy,
        done: false,
        inspector: None,
    })
}

/// Iterator over the records of one file. Fused after the first error.
pub struct Records<R> {
    source: R,
    file_size: u64,
    cursor: u64,
    index: u64,
    policy: TextPolicy,
    done: bool,
    inspector: Option<Box<dyn FnMut(Structure<'_>)>>,
}

impl<R> Records<R> {
    /// Call `f` with every record header and body prefix as it is read,
    /// including those of a record that then fails to decode.
    pub fn with_inspector(mut self, f: impl FnMut(Structure<'_>) + 'static) -> Self {
        self.inspector = Some(Box::new(f));
        self
    }

    fn inspect(&mut self, s: Structure<'_>) {
        if let Some(f) = self.inspector.as_mut() {
            f(s);
        }
    }

    /// Offset the next record will be read from.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
}

fn truncated(offset: u64, structure: &'static str) -> impl FnOnce(io::Error) -> DecodeError {
    move |e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::TruncatedRecord { offset, structure },
        _ => DecodeError::Io(e),
    }
}

impl<R: Read + Seek> Records<R> {
    fn read_text(&mut self, units: u8, record_offset: u64, structure: &'static str) -> Result<String, DecodeError> {
        let text_offset = self.source.stream_position()?;
        let mut buf = vec![0u16; usize::from(units)];
        self.source
            .read_u16_into::<LittleEndian>(&mut buf)
            .map_err(truncated(record_offset, structure))?;
        let text = U16Str::from_slice(&buf);
        match self.policy {
            TextPolicy::Strict => text
                .to_string()
                .map_err(|source| DecodeError::TextDecode { offset: text_offset, source }),
            TextPolicy::Lenient => Ok(text.to_string_lossy()),
        }
    }

    fn decode_next(&mut self) -> Result<Record, DecodeError> {
        let offset = self.cursor;
        self.source.seek(SeekFrom::Start(offset))?;
        let header = RecordHeader::read_from(&mut self.source).map_err(truncated(offset, "record header"))?;
        self.inspect(Structure::RecordHeader(&header));
        if header.conv_num <= 0 {
            return Err(DecodeError::InvalidRecord { offset, reason: format!("conv_num is {}", header.conv_num) });
        }
        if header.record_size == 0 {
            return Err(DecodeError::InvalidRecord { offset, reason: "record_size is 0".into() });
        }
        debug!(offset, index = self.index, conv_num = header.conv_num, "record header");

        // Only the first body is seeked to; the rest follow the previous body's text.
        self.source.seek(SeekFrom::Start(offset + u64::from(header.header_size)))?;
        let mut conversions = Vec::with_capacity(header.conv_num as usize);
        for _ in 0..header.conv_num {
            let body = RecordBody::read_from(&mut self.source).map_err(truncated(offset, "record body"))?;
            self.inspect(Structure::RecordBody(&body));
            let input = self.read_text(body.input_length, offset, "input text")?;
            let converted = if body.conv_length > 0 {
                Some(self.read_text(body.conv_length, offset, "converted text")?)
            } else {
                None
            };
            conversions.push(Conversion { body, input, converted });
        }

        let conv_time = filetime_to_utc(header.conv_time)?;
        Ok(Record::assemble(offset, self.index, conv_time, header, conversions))
    }
}

impl<R: Read + Seek> Iterator for Records<R> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.file_size {
            return None;
        }
        match self.decode_next() {
            Ok(record) => {
                self.cursor += u64::from(record.header.record_size);
                self.index += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
