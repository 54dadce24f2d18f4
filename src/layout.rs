//! On-disk structures of `JpnIHDS.dat`.
//!
//! Every structure is decoded field by field with explicit little-endian
//! reads; nothing depends on in-memory struct layout. The `Display` impls
//! render the diagnostic dumps printed by `jpnihds --debug`.
//!
//! ```text
//! [FileHeader: 32 bytes]
//! ... (up to FileHeader.header_size)
//! [RecordHeader: 16 bytes] ... [RecordBody: 8 bytes][input u16 * n][conv u16 * m] ...
//! [RecordHeader: 16 bytes] ...
//! ```
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::{self, Read};

use crate::timestamp::{filetime_to_utc, format_timestamp};

/// Size of [`FileHeader`] on disk.
pub const FILE_HEADER_SIZE: usize = 32;
/// Size of [`RecordHeader`] on disk.
pub const RECORD_HEADER_SIZE: usize = 16;
/// Size of the fixed [`RecordBody`] prefix on disk.
pub const RECORD_BODY_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// FILETIME of the last modification.
    pub modified_time: u64,
    /// Declared total file size; the record scan stops here.
    pub file_size: u32,
    pub unknown1: u32, // 1 or 2
    pub history_num: u32,
    /// Offset of the first record.
    pub header_size: u32,
    pub learn_num: u32,
    pub history_size: u32,
}

impl FileHeader {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            modified_time: r.read_u64::<LittleEndian>()?,
            file_size: r.read_u32::<LittleEndian>()?,
            unknown1: r.read_u32::<LittleEndian>()?,
            history_num: r.read_u32::<LittleEndian>()?,
            header_size: r.read_u32::<LittleEndian>()?,
            learn_num: r.read_u32::<LittleEndian>()?,
            history_size: r.read_u32::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// FILETIME of the conversion.
    pub conv_time: u64,
    /// Total length of the record; the cursor advances by this much.
    pub record_size: u16,
    /// Offset from the record start to the first body.
    pub header_size: u16,
    pub unknown2: i8, // always 1 so far
    /// Number of bodies that follow.
    pub conv_num: i8,
    pub unknown3: u16, // history == 0, learn > 0
}

impl RecordHeader {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            conv_time: r.read_u64::<LittleEndian>()?,
            record_size: r.read_u16::<LittleEndian>()?,
            header_size: r.read_u16::<LittleEndian>()?,
            unknown2: r.read_i8()?,
            conv_num: r.read_i8()?,
            unknown3: r.read_u16::<LittleEndian>()?,
        })
    }

    /// Learn records carry a non-zero `unknown3`.
    pub fn is_learn(&self) -> bool {
        self.unknown3 > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordBody {
    pub body_size: u16,
    /// Input text length in UTF-16 code units.
    pub input_length: u8,
    /// Converted text length in UTF-16 code units; 0 means no conversion.
    pub conv_length: u8,
    pub unknown4: u32,
}

impl RecordBody {
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            body_size: r.read_u16::<LittleEndian>()?,
            input_length: r.read_u8()?,
            conv_length: r.read_u8()?,
            unknown4: r.read_u32::<LittleEndian>()?,
        })
    }
}

fn fmt_filetime(ticks: u64) -> String {
    filetime_to_utc(ticks)
        .ok()
        .and_then(|dt| format_timestamp(dt).ok())
        .unwrap_or_else(|| format!("<invalid filetime {ticks:#x}>"))
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--File Header Information--")?;
        writeln!(f, "Timestamp(UTC):  {}", fmt_filetime(self.modified_time))?;
        writeln!(f, "FileSize:  {}", self.file_size)?;
        writeln!(f, "Unknown1:  {}", self.unknown1)?;
        writeln!(f, "HistoryRecords:  {}", self.history_num)?;
        writeln!(f, "HeaderSize:  {}", self.header_size)?;
        writeln!(f, "LearnRecords:  {}", self.learn_num)?;
        writeln!(f, "HistorySize:  {}", self.history_size)
    }
}

impl fmt::Display for RecordHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--Record Header Information--")?;
        writeln!(f, "RecordSize:  {}", self.record_size)?;
        writeln!(f, "HeaderSize:  {}", self.header_size)?;
        writeln!(f, "Unknown2:  {}", self.unknown2)?;
        writeln!(f, "ConvNum:  {}", self.conv_num)?;
        writeln!(f, "Unknown3:  {}", self.unknown3)
    }
}

impl fmt::Display for RecordBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--Record Body Information--")?;
        writeln!(f, "BodySize:  {}", self.body_size)?;
        writeln!(f, "InputLength:  {}", self.input_length)?;
        writeln!(f, "ConvLength:  {}", self.conv_length)?;
        writeln!(f, "Unknown4:  {}", self.unknown4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn file_header_fields_are_little_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        for v in [0x200u32, 2, 7, 0x40, 3, 0x150] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(bytes.len(), FILE_HEADER_SIZE);
        let h = FileHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(h.modified_time, 0x0102_0304_0506_0708);
        assert_eq!(h.file_size, 0x200);
        assert_eq!(h.unknown1, 2);
        assert_eq!(h.history_num, 7);
        assert_eq!(h.header_size, 0x40);
        assert_eq!(h.learn_num, 3);
        assert_eq!(h.history_size, 0x150);
    }

    #[test]
    fn record_header_signed_bytes_and_learn_flag() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&42u64.to_le_bytes());
        bytes.extend_from_slice(&0x30u16.to_le_bytes());
        bytes.extend_from_slice(&0x10u16.to_le_bytes());
        bytes.push(0xFF); // unknown2 = -1
        bytes.push(2);
        bytes.extend_from_slice(&5u16.to_le_bytes());
        assert_eq!(bytes.len(), RECORD_HEADER_SIZE);
        let h = RecordHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(h.conv_time, 42);
        assert_eq!(h.record_size, 0x30);
        assert_eq!(h.header_size, 0x10);
        assert_eq!(h.unknown2, -1);
        assert_eq!(h.conv_num, 2);
        assert!(h.is_learn());
    }

    #[test]
    fn short_body_is_unexpected_eof() {
        let err = RecordBody::read_from(&mut Cursor::new(vec![0u8; RECORD_BODY_SIZE - 1])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn file_header_dump_labels_history_count() {
        let h = FileHeader {
            modified_time: 0,
            file_size: 32,
            unknown1: 1,
            history_num: 9,
            header_size: 32,
            learn_num: 0,
            history_size: 0,
        };
        let dump = h.to_string();
        assert!(dump.starts_with("--File Header Information--\n"));
        assert!(dump.contains("Timestamp(UTC):  1601-01-01 00:00:00.000000\n"));
        assert!(dump.contains("HistoryRecords:  9\n"));
    }
}
