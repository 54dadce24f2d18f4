//! Tab-separated report writer.
//!
//! Every field is wrapped in double quotes (embedded quotes are doubled),
//! fields are separated by a tab and rows end with `\n`. The column header
//! row is [`COLUMNS`].
use anyhow::{Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use widestring::U16String;

use crate::decoder::Record;
use crate::timestamp::{format_timestamp, utc_to_jst};

pub const COLUMNS: [&str; 10] = [
    "offset",
    "no.",
    "timestamp(utc)",
    "timestamp(jst)",
    "input",
    "converted",
    "merged",
    "unknown2",
    "unknown3",
    "unknown4",
];

/// Text encoding of the report stream, the same for files and stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputEncoding {
    #[default]
    Utf8,
    /// Little-endian with a leading byte-order mark.
    Utf16,
}

const UTF16LE_BOM: u16 = 0xFEFF;

pub struct ReportWriter<W: Write> {
    out: W,
    encoding: OutputEncoding,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(mut out: W, encoding: OutputEncoding) -> Result<Self> {
        if encoding == OutputEncoding::Utf16 {
            out.write_u16::<LittleEndian>(UTF16LE_BOM).context("write byte-order mark")?;
        }
        Ok(Self { out, encoding })
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.write_row(&COLUMNS)
    }

    pub fn write_record(&mut self, r: &Record) -> Result<()> {
        let offset = r.offset.to_string();
        let no = r.index.to_string();
        let utc = format_timestamp(r.conv_time)?;
        let jst = format_timestamp(utc_to_jst(r.conv_time)?)?;
        let unknown2 = r.unknown2.to_string();
        let unknown3 = r.unknown3.to_string();
        self.write_row(&[
            offset.as_str(),
            &no,
            &utc,
            &jst,
            &r.input,
            &r.converted,
            &r.merged,
            &unknown2,
            &unknown3,
            &r.unknown4,
        ])
        .with_context(|| format!("write record {} at offset {:#x}", r.index, r.offset))
    }

    pub fn write_row(&mut self, fields: &[&str]) -> Result<()> {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        }
        line.push('\n');
        match self.encoding {
            OutputEncoding::Utf8 => self.out.write_all(line.as_bytes())?,
            OutputEncoding::Utf16 => {
                for unit in U16String::from_str(&line).as_slice() {
                    self.out.write_u16::<LittleEndian>(*unit)?;
                }
            }
        }
        Ok(())
    }

    /// Push buffered rows through to the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("flush report")
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("flush report")?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_quotes_every_column() {
        let mut w = ReportWriter::new(Vec::new(), OutputEncoding::Utf8).unwrap();
        w.write_header().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "\"offset\"\t\"no.\"\t\"timestamp(utc)\"\t\"timestamp(jst)\"\t\"input\"\t\"converted\"\t\"merged\"\t\"unknown2\"\t\"unknown3\"\t\"unknown4\"\n"
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut w = ReportWriter::new(Vec::new(), OutputEncoding::Utf8).unwrap();
        w.write_row(&["say \"hi\"", "tab\there"]).unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(out, "\"say \"\"hi\"\"\"\t\"tab\there\"\n");
    }

    #[test]
    fn utf16_output_has_bom_and_le_units() {
        let mut w = ReportWriter::new(Vec::new(), OutputEncoding::Utf16).unwrap();
        w.write_row(&["字"]).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(out, vec![0xFF, 0xFE, b'"', 0, 0x57, 0x5B, b'"', 0, b'\n', 0]);
    }
}
