//! Decoder for the Microsoft IME Japanese history database (`JpnIHDS.dat`).
//!
//! This crate provides the core types and logic used by the `jpnihds`
//! report binary and the `jpnihds_summary` tool:
//!
//! - `layout`: on-disk structures (file header, record header, record body)
//!   and their debug dumps
//! - `decoder`: the lazy record walk and the per-record text join rules
//! - `timestamp`: FILETIME to UTC/JST conversion and report formatting
//! - `report`: tab-separated output in UTF-8 or UTF-16LE
//! - `error`: the decode error taxonomy
pub mod decoder;
pub mod error;
pub mod layout;
pub mod report;
pub mod timestamp;

pub use decoder::{decode_records, read_file_header, Conversion, Record, Records, Structure, TextPolicy};
pub use error::DecodeError;
pub use layout::{FileHeader, RecordBody, RecordHeader};
