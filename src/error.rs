use std::path::PathBuf;

use crate::layout::FILE_HEADER_SIZE;

/// Errors raised while decoding a `JpnIHDS.dat` stream.
///
/// ```text
///   DecodeError
///   ├── InputNotFound        ← input path does not exist
///   ├── TruncatedHeader      ← stream shorter than the 32-byte file header
///   ├── TruncatedRecord      ← stream ends inside a record header, body or text
///   ├── TextDecode           ← invalid UTF-16 (strict policy only)
///   ├── InvalidRecord        ← impossible field values (conv_num <= 0, record_size == 0)
///   ├── TimestampOutOfRange  ← FILETIME outside the representable calendar
///   ├── Format               ← timestamp formatting failure
///   └── Io                   ← any other read/seek failure
/// ```
///
/// Every variant is fatal: the decoder stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{} does not exist.", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("truncated file header: need {} bytes", FILE_HEADER_SIZE)]
    TruncatedHeader,

    /// `offset` is the start of the record the failing read belongs to.
    #[error("truncated record at offset {offset:#x}: stream ended while reading {structure}")]
    TruncatedRecord { offset: u64, structure: &'static str },

    /// `offset` is the start of the text span.
    #[error("invalid UTF-16 text at offset {offset:#x}")]
    TextDecode {
        offset: u64,
        #[source]
        source: widestring::error::Utf16Error,
    },

    #[error("invalid record at offset {offset:#x}: {reason}")]
    InvalidRecord { offset: u64, reason: String },

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    #[error("timestamp formatting failed: {0}")]
    Format(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
