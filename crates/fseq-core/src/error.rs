use thiserror::Error;

use crate::format::CompressionType;
use crate::source::SourceError;

/// Errors returned while opening an FSEQ file or fetching frames from it.
///
/// Every variant is fatal to the operation that raised it; nothing is
/// retried and no placeholder data is substituted.
///
/// # Examples
/// ```
/// use fseq_core::FseqError;
///
/// let err = FseqError::FrameIndexOutOfRange { index: 10, frame_count: 10 };
/// assert!(err.to_string().contains("frame index 10 out of range"));
/// ```
#[derive(Debug, Error)]
pub enum FseqError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid magic: expected \"PSEQ\", got {found:02x?}")]
    InvalidMagic { found: [u8; 4] },
    #[error("unsupported FSEQ version {major}.{minor}: only 2.0 is supported")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("truncated file while reading {context}: need {needed} bytes at offset {offset}")]
    TruncatedFile {
        context: &'static str,
        offset: u64,
        needed: usize,
    },
    #[error("invalid header field {field}: {value}")]
    InvalidHeaderField { field: &'static str, value: u64 },
    #[error("header length mismatch: expected offset {expected}, got {actual}")]
    HeaderLengthMismatch { expected: u64, actual: u64 },
    #[error("frame index {index} out of range (frame count {frame_count})")]
    FrameIndexOutOfRange { index: u32, frame_count: u32 },
    #[error("no channel data for frame {index}")]
    MissingFrameData { index: u32 },
    #[error(
        "corrupt block {block}: {decompressed_len} bytes is not a whole number of {channels_per_frame}-channel frames"
    )]
    CorruptBlock {
        block: usize,
        decompressed_len: usize,
        channels_per_frame: u32,
    },
    #[error("decompression failed for block {block}: {message}")]
    DecompressionFailed { block: usize, message: String },
    #[error("unsupported compression: {compression}")]
    UnsupportedCompression { compression: CompressionType },
}

impl FseqError {
    pub(crate) fn from_source(err: SourceError, context: &'static str) -> Self {
        match err {
            SourceError::Io(err) => FseqError::Io(err),
            SourceError::Truncated { offset, needed } => FseqError::TruncatedFile {
                context,
                offset,
                needed,
            },
        }
    }
}

/// Convenience alias for results carrying [`FseqError`].
pub type Result<T> = std::result::Result<T, FseqError>;
