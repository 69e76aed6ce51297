use std::fmt;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, warn};

use super::layout;
use super::reader::FseqReader;
use crate::error::FseqError;

/// Primary 8-byte header shared by every FSEQ version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub magic: [u8; 4],
    /// Absolute offset of the first byte of channel data.
    pub channel_data_offset: u16,
    pub minor_version: u8,
    pub major_version: u8,
}

/// Compression applied to the channel data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    None,
    Zstd,
    Zlib,
    Unknown(u8),
}

impl CompressionType {
    pub fn from_raw(value: u8) -> Self {
        match value {
            layout::COMPRESSION_NONE => CompressionType::None,
            layout::COMPRESSION_ZSTD => CompressionType::Zstd,
            layout::COMPRESSION_ZLIB => CompressionType::Zlib,
            other => CompressionType::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            CompressionType::None => layout::COMPRESSION_NONE,
            CompressionType::Zstd => layout::COMPRESSION_ZSTD,
            CompressionType::Zlib => layout::COMPRESSION_ZLIB,
            CompressionType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionType::None => write!(f, "none"),
            CompressionType::Zstd => write!(f, "zstd"),
            CompressionType::Zlib => write!(f, "zlib"),
            CompressionType::Unknown(value) => write!(f, "unknown ({value})"),
        }
    }
}

/// The v2 extension of the fixed header (bytes 8..32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceHeader {
    /// Offset where the variable metadata section begins.
    pub header_len: u16,
    pub channels_per_frame: u32,
    pub frame_count: u32,
    pub time_step_ms: u8,
    pub flags: u8,
    pub compression: CompressionType,
    pub block_count: u8,
    pub sparse_range_count: u8,
    pub flags2: u8,
    /// Opaque writer identifier, usually a timestamp.
    pub identifier: u64,
}

impl SequenceHeader {
    /// Offset reached after the fixed header, block index and sparse table.
    pub fn index_end(&self) -> u64 {
        (layout::HEADER_SIZE
            + layout::index_section_size(self.block_count, self.sparse_range_count))
            as u64
    }

    /// Total playback length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.frame_count) * u64::from(self.time_step_ms)
    }

    /// Interpret the identifier as microseconds since the Unix epoch.
    ///
    /// Writers are free to store anything here, so this is only a hint; values
    /// outside the representable date range yield `None`.
    pub fn identifier_timestamp(&self) -> Option<String> {
        if self.identifier == 0 {
            return None;
        }
        let nanos = i128::from(self.identifier).checked_mul(1_000)?;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

/// Decode and validate the 32-byte fixed header.
///
/// Checks run in a fixed order: magic, minor version, major version, then
/// the channel count.
pub fn parse_header(bytes: &[u8]) -> Result<(FileHeader, SequenceHeader), FseqError> {
    let mut reader = FseqReader::new(bytes, 0, "header");

    let magic = reader.read_array::<4>()?;
    let channel_data_offset = reader.read_u16_le()?;
    let minor_version = reader.read_u8()?;
    let major_version = reader.read_u8()?;

    if &magic != layout::MAGIC {
        return Err(FseqError::InvalidMagic { found: magic });
    }
    if minor_version != layout::SUPPORTED_MINOR_VERSION
        || major_version != layout::SUPPORTED_MAJOR_VERSION
    {
        return Err(FseqError::UnsupportedVersion {
            major: major_version,
            minor: minor_version,
        });
    }

    let header_len = reader.read_u16_le()?;
    let channels_per_frame = reader.read_u32_le()?;
    let frame_count = reader.read_u32_le()?;
    let time_step_ms = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let compression = CompressionType::from_raw(reader.read_u8()?);
    let block_count = reader.read_u8()?;
    let sparse_range_count = reader.read_u8()?;
    let flags2 = reader.read_u8()?;
    let identifier = reader.read_u64_le()?;
    debug_assert_eq!(reader.position(), layout::HEADER_SIZE as u64);

    if channels_per_frame == 0 {
        return Err(FseqError::InvalidHeaderField {
            field: "channels_per_frame",
            value: 0,
        });
    }

    let file = FileHeader {
        magic,
        channel_data_offset,
        minor_version,
        major_version,
    };
    let sequence = SequenceHeader {
        header_len,
        channels_per_frame,
        frame_count,
        time_step_ms,
        flags,
        compression,
        block_count,
        sparse_range_count,
        flags2,
        identifier,
    };
    debug!(
        channels_per_frame,
        frame_count,
        time_step_ms,
        %compression,
        block_count,
        sparse_range_count,
        header_len,
        channel_data_offset,
        "decoded FSEQ header"
    );
    Ok((file, sequence))
}

/// Check the reserved flag bytes.
///
/// Non-zero flags are logged and ignored unless `strict` is set.
pub fn check_reserved_flags(header: &SequenceHeader, strict: bool) -> Result<(), FseqError> {
    for (field, value) in [("flags", header.flags), ("flags2", header.flags2)] {
        if value == 0 {
            continue;
        }
        if strict {
            return Err(FseqError::InvalidHeaderField {
                field,
                value: u64::from(value),
            });
        }
        warn!(field, value, "reserved header flags are non-zero; ignoring");
    }
    Ok(())
}
