//! fseq-core: decoder for FSEQ v2 show-control sequence files.
//!
//! An FSEQ file holds a fixed 32-byte header, an index of compressed blocks,
//! an optional sparse channel-range table, tagged metadata records and the
//! per-frame channel payload. This crate decodes the header sections once
//! (`format` decoders fed from a `ByteSource`) and then serves random-access
//! frame queries through the frame engine, either by direct offset arithmetic
//! or by decompressing the owning zstd block.
//!
//! Invariants:
//! - Opening is all-or-nothing: a session exists only with a fully validated
//!   header, block index, sparse table and metadata.
//! - A frame is always exactly `channels_per_frame` bytes; failures are
//!   reported, never padded.
//! - At most one decompressed block is held in memory per session.
//!
//! Writing files, FSEQ v1 and zlib-compressed payloads are not supported.
//!
//! # Examples
//! ```no_run
//! use fseq_core::FseqFile;
//!
//! let mut file = FseqFile::open_path("show.fseq")?;
//! println!("{} frames of {} channels", file.frame_count(), file.channels_per_frame());
//! for frame in file.frames() {
//!     let frame = frame?;
//!     println!("frame {}: {} bytes", frame.index, frame.data.len());
//! }
//! # Ok::<(), fseq_core::FseqError>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod channels;
mod engine;
mod error;
pub mod format;
mod session;
mod source;

pub use engine::CacheStats;
pub use error::{FseqError, Result};
pub use format::metadata::known_tag_description;
pub use format::{
    BlockDescriptor, CompressionType, FileHeader, Metadata, MetadataEntry, SequenceHeader,
    SparseRange,
};
pub use session::{DEFAULT_MAX_BLOCK_SIZE, Frame, Frames, FseqFile, OpenOptions};
pub use source::{ByteSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Serialisable summary of an opened sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    pub input: InputInfo,
    /// Format version as `major.minor`.
    pub version: String,
    pub channel_data_offset: u16,
    pub header_len: u16,
    pub channels_per_frame: u32,
    pub frame_count: u32,
    pub time_step_ms: u8,
    pub duration_ms: u64,
    pub compression: CompressionType,
    /// Raw compression byte as stored in the header.
    pub compression_code: u8,
    pub flags: u8,
    pub flags2: u8,
    pub identifier: u64,
    /// RFC3339 reading of the identifier, when it looks like a timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_time: Option<String>,
    /// Declared block count, including zero-length placeholders.
    pub declared_blocks: u8,
    pub blocks: Vec<BlockDescriptor>,
    pub sparse_ranges: Vec<SparseRange>,
    pub metadata: Vec<MetadataSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use fseq_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "fseq".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "fseq");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Input file metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided by the caller.
    pub path: String,
    pub bytes: u64,
}

/// Text view of one metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSummary {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: String,
}

impl From<&MetadataEntry> for MetadataSummary {
    fn from(entry: &MetadataEntry) -> Self {
        Self {
            tag: entry.tag_str(),
            description: known_tag_description(&entry.tag).map(str::to_string),
            value: entry.value_str(),
        }
    }
}

impl<S: ByteSource> FseqFile<S> {
    /// Summarise the decoded header sections.
    ///
    /// Frame data is not touched, so this works for every compression type.
    pub fn report(&self, input_path: &str, input_bytes: u64) -> SequenceReport {
        let (file, seq) = self.header();
        SequenceReport {
            report_version: REPORT_VERSION,
            tool: ToolInfo {
                name: "fseq".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            input: InputInfo {
                path: input_path.to_string(),
                bytes: input_bytes,
            },
            version: format!("{}.{}", file.major_version, file.minor_version),
            channel_data_offset: file.channel_data_offset,
            header_len: seq.header_len,
            channels_per_frame: seq.channels_per_frame,
            frame_count: seq.frame_count,
            time_step_ms: seq.time_step_ms,
            duration_ms: seq.duration_ms(),
            compression: seq.compression,
            compression_code: seq.compression.raw(),
            flags: seq.flags,
            flags2: seq.flags2,
            identifier: seq.identifier,
            identifier_time: seq.identifier_timestamp(),
            declared_blocks: seq.block_count,
            blocks: self.blocks().to_vec(),
            sparse_ranges: self.channel_map().to_vec(),
            metadata: self.metadata().iter().map(MetadataSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::header::tests::header_bytes;
    use crate::format::layout;
    use std::io::Cursor;

    fn file_with_metadata() -> Vec<u8> {
        let mut bytes = header_bytes(2, 1, 0);
        let record = [0x0b, 0x00, b'm', b'f', b's', b'o', b'n', b'g', b'.', b'o', b'g'];
        let data_offset = (layout::HEADER_SIZE + record.len()) as u16;
        bytes[layout::CHANNEL_DATA_OFFSET_RANGE].copy_from_slice(&data_offset.to_le_bytes());
        bytes.extend_from_slice(&record);
        bytes.extend_from_slice(&[1, 2]);
        bytes
    }

    #[test]
    fn report_lists_metadata_and_omits_missing_identifier_time() {
        let file = FseqFile::open(Cursor::new(file_with_metadata())).unwrap();
        let report = file.report("show.fseq", 45);
        assert_eq!(report.version, "2.0");
        assert_eq!(report.metadata.len(), 1);
        assert_eq!(report.metadata[0].tag, "mf");
        assert_eq!(report.metadata[0].value, "song.og");
        assert_eq!(report.metadata[0].description.as_deref(), Some("media file"));

        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("identifier_time").is_none());
        assert_eq!(value["compression"], "none");
        assert_eq!(value["compression_code"], 0);
        assert_eq!(value["input"]["bytes"], 45);
    }
}
