use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::channels::ChannelValues;
use crate::engine::{CacheStats, FrameEngine};
use crate::error::{FseqError, Result};
use crate::format::blocks::parse_block_index;
use crate::format::header::{check_reserved_flags, parse_header};
use crate::format::layout;
use crate::format::metadata::parse_metadata;
use crate::format::reader::FseqReader;
use crate::format::sparse::parse_sparse_ranges;
use crate::format::{
    BlockDescriptor, CompressionType, FileHeader, Metadata, SequenceHeader, SparseRange,
};
use crate::source::ByteSource;

/// Default cap on a single block's decompressed size (64 MiB).
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Decoder settings applied when opening a file.
///
/// # Examples
/// ```
/// use fseq_core::OpenOptions;
///
/// let options = OpenOptions::default().strict_flags(true);
/// assert!(options.is_strict_flags());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    strict_flags: bool,
    max_block_size: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            strict_flags: false,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }
}

impl OpenOptions {
    /// Fail on non-zero reserved flag bytes instead of ignoring them.
    pub fn strict_flags(mut self, strict: bool) -> Self {
        self.strict_flags = strict;
        self
    }

    /// Upper bound on a frame or decompressed block, in bytes.
    pub fn max_block_size(mut self, bytes: usize) -> Self {
        self.max_block_size = bytes;
        self
    }

    pub fn is_strict_flags(&self) -> bool {
        self.strict_flags
    }

    pub fn max_block_bytes(&self) -> usize {
        self.max_block_size
    }
}

/// One frame of channel values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub index: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// `(absolute_channel, value)` pairs through the sparse channel map.
    pub fn channel_values<'a>(&'a self, ranges: &'a [SparseRange]) -> ChannelValues<'a> {
        ChannelValues::new(&self.data, ranges)
    }
}

/// An open FSEQ v2 decode session.
///
/// Header, block index, sparse ranges and metadata are decoded once by
/// [`FseqFile::open`] and are read-only afterwards; frame queries only touch
/// the single-block decompression cache. A session is not meant to be shared
/// between threads without external locking.
///
/// # Examples
/// ```no_run
/// use fseq_core::FseqFile;
///
/// let mut file = FseqFile::open_path("show.fseq")?;
/// let frame = file.get_frame(0)?;
/// assert_eq!(frame.data.len(), file.channels_per_frame() as usize);
/// # Ok::<(), fseq_core::FseqError>(())
/// ```
pub struct FseqFile<S> {
    source: S,
    file_header: FileHeader,
    sequence_header: SequenceHeader,
    sparse_ranges: Vec<SparseRange>,
    metadata: Metadata,
    engine: FrameEngine,
}

impl FseqFile<BufReader<File>> {
    /// Open an FSEQ file on disk.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening FSEQ file");
        let file = File::open(path)?;
        Self::open(BufReader::new(file))
    }
}

impl<S: ByteSource> FseqFile<S> {
    /// Decode the header and index sections of `source`.
    ///
    /// # Errors
    /// Any structural problem aborts the open; no partially decoded session
    /// is ever returned.
    pub fn open(source: S) -> Result<Self> {
        Self::open_with(source, OpenOptions::default())
    }

    pub fn open_with(mut source: S, options: OpenOptions) -> Result<Self> {
        let header_bytes = source
            .read_vec_at(0, layout::HEADER_SIZE)
            .map_err(|err| FseqError::from_source(err, "header"))?;
        let (file_header, sequence_header) = parse_header(&header_bytes)?;
        check_reserved_flags(&sequence_header, options.strict_flags)?;

        if sequence_header.channels_per_frame as usize > options.max_block_size {
            return Err(FseqError::InvalidHeaderField {
                field: "channels_per_frame",
                value: u64::from(sequence_header.channels_per_frame),
            });
        }
        if file_header.channel_data_offset < sequence_header.header_len {
            return Err(FseqError::InvalidHeaderField {
                field: "channel_data_offset",
                value: u64::from(file_header.channel_data_offset),
            });
        }
        if let CompressionType::Unknown(value) = sequence_header.compression {
            warn!(value, "unknown compression type; frames will not be decodable");
        }

        let index_start = layout::HEADER_SIZE as u64;
        let index_len = layout::index_section_size(
            sequence_header.block_count,
            sequence_header.sparse_range_count,
        );
        let index_bytes = source
            .read_vec_at(index_start, index_len)
            .map_err(|err| FseqError::from_source(err, "block index"))?;
        let mut reader = FseqReader::new(&index_bytes, index_start, "block index");
        let blocks = parse_block_index(
            &mut reader,
            sequence_header.block_count,
            file_header.channel_data_offset,
        )?;
        let sparse_ranges = parse_sparse_ranges(&mut reader, sequence_header.sparse_range_count)?;

        let position = reader.position();
        if position != u64::from(sequence_header.header_len) {
            return Err(FseqError::HeaderLengthMismatch {
                expected: u64::from(sequence_header.header_len),
                actual: position,
            });
        }

        let metadata_start = u64::from(sequence_header.header_len);
        let metadata_len =
            usize::from(file_header.channel_data_offset - sequence_header.header_len);
        let metadata_bytes = source
            .read_vec_at(metadata_start, metadata_len)
            .map_err(|err| FseqError::from_source(err, "metadata"))?;
        let mut reader = FseqReader::new(&metadata_bytes, metadata_start, "metadata");
        let metadata = parse_metadata(&mut reader)?;

        debug!(
            blocks = blocks.len(),
            sparse_ranges = sparse_ranges.len(),
            metadata = metadata.len(),
            "FSEQ index ready"
        );

        let engine = FrameEngine::new(
            &file_header,
            &sequence_header,
            blocks,
            options.max_block_size,
        );
        Ok(Self {
            source,
            file_header,
            sequence_header,
            sparse_ranges,
            metadata,
            engine,
        })
    }

    pub fn header(&self) -> (&FileHeader, &SequenceHeader) {
        (&self.file_header, &self.sequence_header)
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn sequence_header(&self) -> &SequenceHeader {
        &self.sequence_header
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Declared sparse ranges; empty when the file carries absolute channels.
    pub fn channel_map(&self) -> &[SparseRange] {
        &self.sparse_ranges
    }

    /// Resolved block index, zero-length placeholders removed.
    pub fn blocks(&self) -> &[BlockDescriptor] {
        self.engine.blocks()
    }

    pub fn frame_count(&self) -> u32 {
        self.sequence_header.frame_count
    }

    pub fn channels_per_frame(&self) -> u32 {
        self.sequence_header.channels_per_frame
    }

    pub fn compression(&self) -> CompressionType {
        self.sequence_header.compression
    }

    pub fn frame_duration_ms(&self) -> u8 {
        self.sequence_header.time_step_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.sequence_header.duration_ms()
    }

    /// Fetch frame `index` (0-based).
    ///
    /// # Errors
    /// `FrameIndexOutOfRange` past the last frame; `UnsupportedCompression`
    /// for zlib or unknown compression; block-level failures
    /// (`DecompressionFailed`, `CorruptBlock`) are never replaced with
    /// placeholder data.
    pub fn get_frame(&mut self, index: u32) -> Result<Frame> {
        let data = self.engine.frame_data(&mut self.source, index)?;
        Ok(Frame { index, data })
    }

    /// Iterate every frame in order, decompressing each block once.
    pub fn frames(&mut self) -> Frames<'_, S> {
        Frames {
            file: self,
            next: 0,
        }
    }

    /// Decode the whole payload. Holds every frame in memory at once.
    pub fn read_all_frames(&mut self) -> Result<Vec<Frame>> {
        self.frames().collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Iterator returned by [`FseqFile::frames`].
pub struct Frames<'a, S> {
    file: &'a mut FseqFile<S>,
    next: u32,
}

impl<S: ByteSource> Iterator for Frames<'_, S> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.file.frame_count() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.file.get_frame(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.file.frame_count().saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}
