//! Frame access engine.
//!
//! Translates a frame index into channel bytes. Uncompressed files are
//! addressed directly (`channel_data_offset + index * channels_per_frame`);
//! compressed files locate the owning block, decompress it in full and slice
//! the frame out of it. Only the most recently decompressed block is kept, so
//! peak memory is one block plus the resolved index.

mod cache;
mod codec;

pub use cache::CacheStats;

use tracing::trace;

use crate::error::FseqError;
use crate::format::blocks::is_ascending;
use crate::format::{BlockDescriptor, CompressionType, FileHeader, SequenceHeader};
use crate::source::ByteSource;
use cache::BlockCache;

pub(crate) struct FrameEngine {
    channel_data_offset: u64,
    channels_per_frame: u32,
    frame_count: u32,
    compression: CompressionType,
    blocks: Vec<BlockDescriptor>,
    ascending: bool,
    max_block_size: usize,
    cache: BlockCache,
}

impl FrameEngine {
    pub(crate) fn new(
        file: &FileHeader,
        sequence: &SequenceHeader,
        blocks: Vec<BlockDescriptor>,
        max_block_size: usize,
    ) -> Self {
        Self {
            channel_data_offset: u64::from(file.channel_data_offset),
            channels_per_frame: sequence.channels_per_frame,
            frame_count: sequence.frame_count,
            compression: sequence.compression,
            ascending: is_ascending(&blocks),
            blocks,
            max_block_size,
            cache: BlockCache::new(),
        }
    }

    pub(crate) fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    pub(crate) fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Channel bytes of frame `index`, exactly `channels_per_frame` long.
    pub(crate) fn frame_data<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        index: u32,
    ) -> Result<Vec<u8>, FseqError> {
        if index >= self.frame_count {
            return Err(FseqError::FrameIndexOutOfRange {
                index,
                frame_count: self.frame_count,
            });
        }
        match self.compression {
            CompressionType::None => self.read_uncompressed(source, index),
            CompressionType::Zstd => self.read_compressed(source, index),
            other => Err(FseqError::UnsupportedCompression { compression: other }),
        }
    }

    fn frame_len(&self) -> usize {
        self.channels_per_frame as usize
    }

    fn read_uncompressed<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        index: u32,
    ) -> Result<Vec<u8>, FseqError> {
        let offset = u64::from(index)
            .checked_mul(u64::from(self.channels_per_frame))
            .and_then(|rel| rel.checked_add(self.channel_data_offset))
            .ok_or(FseqError::InvalidHeaderField {
                field: "channels_per_frame",
                value: u64::from(self.channels_per_frame),
            })?;
        trace!(frame = index, offset, "reading uncompressed frame");
        source
            .read_vec_at(offset, self.frame_len())
            .map_err(|err| FseqError::from_source(err, "frame data"))
    }

    fn read_compressed<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        index: u32,
    ) -> Result<Vec<u8>, FseqError> {
        let block_idx = self
            .owning_block(index)
            .ok_or(FseqError::MissingFrameData { index })?;
        let local = index - self.blocks[block_idx].start_frame;

        if let Some(data) = self.cache.lookup(block_idx) {
            return slice_frame(data, local, self.channels_per_frame, index);
        }

        let data = self.load_block(source, block_idx)?;
        let data = self.cache.store(block_idx, data);
        slice_frame(data, local, self.channels_per_frame, index)
    }

    fn load_block<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        block_idx: usize,
    ) -> Result<Vec<u8>, FseqError> {
        let block = self.blocks[block_idx];
        if block.compressed_len as usize > self.max_block_size {
            return Err(FseqError::DecompressionFailed {
                block: block_idx,
                message: format!(
                    "compressed size {} exceeds limit of {} bytes",
                    block.compressed_len, self.max_block_size
                ),
            });
        }
        let compressed = source
            .read_vec_at(block.offset, block.compressed_len as usize)
            .map_err(|err| FseqError::from_source(err, "compressed block"))?;
        let data =
            codec::decompress_block(self.compression, block_idx, &compressed, self.max_block_size)?;

        if data.len() % self.frame_len() != 0 {
            return Err(FseqError::CorruptBlock {
                block: block_idx,
                decompressed_len: data.len(),
                channels_per_frame: self.channels_per_frame,
            });
        }
        Ok(data)
    }

    /// Block whose frame range `[start_frame, next start_frame)` holds `index`.
    pub(crate) fn owning_block(&self, index: u32) -> Option<usize> {
        if self.ascending {
            let after = self.blocks.partition_point(|b| b.start_frame <= index);
            return after.checked_sub(1);
        }
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.start_frame <= index)
            .max_by_key(|(_, b)| b.start_frame)
            .map(|(idx, _)| idx)
    }
}

fn slice_frame(
    data: &[u8],
    local: u32,
    channels_per_frame: u32,
    index: u32,
) -> Result<Vec<u8>, FseqError> {
    let len = channels_per_frame as usize;
    let start = (local as usize)
        .checked_mul(len)
        .ok_or(FseqError::MissingFrameData { index })?;
    let end = start
        .checked_add(len)
        .ok_or(FseqError::MissingFrameData { index })?;
    data.get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(FseqError::MissingFrameData { index })
}
