use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::reader::FseqReader;
use crate::error::FseqError;

/// On-disk block descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlockDescriptor {
    pub start_frame: u32,
    pub compressed_len: u32,
}

/// A non-empty block with its absolute file offset resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub start_frame: u32,
    pub offset: u64,
    pub compressed_len: u32,
}

impl BlockDescriptor {
    pub fn end_offset(&self) -> u64 {
        self.offset + u64::from(self.compressed_len)
    }
}

pub fn read_raw_descriptor(reader: &mut FseqReader<'_>) -> Result<RawBlockDescriptor, FseqError> {
    Ok(RawBlockDescriptor {
        start_frame: reader.read_u32_le()?,
        compressed_len: reader.read_u32_le()?,
    })
}

/// Read `count` descriptors and lay the non-empty ones out contiguously from
/// `channel_data_offset`.
///
/// Zero-length descriptors are placeholders: they are dropped and do not
/// advance the running offset.
pub fn parse_block_index(
    reader: &mut FseqReader<'_>,
    count: u8,
    channel_data_offset: u16,
) -> Result<Vec<BlockDescriptor>, FseqError> {
    let mut blocks = Vec::with_capacity(count as usize);
    let mut offset = u64::from(channel_data_offset);
    let mut placeholders = 0usize;

    for _ in 0..count {
        let raw = read_raw_descriptor(reader)?;
        if raw.compressed_len == 0 {
            placeholders += 1;
            continue;
        }
        blocks.push(BlockDescriptor {
            start_frame: raw.start_frame,
            offset,
            compressed_len: raw.compressed_len,
        });
        offset += u64::from(raw.compressed_len);
    }

    if !is_ascending(&blocks) {
        warn!("block start frames are not ascending; frame lookup falls back to a linear scan");
    }
    debug!(
        resolved = blocks.len(),
        placeholders,
        data_end = offset,
        "decoded block index"
    );
    Ok(blocks)
}

pub fn is_ascending(blocks: &[BlockDescriptor]) -> bool {
    blocks
        .windows(2)
        .all(|pair| pair[0].start_frame <= pair[1].start_frame)
}
