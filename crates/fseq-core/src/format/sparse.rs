use serde::{Deserialize, Serialize};
use tracing::debug;

use super::reader::FseqReader;
use crate::error::FseqError;

/// A contiguous span of absolute channels carried in each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseRange {
    pub start_channel: u32,
    pub channel_count: u32,
}

impl SparseRange {
    /// One past the last absolute channel of the range.
    pub fn end_channel(&self) -> u64 {
        u64::from(self.start_channel) + u64::from(self.channel_count)
    }
}

/// Read `count` packed 24-bit (start, count) pairs in declaration order.
///
/// Ranges are neither sorted nor checked for overlap.
pub fn parse_sparse_ranges(
    reader: &mut FseqReader<'_>,
    count: u8,
) -> Result<Vec<SparseRange>, FseqError> {
    let ranges = (0..count)
        .map(|_| {
            Ok(SparseRange {
                start_channel: reader.read_u24_le()?,
                channel_count: reader.read_u24_le()?,
            })
        })
        .collect::<Result<Vec<_>, FseqError>>()?;
    debug!(count = ranges.len(), "decoded sparse ranges");
    Ok(ranges)
}
