use std::ops::Range;

pub const MAGIC: &[u8; 4] = b"PSEQ";

pub const MAGIC_RANGE: Range<usize> = 0..4;
pub const CHANNEL_DATA_OFFSET_RANGE: Range<usize> = 4..6;
pub const MINOR_VERSION_OFFSET: usize = 6;
pub const MAJOR_VERSION_OFFSET: usize = 7;

pub const HEADER_LEN_RANGE: Range<usize> = 8..10;
pub const CHANNELS_PER_FRAME_RANGE: Range<usize> = 10..14;
pub const FRAME_COUNT_RANGE: Range<usize> = 14..18;
pub const TIME_STEP_OFFSET: usize = 18;
pub const FLAGS_OFFSET: usize = 19;
pub const COMPRESSION_OFFSET: usize = 20;
pub const BLOCK_COUNT_OFFSET: usize = 21;
pub const SPARSE_COUNT_OFFSET: usize = 22;
pub const FLAGS2_OFFSET: usize = 23;
pub const IDENTIFIER_RANGE: Range<usize> = 24..32;

pub const PRIMARY_HEADER_SIZE: usize = 8;
pub const HEADER_SIZE: usize = 32;

pub const SUPPORTED_MAJOR_VERSION: u8 = 2;
pub const SUPPORTED_MINOR_VERSION: u8 = 0;

pub const BLOCK_DESCRIPTOR_SIZE: usize = 8;
pub const SPARSE_RANGE_SIZE: usize = 6;
pub const METADATA_RECORD_HEADER_SIZE: usize = 4;

pub const COMPRESSION_NONE: u8 = 0;
pub const COMPRESSION_ZSTD: u8 = 1;
pub const COMPRESSION_ZLIB: u8 = 2;

/// Size of the block index plus sparse table that follows the fixed header.
pub fn index_section_size(block_count: u8, sparse_count: u8) -> usize {
    block_count as usize * BLOCK_DESCRIPTOR_SIZE + sparse_count as usize * SPARSE_RANGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_header_fields_cover_32_bytes() {
        assert_eq!(IDENTIFIER_RANGE.end, HEADER_SIZE);
        assert_eq!(MAJOR_VERSION_OFFSET + 1, PRIMARY_HEADER_SIZE);
        assert_eq!(HEADER_LEN_RANGE.start, PRIMARY_HEADER_SIZE);
    }

    #[test]
    fn index_section_size_counts_blocks_and_ranges() {
        assert_eq!(index_section_size(0, 0), 0);
        assert_eq!(index_section_size(2, 1), 22);
        assert_eq!(index_section_size(255, 255), 255 * 14);
    }
}
