use std::io::Read;

use tracing::trace;

use crate::error::FseqError;
use crate::format::CompressionType;

/// Decompress one block in full, refusing output larger than `max_size`.
pub(crate) fn decompress_block(
    compression: CompressionType,
    block: usize,
    compressed: &[u8],
    max_size: usize,
) -> Result<Vec<u8>, FseqError> {
    match compression {
        CompressionType::Zstd => decompress_zstd(block, compressed, max_size),
        other => Err(FseqError::UnsupportedCompression { compression: other }),
    }
}

fn decompress_zstd(block: usize, compressed: &[u8], max_size: usize) -> Result<Vec<u8>, FseqError> {
    let failed = |message: String| FseqError::DecompressionFailed { block, message };

    let decoder = zstd::stream::read::Decoder::with_buffer(compressed)
        .map_err(|e| failed(format!("zstd: {e}")))?;
    let mut output = Vec::new();
    decoder
        .take(max_size as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| failed(format!("zstd: {e}")))?;
    if output.len() > max_size {
        return Err(failed(format!(
            "decompressed size exceeds limit of {max_size} bytes"
        )));
    }

    trace!(
        block,
        compressed = compressed.len(),
        decompressed = output.len(),
        "decompressed block"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::decompress_block;
    use crate::error::FseqError;
    use crate::format::CompressionType;

    #[test]
    fn zstd_block_decompresses() {
        let raw: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let compressed = zstd::encode_all(&raw[..], 3).unwrap();
        let out = decompress_block(CompressionType::Zstd, 0, &compressed, 1 << 20).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn garbage_is_decompression_failure() {
        let err = decompress_block(CompressionType::Zstd, 4, b"not zstd at all", 1 << 20)
            .unwrap_err();
        assert!(matches!(err, FseqError::DecompressionFailed { block: 4, .. }));
    }

    #[test]
    fn oversized_output_is_rejected() {
        let raw = vec![0u8; 1024];
        let compressed = zstd::encode_all(&raw[..], 3).unwrap();
        let err = decompress_block(CompressionType::Zstd, 1, &compressed, 512).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn zlib_and_unknown_are_unsupported() {
        for compression in [CompressionType::Zlib, CompressionType::Unknown(7)] {
            let err = decompress_block(compression, 0, &[], 16).unwrap_err();
            assert!(matches!(err, FseqError::UnsupportedCompression { .. }));
        }
    }
}
