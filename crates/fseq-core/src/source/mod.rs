//! Random-access byte sources.
//!
//! Decoders never hold a shared file cursor: every read names its absolute
//! offset, so the same parsing routines serve files and in-memory buffers.
//! Any `Read + Seek` value is a [`ByteSource`].

mod error;

pub use error::SourceError;

use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// A seekable, readable byte source addressed by absolute offsets.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use fseq_core::ByteSource;
///
/// let mut source = Cursor::new(vec![1u8, 2, 3, 4]);
/// let mut buf = [0u8; 2];
/// source.read_exact_at(1, &mut buf)?;
/// assert_eq!(buf, [2, 3]);
/// # Ok::<(), fseq_core::SourceError>(())
/// ```
pub trait ByteSource {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns `SourceError::Truncated` when fewer than `buf.len()` bytes are
    /// available at `offset`.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), SourceError>;

    /// Read `len` bytes starting at `offset` into a new buffer.
    fn read_vec_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, SourceError> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + Seek + ?Sized> ByteSource for R {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), SourceError> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                SourceError::Truncated {
                    offset,
                    needed: buf.len(),
                }
            } else {
                SourceError::Io(err)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteSource, SourceError};
    use std::io::Cursor;

    #[test]
    fn reads_at_absolute_offsets_in_any_order() {
        let mut source = Cursor::new((0u8..16).collect::<Vec<_>>());
        assert_eq!(source.read_vec_at(10, 3).unwrap(), vec![10, 11, 12]);
        assert_eq!(source.read_vec_at(0, 2).unwrap(), vec![0, 1]);
    }

    #[test]
    fn short_read_is_truncated() {
        let mut source = Cursor::new(vec![0u8; 4]);
        let err = source.read_vec_at(2, 4).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Truncated {
                offset: 2,
                needed: 4
            }
        ));
    }

    #[test]
    fn empty_read_past_end_succeeds() {
        let mut source = Cursor::new(vec![0u8; 4]);
        assert!(source.read_vec_at(4, 0).unwrap().is_empty());
    }
}
