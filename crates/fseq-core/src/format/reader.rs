use std::ops::Range;

use crate::error::FseqError;

/// Little-endian cursor over a section of an FSEQ file.
///
/// `base` is the absolute file offset of `bytes[0]`, so positions and
/// truncation errors are always reported in file coordinates.
pub struct FseqReader<'a> {
    bytes: &'a [u8],
    base: u64,
    pos: usize,
    context: &'static str,
}

impl<'a> FseqReader<'a> {
    pub fn new(bytes: &'a [u8], base: u64, context: &'static str) -> Self {
        Self {
            bytes,
            base,
            pos: 0,
            context,
        }
    }

    /// Absolute file offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, FseqError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, FseqError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a packed 3-byte little-endian integer, zero-extended.
    pub fn read_u24_le(&mut self) -> Result<u32, FseqError> {
        let [b0, b1, b2] = self.read_array()?;
        Ok(u32::from(b0) | (u32::from(b1) << 8) | (u32::from(b2) << 16))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, FseqError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, FseqError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FseqError> {
        let slice = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], FseqError> {
        let range = self.span(len)?;
        self.pos = range.end;
        Ok(&self.bytes[range])
    }

    fn span(&self, len: usize) -> Result<Range<usize>, FseqError> {
        let truncated = || FseqError::TruncatedFile {
            context: self.context,
            offset: self.position(),
            needed: len,
        };
        let end = self.pos.checked_add(len).ok_or_else(truncated)?;
        if end > self.bytes.len() {
            return Err(truncated());
        }
        Ok(self.pos..end)
    }
}

#[cfg(test)]
mod tests {
    use super::FseqReader;
    use crate::error::FseqError;

    #[test]
    fn reads_little_endian_fields_in_sequence() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = FseqReader::new(&bytes, 100, "test");
        assert_eq!(reader.read_u16_le().unwrap(), 0x0201);
        assert_eq!(reader.read_u32_le().unwrap(), 0x0605_0403);
        assert_eq!(reader.position(), 106);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn u24_is_zero_extended_low_byte_first() {
        let bytes = [0x01, 0x00, 0x00, 0xff, 0xff, 0xff];
        let mut reader = FseqReader::new(&bytes, 0, "test");
        assert_eq!(reader.read_u24_le().unwrap(), 1);
        assert_eq!(reader.read_u24_le().unwrap(), 0x00ff_ffff);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_read_reports_absolute_offset() {
        let bytes = [0u8; 3];
        let mut reader = FseqReader::new(&bytes, 32, "block index");
        reader.read_u16_le().unwrap();
        let err = reader.read_u32_le().unwrap_err();
        assert!(matches!(
            err,
            FseqError::TruncatedFile {
                context: "block index",
                offset: 34,
                needed: 4
            }
        ));
    }

    #[test]
    fn failed_read_does_not_advance() {
        let bytes = [0u8; 2];
        let mut reader = FseqReader::new(&bytes, 0, "test");
        assert!(reader.read_slice(3).is_err());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_slice(2).unwrap(), &[0, 0]);
        assert!(reader.is_empty());
    }
}
