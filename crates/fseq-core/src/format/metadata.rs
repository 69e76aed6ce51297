use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::layout;
use super::reader::FseqReader;
use crate::error::FseqError;

pub const TAG_MEDIA_FILE: [u8; 2] = *b"mf";
pub const TAG_SEQUENCE_PRODUCER: [u8; 2] = *b"sp";

/// One tagged variable-header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub tag: [u8; 2],
    pub value: Vec<u8>,
}

impl MetadataEntry {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Value as text, with the NUL terminator writers append removed.
    pub fn value_str(&self) -> String {
        let raw = String::from_utf8_lossy(&self.value);
        raw.trim_end_matches('\0').to_string()
    }
}

/// Variable metadata in file order. Duplicate tags are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataEntry> {
        self.entries.iter()
    }

    /// First entry carrying `tag`.
    pub fn get(&self, tag: &[u8; 2]) -> Option<&MetadataEntry> {
        self.entries.iter().find(|entry| &entry.tag == tag)
    }

    pub fn get_all<'a>(&'a self, tag: &'a [u8; 2]) -> impl Iterator<Item = &'a MetadataEntry> {
        self.entries.iter().filter(move |entry| &entry.tag == tag)
    }

    pub fn media_file(&self) -> Option<String> {
        self.get(&TAG_MEDIA_FILE).map(MetadataEntry::value_str)
    }

    pub fn sequence_producer(&self) -> Option<String> {
        self.get(&TAG_SEQUENCE_PRODUCER).map(MetadataEntry::value_str)
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a MetadataEntry;
    type IntoIter = std::slice::Iter<'a, MetadataEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Human-readable name for the tags xLights and FPP write.
pub fn known_tag_description(tag: &[u8; 2]) -> Option<&'static str> {
    match tag {
        b"mf" => Some("media file"),
        b"sp" => Some("sequence producer"),
        _ => None,
    }
}

/// Decode every record in the metadata region.
///
/// The reader must cover exactly the region, starting at the declared header
/// length. A zero length marks a 4-byte padding slot. Records must tile the
/// region; only an all-zero tail shorter than a record header is tolerated.
pub fn parse_metadata(reader: &mut FseqReader<'_>) -> Result<Metadata, FseqError> {
    let region_end = reader.position() + reader.remaining() as u64;
    let mut entries = Vec::new();

    while reader.remaining() >= layout::METADATA_RECORD_HEADER_SIZE {
        let record_start = reader.position();
        let length = reader.read_u16_le()? as usize;
        let tag = reader.read_array::<2>()?;

        if length == 0 {
            trace!(offset = record_start, "skipping metadata padding");
            continue;
        }
        if length < layout::METADATA_RECORD_HEADER_SIZE {
            return Err(FseqError::HeaderLengthMismatch {
                expected: region_end,
                actual: record_start + length as u64,
            });
        }
        let value_len = length - layout::METADATA_RECORD_HEADER_SIZE;
        if value_len > reader.remaining() {
            return Err(FseqError::HeaderLengthMismatch {
                expected: region_end,
                actual: record_start + length as u64,
            });
        }
        let value = reader.read_slice(value_len)?.to_vec();
        trace!(
            tag = %String::from_utf8_lossy(&tag),
            len = value_len,
            "decoded metadata entry"
        );
        entries.push(MetadataEntry { tag, value });
    }

    let tail_start = reader.position();
    let tail_len = reader.remaining();
    let tail = reader.read_slice(tail_len)?;
    if tail.iter().any(|&b| b != 0) {
        return Err(FseqError::HeaderLengthMismatch {
            expected: region_end,
            actual: tail_start,
        });
    }

    debug!(entries = entries.len(), "decoded variable metadata");
    Ok(Metadata { entries })
}

#[cfg(test)]
mod tests {
    use super::{Metadata, known_tag_description, parse_metadata};
    use crate::error::FseqError;
    use crate::format::reader::FseqReader;

    fn record(tag: &[u8; 2], value: &[u8]) -> Vec<u8> {
        let mut bytes = ((value.len() + 4) as u16).to_le_bytes().to_vec();
        bytes.extend_from_slice(tag);
        bytes.extend_from_slice(value);
        bytes
    }

    fn parse(bytes: &[u8]) -> Result<Metadata, FseqError> {
        let mut reader = FseqReader::new(bytes, 40, "metadata");
        parse_metadata(&mut reader)
    }

    #[test]
    fn empty_region_is_empty_metadata() {
        let metadata = parse(&[]).unwrap();
        assert!(metadata.is_empty());
    }

    #[test]
    fn keeps_order_and_duplicate_tags() {
        let mut bytes = record(b"mf", b"song.mp3\0");
        bytes.extend(record(b"sp", b"xLights\0"));
        bytes.extend(record(b"mf", b"alt.mp3\0"));

        let metadata = parse(&bytes).unwrap();
        assert_eq!(metadata.len(), 3);
        let tags: Vec<_> = metadata.iter().map(|e| e.tag_str()).collect();
        assert_eq!(tags, vec!["mf", "sp", "mf"]);
        assert_eq!(metadata.media_file().as_deref(), Some("song.mp3"));
        assert_eq!(metadata.sequence_producer().as_deref(), Some("xLights"));
        assert_eq!(metadata.get_all(b"mf").count(), 2);
    }

    #[test]
    fn zero_length_slots_and_zero_tail_are_padding() {
        let mut bytes = record(b"sp", b"FPP");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0]);

        let metadata = parse(&bytes).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.entries()[0].value, b"FPP");
    }

    #[test]
    fn record_overrunning_region_is_length_mismatch() {
        let mut bytes = record(b"mf", b"song.mp3");
        bytes.truncate(bytes.len() - 2);
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            FseqError::HeaderLengthMismatch {
                expected: 50,
                actual: 52
            }
        ));
    }

    #[test]
    fn length_below_record_header_is_mismatch() {
        let bytes = [0x02, 0x00, b'x', b'y'];
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, FseqError::HeaderLengthMismatch { .. }));
    }

    #[test]
    fn non_zero_tail_is_mismatch() {
        let mut bytes = record(b"sp", b"x");
        bytes.extend_from_slice(&[0x07, 0x00]);
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            FseqError::HeaderLengthMismatch {
                expected: 47,
                actual: 45
            }
        ));
    }

    #[test]
    fn describes_known_tags_only() {
        assert_eq!(known_tag_description(b"mf"), Some("media file"));
        assert_eq!(known_tag_description(b"sp"), Some("sequence producer"));
        assert_eq!(known_tag_description(b"zz"), None);
    }
}
