#![allow(dead_code)]

/// Builds FSEQ v2 images in memory for tests.
pub struct FseqBuilder {
    channels: u32,
    frames: Vec<Vec<u8>>,
    frame_count: Option<u32>,
    compression: u8,
    time_step_ms: u8,
    flags: u8,
    identifier: u64,
    blocks: Vec<(u32, Vec<u8>)>,
    sparse: Vec<(u32, u32)>,
    metadata: Vec<([u8; 2], Vec<u8>)>,
}

impl FseqBuilder {
    pub fn new(channels: u32) -> Self {
        Self {
            channels,
            frames: Vec::new(),
            frame_count: None,
            compression: 0,
            time_step_ms: 25,
            flags: 0,
            identifier: 0,
            blocks: Vec::new(),
            sparse: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// `count` frames where channel `c` of frame `f` holds `(f * 7 + c) as u8`.
    pub fn patterned_frames(mut self, count: u32) -> Self {
        self.frames = (0..count).map(|f| pattern_frame(f, self.channels)).collect();
        self
    }

    pub fn frame_count(mut self, count: u32) -> Self {
        self.frame_count = Some(count);
        self
    }

    pub fn compression(mut self, raw: u8) -> Self {
        self.compression = raw;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn identifier(mut self, identifier: u64) -> Self {
        self.identifier = identifier;
        self
    }

    /// Split the frames into zstd blocks starting at each of `starts`.
    pub fn zstd_blocks(mut self, starts: &[u32]) -> Self {
        for (i, &start) in starts.iter().enumerate() {
            let end = starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.frames.len() as u32);
            self = self.zstd_range(start, end);
        }
        self
    }

    /// One zstd block holding frames `start..end`.
    pub fn zstd_range(mut self, start: u32, end: u32) -> Self {
        self.compression = 1;
        let raw: Vec<u8> = self.frames[start as usize..end as usize].concat();
        let compressed = zstd::encode_all(&raw[..], 3).expect("zstd encode");
        self.blocks.push((start, compressed));
        self
    }

    /// A zstd block with arbitrary decompressed content.
    pub fn zstd_raw_block(mut self, start: u32, decompressed: &[u8]) -> Self {
        self.compression = 1;
        let compressed = zstd::encode_all(decompressed, 3).expect("zstd encode");
        self.blocks.push((start, compressed));
        self
    }

    /// A block stored verbatim, without compressing it.
    pub fn stored_block(mut self, start: u32, bytes: &[u8]) -> Self {
        self.blocks.push((start, bytes.to_vec()));
        self
    }

    /// A zero-length placeholder descriptor at the current position.
    pub fn placeholder(mut self) -> Self {
        self.blocks.push((0, Vec::new()));
        self
    }

    pub fn sparse(mut self, start: u32, count: u32) -> Self {
        self.sparse.push((start, count));
        self
    }

    pub fn metadata(mut self, tag: &[u8; 2], value: &[u8]) -> Self {
        self.metadata.push((*tag, value.to_vec()));
        self
    }

    pub fn header_len(&self) -> usize {
        32 + 8 * self.blocks.len() + 6 * self.sparse.len()
    }

    pub fn metadata_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (tag, value) in &self.metadata {
            out.extend_from_slice(&((value.len() + 4) as u16).to_le_bytes());
            out.extend_from_slice(tag);
            out.extend_from_slice(value);
        }
        out
    }

    pub fn channel_data_offset(&self) -> usize {
        self.header_len() + self.metadata_bytes().len()
    }

    pub fn payload(&self) -> Vec<u8> {
        if self.compression == 0 {
            self.frames.concat()
        } else {
            self.blocks
                .iter()
                .flat_map(|(_, bytes)| bytes.iter().copied())
                .collect()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let header_len = self.header_len();
        let data_offset = self.channel_data_offset();
        let frame_count = self.frame_count.unwrap_or(self.frames.len() as u32);

        let mut out = Vec::new();
        out.extend_from_slice(b"PSEQ");
        out.extend_from_slice(&(data_offset as u16).to_le_bytes());
        out.push(0);
        out.push(2);
        out.extend_from_slice(&(header_len as u16).to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&frame_count.to_le_bytes());
        out.push(self.time_step_ms);
        out.push(self.flags);
        out.push(self.compression);
        out.push(self.blocks.len() as u8);
        out.push(self.sparse.len() as u8);
        out.push(0);
        out.extend_from_slice(&self.identifier.to_le_bytes());

        for (start, bytes) in &self.blocks {
            out.extend_from_slice(&start.to_le_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        }
        for (start, count) in &self.sparse {
            out.extend_from_slice(&start.to_le_bytes()[..3]);
            out.extend_from_slice(&count.to_le_bytes()[..3]);
        }
        out.extend(self.metadata_bytes());
        assert_eq!(out.len(), data_offset);
        out.extend(self.payload());
        out
    }
}

pub fn pattern_frame(frame: u32, channels: u32) -> Vec<u8> {
    (0..channels).map(|c| (frame * 7 + c) as u8).collect()
}
