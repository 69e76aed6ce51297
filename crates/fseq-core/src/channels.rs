//! Mapping between a frame's logical byte offsets and absolute channels.
//!
//! With no sparse ranges declared the two are identical. Otherwise ranges are
//! walked in declared order, each contributing `channel_count` consecutive
//! logical offsets that map onto `start_channel..start_channel + count`.
//! Whether compressed blocks also use the sparse layout is assumed, not
//! confirmed by sample files.

use crate::format::SparseRange;

/// Absolute channel carried at logical offset `offset` of a frame.
///
/// # Examples
/// ```
/// use fseq_core::{SparseRange, channels::logical_to_absolute};
///
/// let ranges = [
///     SparseRange { start_channel: 100, channel_count: 3 },
///     SparseRange { start_channel: 10, channel_count: 2 },
/// ];
/// assert_eq!(logical_to_absolute(&ranges, 2), Some(102));
/// assert_eq!(logical_to_absolute(&ranges, 3), Some(10));
/// assert_eq!(logical_to_absolute(&ranges, 5), None);
/// assert_eq!(logical_to_absolute(&[], 7), Some(7));
/// ```
pub fn logical_to_absolute(ranges: &[SparseRange], offset: u32) -> Option<u32> {
    if ranges.is_empty() {
        return Some(offset);
    }
    let mut remaining = offset;
    for range in ranges {
        if remaining < range.channel_count {
            return range.start_channel.checked_add(remaining);
        }
        remaining -= range.channel_count;
    }
    None
}

/// Logical offset of absolute `channel`, using the first range containing it.
pub fn absolute_to_logical(ranges: &[SparseRange], channel: u32) -> Option<u32> {
    if ranges.is_empty() {
        return Some(channel);
    }
    let mut base = 0u64;
    for range in ranges {
        let start = u64::from(range.start_channel);
        let channel = u64::from(channel);
        if channel >= start && channel < range.end_channel() {
            return u32::try_from(base + (channel - start)).ok();
        }
        base += u64::from(range.channel_count);
    }
    None
}

/// Number of logical channels the ranges describe, or `None` without ranges.
pub fn logical_channel_count(ranges: &[SparseRange]) -> Option<u64> {
    if ranges.is_empty() {
        return None;
    }
    Some(ranges.iter().map(|r| u64::from(r.channel_count)).sum())
}

/// Iterator over `(absolute_channel, value)` pairs of a frame payload.
pub struct ChannelValues<'a> {
    data: &'a [u8],
    ranges: &'a [SparseRange],
    pos: usize,
    range_idx: usize,
    in_range: u32,
}

impl<'a> ChannelValues<'a> {
    pub fn new(data: &'a [u8], ranges: &'a [SparseRange]) -> Self {
        Self {
            data,
            ranges,
            pos: 0,
            range_idx: 0,
            in_range: 0,
        }
    }
}

impl Iterator for ChannelValues<'_> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let value = *self.data.get(self.pos)?;
        if self.ranges.is_empty() {
            let channel = u32::try_from(self.pos).ok()?;
            self.pos += 1;
            return Some((channel, value));
        }
        loop {
            let range = self.ranges.get(self.range_idx)?;
            if self.in_range < range.channel_count {
                let channel = range.start_channel.checked_add(self.in_range)?;
                self.in_range += 1;
                self.pos += 1;
                return Some((channel, value));
            }
            self.range_idx += 1;
            self.in_range = 0;
        }
    }
}
