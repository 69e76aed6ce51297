//! FSEQ v2 section decoders.
//!
//! Each section follows the same layered structure:
//! - `layout`: byte offsets, sizes and constants (source of truth)
//! - `reader`: bounds-checked little-endian cursor with an explicit position
//! - `header`, `blocks`, `sparse`, `metadata`: section decoding
//!
//! Decoders are pure and contain no I/O; the session reads each section from
//! its byte source and hands the bytes over with their absolute offset.

pub mod blocks;
pub mod header;
pub mod layout;
pub mod metadata;
pub mod reader;
pub mod sparse;

pub use blocks::BlockDescriptor;
pub use header::{CompressionType, FileHeader, SequenceHeader};
pub use metadata::{Metadata, MetadataEntry};
pub use sparse::SparseRange;
