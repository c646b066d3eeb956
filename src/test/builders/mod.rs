//! Byte-level builders for the binary formats this crate reads.

mod metadata;
mod pe;
mod sequencepoints;

pub use metadata::{compress_uint, module_metadata, MetadataBuilder};
pub use pe::{fat_body, tiny_body, PeBuilder};
pub use sequencepoints::SequencePointsBlob;
