mod object_store;
mod scratch;

pub use object_store::{bytes_stream, collect_bytes, ByteStream, ObjectInfo, ObjectStore};
pub use scratch::{ScratchSpace, StagedArtifact};
