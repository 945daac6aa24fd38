use crate::domain::{
    errors::CopyError,
    value_objects::{BucketName, ObjectKey},
};

/// A validated aggregation request
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub bucket: BucketName,
    /// Raw key prefixes, processed in this order
    pub prefixes: Vec<String>,
    pub destination_key: ObjectKey,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    /// Combined text; identical to what was written at the destination key
    pub content: String,
    /// Number of listed objects that were opened and copied
    pub objects: usize,
    /// Objects whose body could only be read partially
    pub copy_failures: Vec<CopyError>,
}

impl AggregateOutput {
    pub fn is_complete(&self) -> bool {
        self.copy_failures.is_empty()
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Fetching,
    Copying,
    Staging,
    Uploading,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Listing => "listing objects",
            Stage::Fetching => "fetching an object",
            Stage::Copying => "copying an object body",
            Stage::Staging => "staging combined content",
            Stage::Uploading => "uploading combined content",
        };
        f.write_str(name)
    }
}
