use crate::domain::errors::ValidationError;

/// Name of the bucket a request reads from and writes to.
///
/// Naming rules differ between S3 regions, legacy buckets and compatible
/// stores, so only names no backend could address are rejected here; the
/// backend decides the rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyBucketName);
        }

        if let Some(c) = value.chars().find(|c| c.is_control() || *c == '/') {
            return Err(ValidationError::BucketNameInvalidCharacter(c));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
