/// Validation errors for domain value objects and incoming requests
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),

    // BucketName validation errors
    EmptyBucketName,
    BucketNameInvalidCharacter(char),

    // Invocation payload errors
    MissingField(&'static str),
    MalformedPayload(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }

            // BucketName errors
            ValidationError::EmptyBucketName => write!(f, "Bucket name cannot be empty"),
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(f, "Invalid character in bucket name: {:?}", c)
            }

            // Payload errors
            ValidationError::MissingField(field) => {
                write!(f, "Missing required field '{}'", field)
            }
            ValidationError::MalformedPayload(message) => {
                write!(f, "Malformed invocation payload: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
