use std::fmt;

/// Error type for snapshot encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The snapshot text is not a parseable scene.
    Malformed(String),
    /// The scene was written by a newer format.
    UnsupportedVersion { found: u32, supported: u32 },
    /// The scene parsed but violates a structural rule.
    InvalidScene(String),
    /// The scene could not be serialized.
    Serialize(String),
    /// A stored text transform could not be reversed.
    Transform {
        transform: &'static str,
        message: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Malformed(message) => write!(f, "malformed snapshot: {}", message),
            CodecError::UnsupportedVersion { found, supported } => write!(
                f,
                "unsupported scene version {} (supported up to {})",
                found, supported
            ),
            CodecError::InvalidScene(message) => write!(f, "invalid scene: {}", message),
            CodecError::Serialize(message) => write!(f, "snapshot serialize error: {}", message),
            CodecError::Transform { transform, message } => {
                write!(f, "{} decode error: {}", transform, message)
            }
        }
    }
}

impl std::error::Error for CodecError {}
