use thiserror::Error;

/// Main error type for wire-level codec and filter operations
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Malformed length: {0}")]
    MalformedLength(String),

    #[error("Unsupported object type: identifier byte 0x{0:02X}")]
    UnsupportedObjectType(u8),

    #[error("Integer too large: {0} content octets (max 8)")]
    IntegerTooLarge(usize),

    #[error("Invalid object identifier: {0}")]
    InvalidOid(String),

    #[error("Invalid filter operator: {0:?}")]
    InvalidFilterOperator(String),

    #[error("Filter parse error at byte {position}: {message}")]
    FilterParse { position: usize, message: String },

    #[error("Unsupported BER filter tag: 0x{0:02X}")]
    UnsupportedBerFilterTag(u8),

    #[error("Invalid extensible match attribute: {0:?}")]
    InvalidExtensibleAttribute(String),

    #[error("Filter operator {0} is not supported by the evaluator")]
    UnsupportedMatchOperator(&'static str),
}

impl WireError {
    /// Build a filter parse error at the given byte position
    pub fn parse_at(position: usize, message: impl Into<String>) -> Self {
        WireError::FilterParse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for wire-level operations
pub type WireResult<T> = Result<T, WireError>;
