use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("no words in the text were found in the word table")]
    NoKnownWords,

    #[error("vector with id {0} already exists")]
    DuplicateId(String),

    #[error("k must be a positive integer")]
    InvalidK,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("cannot compute similarity with a zero vector")]
    ZeroVector,

    #[error("vector contains a NaN or infinite component")]
    NonFiniteVector,

    #[error("index key {0:#x} is already in use")]
    DuplicateKey(u64),

    #[error("unknown search algorithm '{0}' (expected 'exact' or 'approximate')")]
    UnknownAlgorithm(String),

    #[error("word table line {line}: {message}")]
    WordTable { line: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Flat classification of [`VectorStoreError`], stable across transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    NoKnownWords,
    DuplicateId,
    InvalidK,
    DimensionMismatch,
    ZeroVector,
    NonFiniteVector,
    DuplicateKey,
    UnknownAlgorithm,
    WordTable,
    SerializationFailure,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::NoKnownWords => "no_known_words",
            Self::DuplicateId => "duplicate_id",
            Self::InvalidK => "invalid_k",
            Self::DimensionMismatch => "dimension_mismatch",
            Self::ZeroVector => "zero_vector",
            Self::NonFiniteVector => "non_finite_vector",
            Self::DuplicateKey => "duplicate_key",
            Self::UnknownAlgorithm => "unknown_algorithm",
            Self::WordTable => "word_table",
            Self::SerializationFailure => "serialization_failure",
        }
    }

    /// True when the failure was caused by the caller's input rather than by
    /// storage or configuration.
    pub const fn is_client_error(self) -> bool {
        !matches!(
            self,
            Self::DuplicateKey | Self::WordTable | Self::SerializationFailure
        )
    }
}

impl VectorStoreError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::NoKnownWords => ErrorKind::NoKnownWords,
            Self::DuplicateId(_) => ErrorKind::DuplicateId,
            Self::InvalidK => ErrorKind::InvalidK,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::ZeroVector => ErrorKind::ZeroVector,
            Self::NonFiniteVector => ErrorKind::NonFiniteVector,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::UnknownAlgorithm(_) => ErrorKind::UnknownAlgorithm,
            Self::WordTable { .. } => ErrorKind::WordTable,
            Self::IoError(_) | Self::SerializationError(_) => ErrorKind::SerializationFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_and_encoding_failures_share_a_kind() {
        let io = VectorStoreError::from(std::io::Error::other("disk gone"));
        let json = VectorStoreError::from(serde_json::from_str::<u32>("nope").unwrap_err());
        assert_eq!(io.kind(), ErrorKind::SerializationFailure);
        assert_eq!(json.kind(), ErrorKind::SerializationFailure);
        assert!(!io.kind().is_client_error());
    }

    #[test]
    fn key_collisions_are_not_client_errors() {
        let err = VectorStoreError::DuplicateKey(0xff);
        assert_eq!(err.to_string(), "index key 0xff is already in use");
        assert_eq!(err.kind().code(), "duplicate_key");
        assert!(!err.kind().is_client_error());
        assert!(VectorStoreError::NonFiniteVector.kind().is_client_error());
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(
            VectorStoreError::DuplicateId("a".into()).kind().code(),
            "duplicate_id"
        );
        assert_eq!(
            VectorStoreError::DimensionMismatch {
                expected: 4,
                actual: 8
            }
            .to_string(),
            "Invalid vector dimension: expected 4, got 8"
        );
    }
}
